//! Platform activity events read by dashboards and admin views.

use serde::{Deserialize, Serialize};

/// What happened.
///
/// Serialized with the same labels that are stored in the log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivityAction {
    #[serde(rename = "Appointment Created")]
    AppointmentCreated,
    #[serde(rename = "Appointment Cancelled")]
    AppointmentCancelled,
    #[serde(rename = "Appointment Status Updated")]
    AppointmentStatusUpdated,
    #[serde(rename = "Availability Updated")]
    AvailabilityUpdated,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::AppointmentCreated => "Appointment Created",
            ActivityAction::AppointmentCancelled => "Appointment Cancelled",
            ActivityAction::AppointmentStatusUpdated => "Appointment Status Updated",
            ActivityAction::AvailabilityUpdated => "Availability Updated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Appointment Created" => Some(ActivityAction::AppointmentCreated),
            "Appointment Cancelled" => Some(ActivityAction::AppointmentCancelled),
            "Appointment Status Updated" => Some(ActivityAction::AppointmentStatusUpdated),
            "Availability Updated" => Some(ActivityAction::AvailabilityUpdated),
            _ => None,
        }
    }
}

/// Kind of entity an event refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TargetType {
    User,
    Appointment,
    System,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::User => "User",
            TargetType::Appointment => "Appointment",
            TargetType::System => "System",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "User" => Some(TargetType::User),
            "Appointment" => Some(TargetType::Appointment),
            "System" => Some(TargetType::System),
            _ => None,
        }
    }
}

/// One entry of the activity log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    /// Row ID, `None` until persisted
    pub id: Option<i64>,
    pub action: ActivityAction,
    /// Acting user, if known
    pub user_id: Option<String>,
    pub target_id: Option<String>,
    pub target_type: TargetType,
    pub description: String,
    /// Free-form JSON details
    pub metadata: serde_json::Value,
    pub created_at: String,
}

impl ActivityEvent {
    pub fn new(action: ActivityAction, description: impl Into<String>) -> Self {
        Self {
            id: None,
            action,
            user_id: None,
            target_id: None,
            target_type: TargetType::System,
            description: description.into(),
            metadata: serde_json::Value::Object(Default::default()),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn by(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_string);
        self
    }

    pub fn target(mut self, target_type: TargetType, target_id: &str) -> Self {
        self.target_type = target_type;
        self.target_id = Some(target_id.to_string());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

//! Doctor models.

use serde::{Deserialize, Serialize};

/// A doctor who owns an availability calendar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub doctor_id: String,
    pub name: String,
    /// e.g. "cardiology"
    pub specialization: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Doctor {
    pub fn new(name: String, specialization: Option<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            doctor_id: uuid::Uuid::new_v4().to_string(),
            name,
            specialization,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

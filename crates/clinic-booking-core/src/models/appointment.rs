//! Appointment models and the status state machine.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::calendar::{normalize_date, parse_time, TimeRange, ValidationError};

/// Status value outside the four legal ones.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid appointment status: {0:?}")]
pub struct InvalidStatus(pub String);

/// Appointment status.
///
/// ```text
///  pending   -> confirmed
///  pending   -> cancelled
///  confirmed -> completed   (terminal)
///  confirmed -> cancelled   (terminal)
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    /// Created through an administrative path, awaiting confirmation
    Pending,
    /// Booked by a patient or confirmed by staff
    Confirmed,
    /// Visit took place
    Completed,
    /// Cancelled; the slot has been released
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (*self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

/// An appointment record tied to one slot of a doctor's calendar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    /// Identifier of the slot this appointment holds while active
    pub slot_id: String,
    /// UTC calendar date
    pub appointment_date: NaiveDate,
    /// "HH:MM - HH:MM", kept for clients that read the combined label
    pub time_slot: String,
    pub start_time: String,
    pub end_time: String,
    pub consultation_type: String,
    pub reason_for_visit: String,
    pub status: AppointmentStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Appointment {
    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// A validated booking request.
///
/// The slot is located by `(doctor_id, appointment_date, start_time)`; the end
/// boundary always comes from the slot that gets locked.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub consultation_type: String,
    pub reason_for_visit: String,
}

impl BookingRequest {
    /// Validate raw request fields.
    ///
    /// `time_slot` may be a full "HH:MM - HH:MM" label or just the "HH:MM" start.
    pub fn parse(
        patient_id: &str,
        doctor_id: &str,
        appointment_date: &str,
        time_slot: &str,
        consultation_type: &str,
        reason_for_visit: &str,
    ) -> Result<Self, ValidationError> {
        if patient_id.trim().is_empty() {
            return Err(ValidationError("patient id is required".into()));
        }
        if doctor_id.trim().is_empty() {
            return Err(ValidationError("doctorId is required".into()));
        }
        if time_slot.trim().is_empty() {
            return Err(ValidationError("timeSlot is required".into()));
        }

        let start_time = if time_slot.contains(|c: char| c == '-' || c == '–') {
            TimeRange::parse_slot(time_slot)?.start
        } else {
            parse_time(time_slot)?
        };

        Ok(Self {
            patient_id: patient_id.trim().to_string(),
            doctor_id: doctor_id.trim().to_string(),
            appointment_date: normalize_date(appointment_date)?,
            start_time,
            consultation_type: consultation_type.trim().to_string(),
            reason_for_visit: reason_for_visit.trim().to_string(),
        })
    }
}

//! Clinic Booking Core Library
//!
//! Appointment slot booking and cancellation for a multi-doctor clinic.
//!
//! # Architecture
//!
//! ```text
//!   Patient booking request            Cancel / status update
//!              │                                │
//!              ▼                                ▼
//!   ┌───────────────────────────────────────────────────────────┐
//!   │              BookingCoordinator (one IMMEDIATE txn)        │
//!   │                                                            │
//!   │   SlotLockEngine ───────► slots.is_booked  0 ⇄ 1           │
//!   │          │                                                 │
//!   │          ▼                                                 │
//!   │   AppointmentLedger ────► appointments (status machine)    │
//!   │          │                                                 │
//!   │          ▼                                                 │
//!   │   activity_log (append-only)                               │
//!   └───────────────────────────────────────────────────────────┘
//!              ▲
//!              │ free slots
//!   AvailabilityManager (doctor calendars)
//! ```
//!
//! # Core Principle
//!
//! **A slot is booked if and only if exactly one active appointment holds it.**
//! Every operation that touches both sides commits both or neither.
//!
//! # Modules
//!
//! - [`db`]: SQLite storage with conditional slot updates
//! - [`models`]: Domain types (Slot, Appointment, Doctor, ActivityEvent, etc.)
//! - [`booking`]: Slot lock engine, appointment ledger and coordinator

pub mod booking;
pub mod db;
pub mod models;

// Re-export commonly used types
pub use booking::{
    AppointmentLedger, AvailabilityManager, BookingCoordinator, BookingError, BookingResult,
    SlotLockEngine,
};
pub use db::{Database, DbError};
pub use models::{
    ActivityAction, ActivityEvent, Appointment, AppointmentStatus, BookingRequest, DayAvailability,
    Doctor, DoctorCalendar, Slot, TimeRange,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicBookingError {
    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    #[error("Slot release failed: {0}")]
    SlotReleaseFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<BookingError> for ClinicBookingError {
    fn from(e: BookingError) -> Self {
        let message = e.to_string();
        match e {
            BookingError::SlotUnavailable { .. } => ClinicBookingError::SlotUnavailable(message),
            BookingError::SlotReleaseFailed { .. } => ClinicBookingError::SlotReleaseFailed(message),
            BookingError::NotFound(_) => ClinicBookingError::NotFound(message),
            BookingError::InvalidStatus(_) => ClinicBookingError::InvalidStatus(message),
            BookingError::InvalidTransition { .. } => ClinicBookingError::InvalidTransition(message),
            BookingError::SlotOverlap { .. } | BookingError::SlotInUse(_) => {
                ClinicBookingError::Conflict(message)
            }
            BookingError::Validation(_) => ClinicBookingError::InvalidInput(message),
            BookingError::Database(_) => ClinicBookingError::DatabaseError(message),
        }
    }
}

impl From<db::DbError> for ClinicBookingError {
    fn from(e: db::DbError) -> Self {
        ClinicBookingError::DatabaseError(e.to_string())
    }
}

impl From<models::ValidationError> for ClinicBookingError {
    fn from(e: models::ValidationError) -> Self {
        ClinicBookingError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicBookingError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicBookingError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<ClinicCore>, ClinicBookingError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(ClinicCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<ClinicCore>, ClinicBookingError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(ClinicCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl ClinicCore {
    // =========================================================================
    // Doctor Operations
    // =========================================================================

    /// Register a doctor with an empty calendar.
    pub fn register_doctor(
        &self,
        name: String,
        specialization: Option<String>,
    ) -> Result<FfiDoctor, ClinicBookingError> {
        let db = self.db.lock()?;
        let doctor = AvailabilityManager::new(&db).register_doctor(&name, specialization.as_deref())?;
        Ok(doctor.into())
    }

    pub fn list_doctors(&self) -> Result<Vec<FfiDoctor>, ClinicBookingError> {
        let db = self.db.lock()?;
        let doctors = AvailabilityManager::new(&db).list_doctors()?;
        Ok(doctors.into_iter().map(|d| d.into()).collect())
    }

    // =========================================================================
    // Availability Operations
    // =========================================================================

    /// Add a free slot. `date` may be a plain date or a timestamp.
    pub fn add_availability_slot(
        &self,
        doctor_id: String,
        date: String,
        start_time: String,
        end_time: String,
    ) -> Result<FfiSlot, ClinicBookingError> {
        let date = models::normalize_date(&date)?;
        let range = TimeRange::parse(&start_time, &end_time)?;

        let db = self.db.lock()?;
        let slot = AvailabilityManager::new(&db).add_slot(&doctor_id, date, range, Some(doctor_id.as_str()))?;
        Ok(slot.into())
    }

    /// Remove a free slot.
    pub fn remove_availability_slot(
        &self,
        doctor_id: String,
        slot_id: String,
    ) -> Result<(), ClinicBookingError> {
        let db = self.db.lock()?;
        AvailabilityManager::new(&db).remove_slot(&doctor_id, &slot_id, Some(doctor_id.as_str()))?;
        Ok(())
    }

    /// Get a doctor's calendar, grouped by day.
    pub fn get_calendar(&self, doctor_id: String) -> Result<Vec<FfiDayAvailability>, ClinicBookingError> {
        let db = self.db.lock()?;
        let calendar = AvailabilityManager::new(&db).calendar(&doctor_id)?;
        Ok(calendar.days.into_iter().map(|d| d.into()).collect())
    }

    // =========================================================================
    // Booking Operations
    // =========================================================================

    /// Book a slot. Fails with `SlotUnavailable` if someone else holds it.
    pub fn book_appointment(
        &self,
        request: FfiBookingRequest,
    ) -> Result<FfiAppointment, ClinicBookingError> {
        let request = BookingRequest::parse(
            &request.patient_id,
            &request.doctor_id,
            &request.appointment_date,
            &request.time_slot,
            &request.consultation_type,
            &request.reason_for_visit,
        )?;

        let db = self.db.lock()?;
        let appointment = BookingCoordinator::new(&db).book(&request)?;
        Ok(appointment.into())
    }

    /// Cancel an appointment and release its slot.
    pub fn cancel_appointment(
        &self,
        appointment_id: String,
        cancelled_by: Option<String>,
    ) -> Result<FfiAppointment, ClinicBookingError> {
        let db = self.db.lock()?;
        let appointment =
            BookingCoordinator::new(&db).cancel(&appointment_id, cancelled_by.as_deref())?;
        Ok(appointment.into())
    }

    /// Move an appointment to `status`.
    pub fn update_appointment_status(
        &self,
        appointment_id: String,
        status: String,
        updated_by: Option<String>,
    ) -> Result<FfiAppointment, ClinicBookingError> {
        let db = self.db.lock()?;
        let appointment = BookingCoordinator::new(&db).update_status(
            &appointment_id,
            &status,
            updated_by.as_deref(),
        )?;
        Ok(appointment.into())
    }

    pub fn list_patient_appointments(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiAppointment>, ClinicBookingError> {
        let db = self.db.lock()?;
        let appointments = db.list_appointments_for_patient(&patient_id)?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    pub fn list_doctor_appointments(
        &self,
        doctor_id: String,
    ) -> Result<Vec<FfiAppointment>, ClinicBookingError> {
        let db = self.db.lock()?;
        let appointments = db.list_appointments_for_doctor(&doctor_id)?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    /// Every appointment, optionally filtered by status.
    pub fn list_all_appointments(
        &self,
        status: Option<String>,
    ) -> Result<Vec<FfiAppointment>, ClinicBookingError> {
        let status = status
            .map(|s| s.parse::<AppointmentStatus>())
            .transpose()
            .map_err(|e| ClinicBookingError::InvalidStatus(e.to_string()))?;

        let db = self.db.lock()?;
        let appointments = db.list_appointments(status)?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    // =========================================================================
    // Activity Log
    // =========================================================================

    /// Most recent platform activity first.
    pub fn recent_activity(&self, limit: u32) -> Result<Vec<FfiActivityEvent>, ClinicBookingError> {
        let db = self.db.lock()?;
        let events = db.list_recent_activity(limit as usize)?;
        Ok(events.into_iter().map(|e| e.into()).collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe doctor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub doctor_id: String,
    pub name: String,
    pub specialization: Option<String>,
}

impl From<Doctor> for FfiDoctor {
    fn from(doctor: Doctor) -> Self {
        Self {
            doctor_id: doctor.doctor_id,
            name: doctor.name,
            specialization: doctor.specialization,
        }
    }
}

/// FFI-safe slot.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSlot {
    pub slot_id: String,
    pub start_time: String,
    pub end_time: String,
    pub is_booked: bool,
}

impl From<Slot> for FfiSlot {
    fn from(slot: Slot) -> Self {
        Self {
            slot_id: slot.slot_id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            is_booked: slot.is_booked,
        }
    }
}

/// FFI-safe day of availability.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDayAvailability {
    /// YYYY-MM-DD
    pub date: String,
    pub slots: Vec<FfiSlot>,
}

impl From<DayAvailability> for FfiDayAvailability {
    fn from(day: DayAvailability) -> Self {
        Self {
            date: models::date_key(day.date),
            slots: day.slots.into_iter().map(|s| s.into()).collect(),
        }
    }
}

/// FFI-safe booking request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBookingRequest {
    pub patient_id: String,
    pub doctor_id: String,
    /// Date or timestamp; normalized to a UTC calendar date
    pub appointment_date: String,
    /// "HH:MM - HH:MM" or "HH:MM"
    pub time_slot: String,
    pub consultation_type: String,
    pub reason_for_visit: String,
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub appointment_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub slot_id: String,
    pub appointment_date: String,
    pub time_slot: String,
    pub consultation_type: String,
    pub reason_for_visit: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            appointment_id: appointment.id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            slot_id: appointment.slot_id,
            appointment_date: models::date_key(appointment.appointment_date),
            time_slot: appointment.time_slot,
            consultation_type: appointment.consultation_type,
            reason_for_visit: appointment.reason_for_visit,
            status: appointment.status.as_str().to_string(),
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

/// FFI-safe activity event.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiActivityEvent {
    pub action: String,
    pub user_id: Option<String>,
    pub target_id: Option<String>,
    pub target_type: String,
    pub description: String,
    /// JSON object
    pub metadata_json: String,
    pub created_at: String,
}

impl From<ActivityEvent> for FfiActivityEvent {
    fn from(event: ActivityEvent) -> Self {
        Self {
            action: event.action.as_str().to_string(),
            user_id: event.user_id,
            target_id: event.target_id,
            target_type: event.target_type.as_str().to_string(),
            description: event.description,
            metadata_json: event.metadata.to_string(),
            created_at: event.created_at,
        }
    }
}

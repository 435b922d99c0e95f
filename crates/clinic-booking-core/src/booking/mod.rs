//! Appointment slot booking and cancellation.
//!
//! - [`SlotLockEngine`]: atomic lock/release of a single calendar slot
//! - [`AppointmentLedger`]: appointment records tied to locked slots
//! - [`BookingCoordinator`]: runs lock + ledger writes as one transaction
//! - [`AvailabilityManager`]: produces the slots the engine locks

mod availability;
mod coordinator;
mod ledger;
mod slot_lock;

pub use availability::AvailabilityManager;
pub use coordinator::BookingCoordinator;
pub use ledger::AppointmentLedger;
pub use slot_lock::SlotLockEngine;

use chrono::NaiveDate;
use thiserror::Error;

use crate::db::DbError;
use crate::models::{AppointmentStatus, InvalidStatus, ValidationError};

/// Booking errors.
#[derive(Error, Debug)]
pub enum BookingError {
    /// Someone else booked the slot first, or it never existed. Not retryable.
    #[error("Time slot {start_time} on {date} is already booked or unavailable")]
    SlotUnavailable {
        doctor_id: String,
        date: NaiveDate,
        start_time: String,
    },

    /// The appointment's slot could not be freed; calendar and ledger disagree.
    #[error("Could not release slot {slot_id} held by appointment {appointment_id}")]
    SlotReleaseFailed {
        appointment_id: String,
        slot_id: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Slot {start_time} - {end_time} overlaps an existing slot on {date}")]
    SlotOverlap {
        date: NaiveDate,
        start_time: String,
        end_time: String,
    },

    /// Booked, or referenced by an appointment, so it cannot be removed.
    #[error("Slot {0} is in use")]
    SlotInUse(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl From<rusqlite::Error> for BookingError {
    fn from(e: rusqlite::Error) -> Self {
        BookingError::Database(DbError::Sqlite(e))
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

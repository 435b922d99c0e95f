//! Slot lock engine.

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, error};

use super::{BookingError, BookingResult};
use crate::db::{Database, LockedSlot};
use crate::models::{Appointment, TIME_FORMAT};

/// Atomic `isBooked` transitions on a single slot.
///
/// Both operations are one conditional statement against storage. They do
/// not open a transaction of their own; callers combining them with ledger
/// writes run them inside [`Database::immediate_transaction`].
pub struct SlotLockEngine<'a> {
    db: &'a Database,
}

impl<'a> SlotLockEngine<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Transition the free slot at `(doctor_id, date, start_time)` to booked.
    pub fn lock(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> BookingResult<LockedSlot> {
        let start = start_time.format(TIME_FORMAT).to_string();

        match self.db.try_lock_slot(doctor_id, date, &start)? {
            Some(locked) => {
                debug!(slot_id = %locked.slot_id, doctor_id, %date, start_time = %start, "slot locked");
                Ok(locked)
            }
            None => Err(BookingError::SlotUnavailable {
                doctor_id: doctor_id.to_string(),
                date,
                start_time: start,
            }),
        }
    }

    /// Free the slot held by `appointment`.
    ///
    /// Matches on the stored slot identifier, never on reconstructed date or
    /// time strings.
    pub fn release(&self, appointment: &Appointment) -> BookingResult<()> {
        if self
            .db
            .try_release_slot(&appointment.doctor_id, &appointment.slot_id)?
        {
            debug!(slot_id = %appointment.slot_id, appointment_id = %appointment.id, "slot released");
            return Ok(());
        }

        error!(
            slot_id = %appointment.slot_id,
            appointment_id = %appointment.id,
            doctor_id = %appointment.doctor_id,
            "booked slot not found for release"
        );
        Err(BookingError::SlotReleaseFailed {
            appointment_id: appointment.id.clone(),
            slot_id: appointment.slot_id.clone(),
        })
    }
}

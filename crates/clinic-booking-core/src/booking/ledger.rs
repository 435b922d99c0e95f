//! Appointment ledger.

use super::{BookingError, BookingResult, SlotLockEngine};
use crate::db::{Database, LockedSlot};
use crate::models::{Appointment, AppointmentStatus, BookingRequest};

/// Create, update and cancel appointment records.
///
/// Creation assumes the slot is already locked; cancellation releases it.
/// None of these open a transaction; see [`super::BookingCoordinator`].
pub struct AppointmentLedger<'a> {
    db: &'a Database,
}

impl<'a> AppointmentLedger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert the appointment that holds `slot`.
    pub fn create(
        &self,
        request: &BookingRequest,
        slot: &LockedSlot,
        status: AppointmentStatus,
    ) -> BookingResult<Appointment> {
        let now = chrono::Utc::now().to_rfc3339();
        let appointment = Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: request.patient_id.clone(),
            doctor_id: slot.doctor_id.clone(),
            slot_id: slot.slot_id.clone(),
            appointment_date: slot.date,
            time_slot: slot.time_slot(),
            start_time: slot.start_time.clone(),
            end_time: slot.end_time.clone(),
            consultation_type: request.consultation_type.clone(),
            reason_for_visit: request.reason_for_visit.clone(),
            status,
            created_at: now.clone(),
            updated_at: now,
        };

        self.db.insert_appointment(&appointment)?;
        Ok(appointment)
    }

    /// Load an appointment or fail with `NotFound`.
    pub fn get(&self, appointment_id: &str) -> BookingResult<Appointment> {
        self.db
            .get_appointment(appointment_id)?
            .ok_or_else(|| BookingError::NotFound(format!("appointment {}", appointment_id)))
    }

    /// Validate and apply a status change.
    ///
    /// The value is checked before anything is read or written. Moving to
    /// `cancelled` goes through [`Self::cancel`] so the slot is released.
    pub fn update_status(&self, appointment_id: &str, status: &str) -> BookingResult<Appointment> {
        let next: AppointmentStatus = status.parse()?;
        if next == AppointmentStatus::Cancelled {
            return self.cancel(appointment_id);
        }

        let mut appointment = self.get(appointment_id)?;
        self.transition(&mut appointment, next)?;
        Ok(appointment)
    }

    /// Release the appointment's slot and mark it cancelled.
    pub fn cancel(&self, appointment_id: &str) -> BookingResult<Appointment> {
        let mut appointment = self.get(appointment_id)?;
        ensure_transition(&appointment, AppointmentStatus::Cancelled)?;

        SlotLockEngine::new(self.db).release(&appointment)?;
        self.transition(&mut appointment, AppointmentStatus::Cancelled)?;
        Ok(appointment)
    }

    fn transition(&self, appointment: &mut Appointment, next: AppointmentStatus) -> BookingResult<()> {
        ensure_transition(appointment, next)?;

        let previous = appointment.status;
        appointment.touch();
        if !self.db.update_appointment_status(
            &appointment.id,
            previous,
            next,
            &appointment.updated_at,
        )? {
            // Changed underneath us
            return Err(BookingError::InvalidTransition {
                from: previous,
                to: next,
            });
        }

        appointment.status = next;
        Ok(())
    }
}

fn ensure_transition(appointment: &Appointment, next: AppointmentStatus) -> BookingResult<()> {
    if appointment.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(BookingError::InvalidTransition {
            from: appointment.status,
            to: next,
        })
    }
}

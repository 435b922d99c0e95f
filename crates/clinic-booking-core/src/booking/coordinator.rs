//! Transactional coordinator for booking and cancellation.

use serde_json::json;
use tracing::{info, warn};

use super::{AppointmentLedger, BookingError, BookingResult, SlotLockEngine};
use crate::db::Database;
use crate::models::{
    date_key, ActivityAction, ActivityEvent, Appointment, AppointmentStatus, BookingRequest,
    TargetType,
};

/// Runs slot locking and ledger writes as one atomic unit.
///
/// Every public operation opens an IMMEDIATE transaction, and any error
/// drops it uncommitted, so a slot is never booked without an active
/// appointment and an appointment is never cancelled while its slot stays
/// booked.
pub struct BookingCoordinator<'a> {
    db: &'a Database,
}

impl<'a> BookingCoordinator<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Patient-facing booking: lock the slot and record a confirmed appointment.
    pub fn book(&self, request: &BookingRequest) -> BookingResult<Appointment> {
        self.book_with_status(request, AppointmentStatus::Confirmed)
    }

    /// Administrative booking: the slot is held by a pending appointment.
    pub fn book_pending(&self, request: &BookingRequest) -> BookingResult<Appointment> {
        self.book_with_status(request, AppointmentStatus::Pending)
    }

    fn book_with_status(
        &self,
        request: &BookingRequest,
        status: AppointmentStatus,
    ) -> BookingResult<Appointment> {
        let tx = self.db.immediate_transaction()?;

        if !self.db.doctor_exists(&request.doctor_id)? {
            return Err(BookingError::NotFound(format!("doctor {}", request.doctor_id)));
        }

        let locked = SlotLockEngine::new(self.db)
            .lock(&request.doctor_id, request.appointment_date, request.start_time)
            .inspect_err(|e| {
                if let BookingError::SlotUnavailable { .. } = e {
                    warn!(
                        doctor_id = %request.doctor_id,
                        patient_id = %request.patient_id,
                        date = %request.appointment_date,
                        "booking rejected: {}", e
                    );
                }
            })?;

        let appointment = AppointmentLedger::new(self.db).create(request, &locked, status)?;

        self.db.insert_activity(
            &ActivityEvent::new(
                ActivityAction::AppointmentCreated,
                format!(
                    "Appointment booked for {} at {}",
                    date_key(appointment.appointment_date),
                    appointment.time_slot
                ),
            )
            .by(Some(appointment.patient_id.as_str()))
            .target(TargetType::Appointment, &appointment.id)
            .with_metadata(json!({
                "doctorId": appointment.doctor_id,
                "slotId": appointment.slot_id,
                "status": appointment.status,
            })),
        )?;

        tx.commit()?;

        info!(
            appointment_id = %appointment.id,
            doctor_id = %appointment.doctor_id,
            slot_id = %appointment.slot_id,
            status = %appointment.status,
            "appointment booked"
        );
        Ok(appointment)
    }

    /// Release the slot and mark the appointment cancelled, or change nothing.
    pub fn cancel(&self, appointment_id: &str, cancelled_by: Option<&str>) -> BookingResult<Appointment> {
        let tx = self.db.immediate_transaction()?;

        let appointment = AppointmentLedger::new(self.db).cancel(appointment_id)?;
        self.record_cancellation(&appointment, cancelled_by)?;

        tx.commit()?;

        info!(
            appointment_id = %appointment.id,
            slot_id = %appointment.slot_id,
            "appointment cancelled"
        );
        Ok(appointment)
    }

    /// Validate `status` and apply it. Cancellation releases the slot.
    pub fn update_status(
        &self,
        appointment_id: &str,
        status: &str,
        updated_by: Option<&str>,
    ) -> BookingResult<Appointment> {
        let next: AppointmentStatus = status.parse()?;

        let tx = self.db.immediate_transaction()?;

        let ledger = AppointmentLedger::new(self.db);
        let previous = ledger.get(appointment_id)?.status;
        let appointment = ledger.update_status(appointment_id, next.as_str())?;

        if next == AppointmentStatus::Cancelled {
            self.record_cancellation(&appointment, updated_by)?;
        } else {
            self.db.insert_activity(
                &ActivityEvent::new(
                    ActivityAction::AppointmentStatusUpdated,
                    format!("Appointment moved from {} to {}", previous, next),
                )
                .by(updated_by)
                .target(TargetType::Appointment, &appointment.id)
                .with_metadata(json!({ "from": previous, "to": next })),
            )?;
        }

        tx.commit()?;

        info!(appointment_id = %appointment.id, from = %previous, to = %next, "appointment status updated");
        Ok(appointment)
    }

    /// Load an appointment.
    pub fn get(&self, appointment_id: &str) -> BookingResult<Appointment> {
        AppointmentLedger::new(self.db).get(appointment_id)
    }

    fn record_cancellation(&self, appointment: &Appointment, cancelled_by: Option<&str>) -> BookingResult<()> {
        self.db.insert_activity(
            &ActivityEvent::new(
                ActivityAction::AppointmentCancelled,
                format!(
                    "Appointment for {} at {} cancelled and slot released",
                    date_key(appointment.appointment_date),
                    appointment.time_slot
                ),
            )
            .by(cancelled_by)
            .target(TargetType::Appointment, &appointment.id)
            .with_metadata(json!({
                "doctorId": appointment.doctor_id,
                "slotId": appointment.slot_id,
            })),
        )?;
        Ok(())
    }
}

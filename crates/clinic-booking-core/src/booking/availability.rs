//! Doctor registry and availability calendar management.

use chrono::NaiveDate;
use serde_json::json;
use tracing::{info, warn};

use super::{BookingError, BookingResult};
use crate::db::{Database, DbError};
use crate::models::{
    date_key, ActivityAction, ActivityEvent, Doctor, DoctorCalendar, Slot, TargetType, TimeRange,
    ValidationError,
};

/// Maintains the slots that [`super::SlotLockEngine`] locks and releases.
///
/// Slots within one day never overlap. Booked slots, and slots an
/// appointment ever referred to, are never removed.
pub struct AvailabilityManager<'a> {
    db: &'a Database,
}

impl<'a> AvailabilityManager<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn register_doctor(&self, name: &str, specialization: Option<&str>) -> BookingResult<Doctor> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BookingError::Validation(ValidationError(
                "doctor name must not be empty".into(),
            )));
        }

        let doctor = Doctor::new(name.to_string(), specialization.map(str::to_string));
        self.db.insert_doctor(&doctor)?;
        info!(doctor_id = %doctor.doctor_id, "doctor registered");
        Ok(doctor)
    }

    pub fn get_doctor(&self, doctor_id: &str) -> BookingResult<Doctor> {
        self.db
            .get_doctor(doctor_id)?
            .ok_or_else(|| BookingError::NotFound(format!("doctor {}", doctor_id)))
    }

    pub fn list_doctors(&self) -> BookingResult<Vec<Doctor>> {
        Ok(self.db.list_doctors()?)
    }

    /// Publish a new free slot on `date`.
    pub fn add_slot(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        range: TimeRange,
        added_by: Option<&str>,
    ) -> BookingResult<Slot> {
        let tx = self.db.immediate_transaction()?;

        self.ensure_doctor(doctor_id)?;

        for existing in self.db.list_slots_for_day(doctor_id, date)? {
            if existing.range()?.overlaps(&range) {
                warn!(doctor_id, %date, existing = %existing.slot_id, "slot overlaps");
                return Err(BookingError::SlotOverlap {
                    date,
                    start_time: range.start_str(),
                    end_time: range.end_str(),
                });
            }
        }

        let slot = Slot::new(&range);
        self.db.insert_slot(doctor_id, date, &slot)?;

        self.db.insert_activity(
            &ActivityEvent::new(
                ActivityAction::AvailabilityUpdated,
                format!("Slot {} added on {}", range.label(), date_key(date)),
            )
            .by(added_by)
            .target(TargetType::User, doctor_id)
            .with_metadata(json!({
                "op": "add",
                "slotId": slot.slot_id,
                "date": date_key(date),
                "timeSlot": range.label(),
            })),
        )?;

        tx.commit()?;

        info!(doctor_id, slot_id = %slot.slot_id, %date, "slot added");
        Ok(slot)
    }

    /// Withdraw a free slot.
    pub fn remove_slot(&self, doctor_id: &str, slot_id: &str, removed_by: Option<&str>) -> BookingResult<()> {
        let tx = self.db.immediate_transaction()?;

        let record = self
            .db
            .get_slot(slot_id)?
            .filter(|record| record.doctor_id == doctor_id)
            .ok_or_else(|| BookingError::NotFound(format!("slot {}", slot_id)))?;

        if record.slot.is_booked {
            return Err(BookingError::SlotInUse(slot_id.to_string()));
        }

        match self.db.delete_free_slot(doctor_id, slot_id) {
            Ok(true) => {}
            Ok(false) => return Err(BookingError::SlotInUse(slot_id.to_string())),
            // Referenced by a past appointment
            Err(DbError::Constraint(_)) => return Err(BookingError::SlotInUse(slot_id.to_string())),
            Err(e) => return Err(e.into()),
        }

        self.db.insert_activity(
            &ActivityEvent::new(
                ActivityAction::AvailabilityUpdated,
                format!(
                    "Slot {} - {} removed from {}",
                    record.slot.start_time,
                    record.slot.end_time,
                    date_key(record.date)
                ),
            )
            .by(removed_by)
            .target(TargetType::User, doctor_id)
            .with_metadata(json!({
                "op": "remove",
                "slotId": slot_id,
                "date": date_key(record.date),
            })),
        )?;

        tx.commit()?;

        info!(doctor_id, slot_id, "slot removed");
        Ok(())
    }

    /// The doctor's whole calendar.
    pub fn calendar(&self, doctor_id: &str) -> BookingResult<DoctorCalendar> {
        self.ensure_doctor(doctor_id)?;
        let slots = self.db.list_slots_for_doctor(doctor_id, None)?;
        Ok(DoctorCalendar::from_slots(doctor_id.to_string(), slots))
    }

    /// The doctor's calendar from `from` onwards.
    pub fn calendar_from(&self, doctor_id: &str, from: NaiveDate) -> BookingResult<DoctorCalendar> {
        self.ensure_doctor(doctor_id)?;
        let slots = self.db.list_slots_for_doctor(doctor_id, Some(from))?;
        Ok(DoctorCalendar::from_slots(doctor_id.to_string(), slots))
    }

    fn ensure_doctor(&self, doctor_id: &str) -> BookingResult<()> {
        if self.db.doctor_exists(doctor_id)? {
            Ok(())
        } else {
            Err(BookingError::NotFound(format!("doctor {}", doctor_id)))
        }
    }
}

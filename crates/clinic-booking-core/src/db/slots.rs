//! Availability slot database operations.
//!
//! The booking primitives here are single conditional statements: the match
//! and the mutation happen inside SQLite in one step, so two connections can
//! never both observe a slot as free and both book it.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{constraint_or_sqlite, Database, DbError, DbResult};
use crate::models::{date_key, Slot, DATE_FORMAT};

/// A slot as stored, with its owning doctor and day.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRecord {
    pub doctor_id: String,
    pub date: NaiveDate,
    pub slot: Slot,
}

/// The slot a successful lock transitioned from free to booked.
#[derive(Debug, Clone, PartialEq)]
pub struct LockedSlot {
    pub slot_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

impl LockedSlot {
    /// "HH:MM - HH:MM" label of the locked interval.
    pub fn time_slot(&self) -> String {
        format!("{} - {}", self.start_time, self.end_time)
    }
}

const SLOT_COLUMNS: &str = "slot_id, doctor_id, date, start_time, end_time, is_booked";

/// Intermediate row struct for database mapping.
struct SlotRow {
    slot_id: String,
    doctor_id: String,
    date: String,
    start_time: String,
    end_time: String,
    is_booked: bool,
}

fn slot_row(row: &Row<'_>) -> rusqlite::Result<SlotRow> {
    Ok(SlotRow {
        slot_id: row.get(0)?,
        doctor_id: row.get(1)?,
        date: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        is_booked: row.get(5)?,
    })
}

impl TryFrom<SlotRow> for SlotRecord {
    type Error = DbError;

    fn try_from(row: SlotRow) -> Result<Self, Self::Error> {
        Ok(SlotRecord {
            doctor_id: row.doctor_id,
            date: parse_stored_date(&row.date)?,
            slot: Slot {
                slot_id: row.slot_id,
                start_time: row.start_time,
                end_time: row.end_time,
                is_booked: row.is_booked,
            },
        })
    }
}

pub(crate) fn parse_stored_date(s: &str) -> DbResult<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| DbError::Constraint(format!("Invalid stored date: {}", s)))
}

impl Database {
    /// Insert a new slot on a doctor's day.
    pub fn insert_slot(&self, doctor_id: &str, date: NaiveDate, slot: &Slot) -> DbResult<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .execute(
                r#"
                INSERT INTO slots (
                    slot_id, doctor_id, date, start_time, end_time, is_booked,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                "#,
                params![
                    slot.slot_id,
                    doctor_id,
                    date_key(date),
                    slot.start_time,
                    slot.end_time,
                    slot.is_booked,
                    now,
                ],
            )
            .map_err(|e| constraint_or_sqlite(e, "insert slot"))?;
        Ok(())
    }

    /// Get a slot by ID.
    pub fn get_slot(&self, slot_id: &str) -> DbResult<Option<SlotRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM slots WHERE slot_id = ?", SLOT_COLUMNS),
                [slot_id],
                slot_row,
            )
            .optional()?
            .map(SlotRecord::try_from)
            .transpose()
    }

    /// Slots of one doctor on one day, ordered by start time.
    pub fn list_slots_for_day(&self, doctor_id: &str, date: NaiveDate) -> DbResult<Vec<Slot>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM slots WHERE doctor_id = ?1 AND date = ?2 ORDER BY start_time",
            SLOT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![doctor_id, date_key(date)], slot_row)?;

        let mut slots = Vec::new();
        for row in rows {
            let record: SlotRecord = row?.try_into()?;
            slots.push(record.slot);
        }
        Ok(slots)
    }

    /// All slots of a doctor on or after `from` (or all, if `None`).
    pub fn list_slots_for_doctor(
        &self,
        doctor_id: &str,
        from: Option<NaiveDate>,
    ) -> DbResult<Vec<(NaiveDate, Slot)>> {
        let from_key = from.map(date_key).unwrap_or_default();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM slots WHERE doctor_id = ?1 AND date >= ?2 ORDER BY date, start_time",
            SLOT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![doctor_id, from_key], slot_row)?;

        let mut slots = Vec::new();
        for row in rows {
            let record: SlotRecord = row?.try_into()?;
            slots.push((record.date, record.slot));
        }
        Ok(slots)
    }

    /// Atomically book the free slot at `(doctor_id, date, start_time)`.
    ///
    /// Returns `None` when no row matched: the slot is already booked or does
    /// not exist.
    pub fn try_lock_slot(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        start_time: &str,
    ) -> DbResult<Option<LockedSlot>> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .query_row(
                r#"
                UPDATE slots SET is_booked = 1, updated_at = ?4
                WHERE doctor_id = ?1 AND date = ?2 AND start_time = ?3 AND is_booked = 0
                RETURNING slot_id, end_time
                "#,
                params![doctor_id, date_key(date), start_time, now],
                |row| {
                    Ok(LockedSlot {
                        slot_id: row.get(0)?,
                        doctor_id: doctor_id.to_string(),
                        date,
                        start_time: start_time.to_string(),
                        end_time: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Atomically free a booked slot. Returns false if nothing matched.
    pub fn try_release_slot(&self, doctor_id: &str, slot_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE slots SET is_booked = 0, updated_at = ?3
            WHERE slot_id = ?1 AND doctor_id = ?2 AND is_booked = 1
            "#,
            params![slot_id, doctor_id, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(rows_affected == 1)
    }

    /// Delete a slot only if it is currently free. Returns false if nothing matched.
    pub fn delete_free_slot(&self, doctor_id: &str, slot_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM slots WHERE slot_id = ?1 AND doctor_id = ?2 AND is_booked = 0",
                params![slot_id, doctor_id],
            )
            .map_err(|e| constraint_or_sqlite(e, "delete slot"))?;
        Ok(rows_affected == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Doctor, TimeRange};

    fn setup() -> (Database, String, NaiveDate) {
        let db = Database::open_in_memory().unwrap();
        let doctor = Doctor::new("Dr. Lee".into(), None);
        db.insert_doctor(&doctor).unwrap();
        (db, doctor.doctor_id, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
    }

    fn slot(start: &str, end: &str) -> Slot {
        Slot::new(&TimeRange::parse(start, end).unwrap())
    }

    #[test]
    fn test_insert_and_list() {
        let (db, doctor_id, date) = setup();
        db.insert_slot(&doctor_id, date, &slot("10:00", "10:30")).unwrap();
        db.insert_slot(&doctor_id, date, &slot("09:00", "09:30")).unwrap();

        let slots = db.list_slots_for_day(&doctor_id, date).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].start_time, "09:00");
        assert!(!slots[0].is_booked);
    }

    #[test]
    fn test_duplicate_start_is_constraint_error() {
        let (db, doctor_id, date) = setup();
        db.insert_slot(&doctor_id, date, &slot("09:00", "09:30")).unwrap();

        let err = db
            .insert_slot(&doctor_id, date, &slot("09:00", "09:45"))
            .unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));
    }

    #[test]
    fn test_lock_is_conditional() {
        let (db, doctor_id, date) = setup();
        let free = slot("09:00", "09:30");
        db.insert_slot(&doctor_id, date, &free).unwrap();

        let locked = db.try_lock_slot(&doctor_id, date, "09:00").unwrap().unwrap();
        assert_eq!(locked.slot_id, free.slot_id);
        assert_eq!(locked.end_time, "09:30");
        assert_eq!(locked.time_slot(), "09:00 - 09:30");

        // Second attempt sees it booked
        assert!(db.try_lock_slot(&doctor_id, date, "09:00").unwrap().is_none());

        let record = db.get_slot(&free.slot_id).unwrap().unwrap();
        assert!(record.slot.is_booked);
        assert_eq!(record.date, date);
    }

    #[test]
    fn test_lock_misses_unknown_slot() {
        let (db, doctor_id, date) = setup();
        db.insert_slot(&doctor_id, date, &slot("09:00", "09:30")).unwrap();

        assert!(db.try_lock_slot(&doctor_id, date, "11:00").unwrap().is_none());
        let next_day = date.succ_opt().unwrap();
        assert!(db.try_lock_slot(&doctor_id, next_day, "09:00").unwrap().is_none());
        assert!(db.try_lock_slot("other-doctor", date, "09:00").unwrap().is_none());
    }

    #[test]
    fn test_release_is_conditional() {
        let (db, doctor_id, date) = setup();
        let s = slot("09:00", "09:30");
        db.insert_slot(&doctor_id, date, &s).unwrap();

        // Free slot cannot be released
        assert!(!db.try_release_slot(&doctor_id, &s.slot_id).unwrap());

        db.try_lock_slot(&doctor_id, date, "09:00").unwrap().unwrap();
        assert!(db.try_release_slot(&doctor_id, &s.slot_id).unwrap());
        assert!(!db.try_release_slot(&doctor_id, &s.slot_id).unwrap());
        assert!(!db.get_slot(&s.slot_id).unwrap().unwrap().slot.is_booked);
    }

    #[test]
    fn test_delete_only_free_slots() {
        let (db, doctor_id, date) = setup();
        let booked = slot("09:00", "09:30");
        let free = slot("10:00", "10:30");
        db.insert_slot(&doctor_id, date, &booked).unwrap();
        db.insert_slot(&doctor_id, date, &free).unwrap();
        db.try_lock_slot(&doctor_id, date, "09:00").unwrap().unwrap();

        assert!(!db.delete_free_slot(&doctor_id, &booked.slot_id).unwrap());
        assert!(db.delete_free_slot(&doctor_id, &free.slot_id).unwrap());
        assert!(db.get_slot(&free.slot_id).unwrap().is_none());
    }

    #[test]
    fn test_list_for_doctor_from_date() {
        let (db, doctor_id, date) = setup();
        let tomorrow = date.succ_opt().unwrap();
        db.insert_slot(&doctor_id, date, &slot("09:00", "09:30")).unwrap();
        db.insert_slot(&doctor_id, tomorrow, &slot("09:00", "09:30")).unwrap();

        assert_eq!(db.list_slots_for_doctor(&doctor_id, None).unwrap().len(), 2);
        let upcoming = db.list_slots_for_doctor(&doctor_id, Some(tomorrow)).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].0, tomorrow);
    }
}

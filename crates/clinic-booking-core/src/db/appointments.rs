//! Appointment database operations.

use rusqlite::{params, OptionalExtension, Params, Row};

use super::slots::parse_stored_date;
use super::{constraint_or_sqlite, Database, DbError, DbResult};
use crate::models::{date_key, Appointment, AppointmentStatus};

const APPOINTMENT_COLUMNS: &str = r#"
    appointment_id, patient_id, doctor_id, slot_id, appointment_date,
    time_slot, start_time, end_time, consultation_type, reason_for_visit,
    status, created_at, updated_at
"#;

impl Database {
    /// Insert a new appointment.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO appointments (
                    appointment_id, patient_id, doctor_id, slot_id, appointment_date,
                    time_slot, start_time, end_time, consultation_type, reason_for_visit,
                    status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
                params![
                    appointment.id,
                    appointment.patient_id,
                    appointment.doctor_id,
                    appointment.slot_id,
                    date_key(appointment.appointment_date),
                    appointment.time_slot,
                    appointment.start_time,
                    appointment.end_time,
                    appointment.consultation_type,
                    appointment.reason_for_visit,
                    appointment.status.as_str(),
                    appointment.created_at,
                    appointment.updated_at,
                ],
            )
            .map_err(|e| constraint_or_sqlite(e, "insert appointment"))?;
        Ok(())
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, appointment_id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM appointments WHERE appointment_id = ?",
                    APPOINTMENT_COLUMNS
                ),
                [appointment_id],
                appointment_row,
            )
            .optional()?
            .map(Appointment::try_from)
            .transpose()
    }

    /// Move an appointment from `expected` to `status`.
    ///
    /// Returns false if the appointment is missing or no longer in `expected`.
    pub fn update_appointment_status(
        &self,
        appointment_id: &str,
        expected: AppointmentStatus,
        status: AppointmentStatus,
        updated_at: &str,
    ) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE appointments SET status = ?3, updated_at = ?4
                WHERE appointment_id = ?1 AND status = ?2
                "#,
                params![
                    appointment_id,
                    expected.as_str(),
                    status.as_str(),
                    updated_at
                ],
            )
            .map_err(|e| constraint_or_sqlite(e, "update appointment status"))?;
        Ok(rows_affected == 1)
    }

    /// List every appointment, optionally only those in `status`, latest date first.
    pub fn list_appointments(&self, status: Option<AppointmentStatus>) -> DbResult<Vec<Appointment>> {
        match status {
            Some(status) => self.list_appointments_where("WHERE status = ?", [status.as_str()]),
            None => self.list_appointments_where("", params![]),
        }
    }

    /// List a patient's appointments, latest date first.
    pub fn list_appointments_for_patient(&self, patient_id: &str) -> DbResult<Vec<Appointment>> {
        self.list_appointments_where("WHERE patient_id = ?", [patient_id])
    }

    /// List a doctor's appointments, latest date first.
    pub fn list_appointments_for_doctor(&self, doctor_id: &str) -> DbResult<Vec<Appointment>> {
        self.list_appointments_where("WHERE doctor_id = ?", [doctor_id])
    }

    /// The active appointment holding a slot, if any.
    pub fn active_appointment_for_slot(&self, slot_id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM appointments WHERE slot_id = ? AND status != 'cancelled'",
                    APPOINTMENT_COLUMNS
                ),
                [slot_id],
                appointment_row,
            )
            .optional()?
            .map(Appointment::try_from)
            .transpose()
    }

    fn list_appointments_where<P: Params>(&self, filter: &str, params: P) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM appointments {} ORDER BY appointment_date DESC, start_time DESC, created_at DESC",
            APPOINTMENT_COLUMNS, filter
        ))?;

        let rows = stmt.query_map(params, appointment_row)?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }
}

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    appointment_id: String,
    patient_id: String,
    doctor_id: String,
    slot_id: String,
    appointment_date: String,
    time_slot: String,
    start_time: String,
    end_time: String,
    consultation_type: String,
    reason_for_visit: String,
    status: String,
    created_at: String,
    updated_at: String,
}

fn appointment_row(row: &Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        appointment_id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        slot_id: row.get(3)?,
        appointment_date: row.get(4)?,
        time_slot: row.get(5)?,
        start_time: row.get(6)?,
        end_time: row.get(7)?,
        consultation_type: row.get(8)?,
        reason_for_visit: row.get(9)?,
        status: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<AppointmentStatus>()
            .map_err(|e| DbError::Constraint(e.to_string()))?;

        Ok(Appointment {
            id: row.appointment_id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            slot_id: row.slot_id,
            appointment_date: parse_stored_date(&row.appointment_date)?,
            time_slot: row.time_slot,
            start_time: row.start_time,
            end_time: row.end_time,
            consultation_type: row.consultation_type,
            reason_for_visit: row.reason_for_visit,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

//! Doctor database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Doctor;

const DOCTOR_COLUMNS: &str = "doctor_id, name, specialization, created_at, updated_at";

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        doctor_id: row.get(0)?,
        name: row.get(1)?,
        specialization: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl Database {
    /// Insert a new doctor.
    pub fn insert_doctor(&self, doctor: &Doctor) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO doctors (doctor_id, name, specialization, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                doctor.doctor_id,
                doctor.name,
                doctor.specialization,
                doctor.created_at,
                doctor.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a doctor by ID.
    pub fn get_doctor(&self, doctor_id: &str) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM doctors WHERE doctor_id = ?", DOCTOR_COLUMNS),
                [doctor_id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Check if a doctor exists.
    pub fn doctor_exists(&self, doctor_id: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM doctors WHERE doctor_id = ?",
            [doctor_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List all doctors by name.
    pub fn list_doctors(&self) -> DbResult<Vec<Doctor>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM doctors ORDER BY name",
            DOCTOR_COLUMNS
        ))?;

        let rows = stmt.query_map([], doctor_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

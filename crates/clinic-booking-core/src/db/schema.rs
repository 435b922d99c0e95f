//! SQLite schema definition.

/// Complete database schema for clinic booking.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Doctors
-- ============================================================================

CREATE TABLE IF NOT EXISTS doctors (
    doctor_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    specialization TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_doctors_name ON doctors(name);

-- ============================================================================
-- Availability Slots (one row per slot; a day is all rows sharing doctor+date)
-- ============================================================================

CREATE TABLE IF NOT EXISTS slots (
    slot_id TEXT PRIMARY KEY,
    doctor_id TEXT NOT NULL REFERENCES doctors(doctor_id),
    date TEXT NOT NULL,                          -- UTC calendar date, YYYY-MM-DD
    start_time TEXT NOT NULL,                    -- HH:MM
    end_time TEXT NOT NULL,                      -- HH:MM, exclusive
    is_booked INTEGER NOT NULL DEFAULT 0 CHECK (is_booked IN (0, 1)),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (doctor_id, date, start_time),
    -- end_time '00:00' closes the day
    CHECK (start_time < end_time OR (end_time = '00:00' AND start_time != '00:00'))
);

-- ============================================================================
-- Appointments (never deleted; cancelled appointments release their slot)
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    appointment_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    doctor_id TEXT NOT NULL REFERENCES doctors(doctor_id),
    slot_id TEXT NOT NULL REFERENCES slots(slot_id),
    appointment_date TEXT NOT NULL,              -- UTC calendar date, YYYY-MM-DD
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    time_slot TEXT NOT NULL,                     -- "HH:MM - HH:MM"
    consultation_type TEXT NOT NULL DEFAULT '',
    reason_for_visit TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'confirmed'
        CHECK (status IN ('pending', 'confirmed', 'completed', 'cancelled')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- At most one active appointment per slot
CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_active_slot
    ON appointments(slot_id) WHERE status != 'cancelled';
CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_active_time
    ON appointments(doctor_id, appointment_date, start_time) WHERE status != 'cancelled';

CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_doctor ON appointments(doctor_id, appointment_date);

-- Slots referenced by an appointment are toggled, never deleted
CREATE TRIGGER IF NOT EXISTS slots_referenced_no_delete BEFORE DELETE ON slots
WHEN EXISTS (SELECT 1 FROM appointments WHERE slot_id = old.slot_id)
BEGIN
    SELECT RAISE(ABORT, 'Slot is referenced by an appointment');
END;

-- ============================================================================
-- Activity Log (Append-Only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS activity_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    action TEXT NOT NULL,
    user_id TEXT,
    target_id TEXT,
    target_type TEXT NOT NULL DEFAULT 'System'
        CHECK (target_type IN ('User', 'Appointment', 'System')),
    description TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',         -- JSON object
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_activity_created ON activity_log(created_at);
CREATE INDEX IF NOT EXISTS idx_activity_action ON activity_log(action);
CREATE INDEX IF NOT EXISTS idx_activity_user ON activity_log(user_id);

CREATE TRIGGER IF NOT EXISTS activity_log_no_update BEFORE UPDATE ON activity_log
BEGIN
    SELECT RAISE(ABORT, 'Activity log is append-only');
END;

CREATE TRIGGER IF NOT EXISTS activity_log_no_delete BEFORE DELETE ON activity_log
BEGIN
    SELECT RAISE(ABORT, 'Activity log is append-only');
END;
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO doctors (doctor_id, name) VALUES ('d1', 'Dr. Who')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO slots (slot_id, doctor_id, date, start_time, end_time) VALUES ('s1', 'd1', '2024-03-10', '09:00', '09:30')",
            [],
        )
        .unwrap();
        conn
    }

    fn insert_appointment(conn: &Connection, id: &str, status: &str) -> rusqlite::Result<usize> {
        conn.execute(
            r#"
            INSERT INTO appointments (
                appointment_id, patient_id, doctor_id, slot_id, appointment_date,
                start_time, end_time, time_slot, status
            ) VALUES (?1, 'p1', 'd1', 's1', '2024-03-10', '09:00', '09:30', '09:00 - 09:30', ?2)
            "#,
            [id, status],
        )
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_slot_constraints() {
        let conn = setup();

        // Inverted range
        let result = conn.execute(
            "INSERT INTO slots (slot_id, doctor_id, date, start_time, end_time) VALUES ('s2', 'd1', '2024-03-10', '10:00', '09:30')",
            [],
        );
        assert!(result.is_err());

        // Duplicate start on the same day
        let result = conn.execute(
            "INSERT INTO slots (slot_id, doctor_id, date, start_time, end_time) VALUES ('s3', 'd1', '2024-03-10', '09:00', '10:00')",
            [],
        );
        assert!(result.is_err());

        // Last slot of the day ends at midnight
        let result = conn.execute(
            "INSERT INTO slots (slot_id, doctor_id, date, start_time, end_time) VALUES ('s5', 'd1', '2024-03-10', '23:30', '00:00')",
            [],
        );
        assert!(result.is_ok());

        // Unknown doctor
        let result = conn.execute(
            "INSERT INTO slots (slot_id, doctor_id, date, start_time, end_time) VALUES ('s4', 'nobody', '2024-03-10', '11:00', '11:30')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_one_active_appointment_per_slot() {
        let conn = setup();

        assert!(insert_appointment(&conn, "a1", "confirmed").is_ok());
        assert!(insert_appointment(&conn, "a2", "pending").is_err());

        conn.execute(
            "UPDATE appointments SET status = 'cancelled' WHERE appointment_id = 'a1'",
            [],
        )
        .unwrap();

        // Cancelled rows do not occupy the slot
        assert!(insert_appointment(&conn, "a3", "confirmed").is_ok());
    }

    #[test]
    fn test_status_check() {
        let conn = setup();
        assert!(insert_appointment(&conn, "a1", "bogus").is_err());
    }

    #[test]
    fn test_referenced_slot_cannot_be_deleted() {
        let conn = setup();
        insert_appointment(&conn, "a1", "cancelled").unwrap();

        let result = conn.execute("DELETE FROM slots WHERE slot_id = 's1'", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_activity_log_append_only() {
        let conn = setup();
        conn.execute(
            "INSERT INTO activity_log (action, description) VALUES ('Appointment Created', 'x')",
            [],
        )
        .unwrap();

        let result = conn.execute("UPDATE activity_log SET description = 'y'", []);
        assert!(result.is_err());

        let result = conn.execute("DELETE FROM activity_log", []);
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM activity_log", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}

//! Activity log database operations.

use rusqlite::params;

use super::{Database, DbError, DbResult};
use crate::models::{ActivityAction, ActivityEvent, TargetType};

impl Database {
    /// Append an event. Returns the new row ID.
    pub fn insert_activity(&self, event: &ActivityEvent) -> DbResult<i64> {
        let metadata = serde_json::to_string(&event.metadata)?;
        self.conn.execute(
            r#"
            INSERT INTO activity_log (
                action, user_id, target_id, target_type, description, metadata, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                event.action.as_str(),
                event.user_id,
                event.target_id,
                event.target_type.as_str(),
                event.description,
                metadata,
                event.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent events first.
    pub fn list_recent_activity(&self, limit: usize) -> DbResult<Vec<ActivityEvent>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, action, user_id, target_id, target_type, description, metadata, created_at
            FROM activity_log
            ORDER BY id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            Ok(ActivityRow {
                id: row.get(0)?,
                action: row.get(1)?,
                user_id: row.get(2)?,
                target_id: row.get(3)?,
                target_type: row.get(4)?,
                description: row.get(5)?,
                metadata: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?.try_into()?);
        }
        Ok(events)
    }

    /// Number of events recorded for a target.
    pub fn count_activity_for_target(&self, target_id: &str) -> DbResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM activity_log WHERE target_id = ?",
            [target_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Intermediate row struct for database mapping.
struct ActivityRow {
    id: i64,
    action: String,
    user_id: Option<String>,
    target_id: Option<String>,
    target_type: String,
    description: String,
    metadata: String,
    created_at: String,
}

impl TryFrom<ActivityRow> for ActivityEvent {
    type Error = DbError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        let action = ActivityAction::from_str(&row.action)
            .ok_or_else(|| DbError::Constraint(format!("Unknown activity action: {}", row.action)))?;
        let target_type = TargetType::from_str(&row.target_type).ok_or_else(|| {
            DbError::Constraint(format!("Unknown target type: {}", row.target_type))
        })?;

        Ok(ActivityEvent {
            id: Some(row.id),
            action,
            user_id: row.user_id,
            target_id: row.target_id,
            target_type,
            description: row.description,
            metadata: serde_json::from_str(&row.metadata)?,
            created_at: row.created_at,
        })
    }
}

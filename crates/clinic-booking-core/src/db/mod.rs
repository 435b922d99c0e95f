//! Database layer for clinic booking.

mod schema;
mod doctors;
mod slots;
mod appointments;
mod activity;

pub use schema::*;
pub use slots::*;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// How long a connection waits for another writer before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest busy timeout SQLite accepts (`i32::MAX` milliseconds).
pub const MAX_BUSY_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Busy timeout {0:?} exceeds the SQLite limit")]
    BusyTimeout(Duration),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating and migrating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::open_with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open database at path with a custom busy timeout.
    pub fn open_with_busy_timeout<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> DbResult<Self> {
        let db = Self::connect(path, busy_timeout)?;
        db.initialize()?;
        Ok(db)
    }

    /// Connect to an already-initialized database file without running the schema.
    ///
    /// Every concurrent worker should hold its own connection; the storage
    /// layer serializes writers.
    pub fn connect<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> DbResult<Self> {
        if busy_timeout > MAX_BUSY_TIMEOUT {
            return Err(DbError::BusyTimeout(busy_timeout));
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self { conn })
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin an IMMEDIATE transaction.
    ///
    /// The write lock is taken up front, so a unit that reads before it writes
    /// cannot be invalidated by a concurrent writer. Dropping the returned
    /// transaction without committing rolls everything back.
    pub fn immediate_transaction(&self) -> DbResult<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

/// Map a constraint failure to [`DbError::Constraint`], leaving other errors as-is.
pub(crate) fn constraint_or_sqlite(err: rusqlite::Error, context: &str) -> DbError {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, ref message)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(format!(
                "{}: {}",
                context,
                message.clone().unwrap_or_else(|| failure.to_string())
            ))
        }
        other => DbError::Sqlite(other),
    }
}

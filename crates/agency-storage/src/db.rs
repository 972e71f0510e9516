//! The local SQLite store behind `SqliteSource`.
//!
//! One connection serves all four collections. Every statement runs inside
//! [`Database::with_conn`], so concurrent chat and stats queries take turns
//! on the same handle.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::Connection;
use tracing::info;

use agency_core::error::AgencyError;

use crate::migrations;

/// How long a statement waits on a lock held by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn storage_err(context: &str, e: rusqlite::Error) -> AgencyError {
    AgencyError::Storage(format!("{}: {}", context, e))
}

/// Agency records on disk or in memory, schema already migrated.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the agency store at `path`, creating parent directories and the
    /// file as needed. File stores use WAL journaling.
    pub fn new(path: &Path) -> Result<Self, AgencyError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| storage_err("open agency store", e))?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
            .map_err(|e| storage_err("enable WAL", e))?;

        info!(path = %path.display(), "agency store opened");
        Self::prepare(conn)
    }

    /// A throwaway store that lives as long as the returned value.
    pub fn in_memory() -> Result<Self, AgencyError> {
        let conn =
            Connection::open_in_memory().map_err(|e| storage_err("open in-memory store", e))?;
        Self::prepare(conn)
    }

    fn prepare(conn: Connection) -> Result<Self, AgencyError> {
        // Orders reference users and services; the embeds depend on it.
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| storage_err("enable foreign keys", e))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| storage_err("set busy timeout", e))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Run `f` against the store. Other callers block until it returns, so
    /// keep the closure to the statements of one operation.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, AgencyError>
    where
        F: FnOnce(&Connection) -> Result<T, AgencyError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| AgencyError::Storage("agency store lock poisoned".into()))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

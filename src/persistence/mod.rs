//! Persistence subsystem (SQLite).
//!
//! # Data Flow
//! ```text
//! Database::open
//!     → pragmas (foreign_keys, busy_timeout)
//!     → migrations (PRAGMA user_version)
//!     → seed.rs (sample data, empty database only)
//!
//! Request handling:
//!     application op → Database::call(closure) → blocking pool
//!         → users.rs / activities.rs queries on the locked connection
//! ```
//!
//! # Design Decisions
//! - One connection behind a mutex; SQLite serializes writers anyway
//! - Queries never run on the async executor threads
//! - Multi-statement writes use a transaction

pub mod activities;
pub mod migrations;
pub mod seed;
pub mod users;

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rusqlite::Connection;
use thiserror::Error;

use crate::config::DatabaseConfig;

/// Path value that selects an in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database schema version {db_version} is newer than supported version {latest_supported}")]
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },

    #[error("stored value is invalid: {0}")]
    InvalidData(String),

    #[error("database connection lock poisoned")]
    Poisoned,

    #[error("database task failed: {0}")]
    Task(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Shared handle to the application database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open the configured database and apply pending migrations.
    pub fn open(config: &DatabaseConfig) -> DbResult<Self> {
        let started_at = Instant::now();
        let conn = if config.path == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            Connection::open(Path::new(&config.path))?
        };

        let db = Self::bootstrap(conn, Duration::from_millis(config.busy_timeout_ms))?;
        tracing::info!(
            path = %config.path,
            schema_version = migrations::latest_version(),
            duration_ms = started_at.elapsed().as_millis() as u64,
            "Database ready"
        );
        Ok(db)
    }

    /// Open a private in-memory database with the schema applied.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::bootstrap(Connection::open_in_memory()?, Duration::from_secs(5))
    }

    fn bootstrap(mut conn: Connection, busy_timeout: Duration) -> DbResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(busy_timeout)?;
        migrations::apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking thread pool.
    pub async fn call<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut Connection) -> DbResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| DbError::Poisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| DbError::Task(e.to_string()))?
    }
}

#[cfg(test)]
pub(crate) fn test_connection() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    migrations::apply_migrations(&mut conn).unwrap();
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_call_runs_on_migrated_connection() {
        let db = Database::open_in_memory().unwrap();
        let version = db.call(|conn| migrations::current_user_version(conn)).await.unwrap();
        assert_eq!(version, migrations::latest_version());
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = Database::open_in_memory().unwrap();
        let result = db
            .call(|conn| {
                conn.execute(
                    "INSERT INTO activity_attendees (activity_id, user_id, is_host, date_joined)
                     VALUES ('missing', 'missing', 0, '2024-01-01T00:00:00Z')",
                    [],
                )?;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(DbError::Sqlite(_))));
    }

    #[test]
    fn test_open_memory_path() {
        let config = DatabaseConfig {
            path: IN_MEMORY.to_string(),
            busy_timeout_ms: 100,
        };
        assert!(Database::open(&config).is_ok());
    }
}

//! Startup orchestration.
//!
//! Subsystems initialize in order: database (schema migrations), seed data,
//! session store, then the listener. Migration failure is fatal; seeding
//! failure is logged and the server starts with whatever data exists.

use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::auth::password::hash_password;
use crate::auth::SessionStore;
use crate::config::AppConfig;
use crate::persistence::{seed, Database, DbError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open database: {0}")]
    Database(#[from] DbError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Long-lived services shared by every request.
pub struct Services {
    pub db: Database,
    pub sessions: SessionStore,
}

/// Open the database, seed it if configured, and create the session store.
pub async fn initialize(config: &AppConfig) -> Result<Services, StartupError> {
    let db = Database::open(&config.database)?;

    if config.seed.enabled {
        seed_database(&db).await;
    }

    let sessions = SessionStore::new(Duration::from_secs(config.auth.session_ttl_secs));
    Ok(Services { db, sessions })
}

async fn seed_database(db: &Database) {
    let result = db
        .call(|conn| seed::seed_data(conn, |password| hash_password(password).map_err(|e| e.to_string())))
        .await;

    match result {
        Ok(true) => tracing::info!("Seed data inserted"),
        Ok(false) => tracing::debug!("Database already has users, skipping seed"),
        Err(e) => tracing::error!(error = %e, "An error occurred during migration"),
    }
}

/// Bind the configured listener address.
pub async fn bind_listener(config: &AppConfig) -> Result<TcpListener, StartupError> {
    let address = config.listener.bind_address.clone();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}

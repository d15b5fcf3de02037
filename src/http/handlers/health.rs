use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe. Reports `degraded` when the database cannot answer.
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let status = match state.db.call(|conn| Ok(conn.execute_batch("SELECT 1")?)).await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            "degraded"
        }
    };

    Json(HealthStatus {
        status,
        version: env!("CARGO_PKG_VERSION"),
    })
}

//! Health checks.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness: the process is up. Does not touch the database.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness: 503 until the database answers.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

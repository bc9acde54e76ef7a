//! Health checks.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

pub async fn health() -> &'static str {
    "ok"
}

/// 503 while the database is unreachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if let Err(e) = sqlx::query("SELECT 1").execute(state.pool()).await {
        tracing::warn!(error = %e, "Admin readiness check failed");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

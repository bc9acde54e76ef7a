//! Session login and logout.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::Json;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::session::CurrentUser;
use crate::serializers::UserResponse;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Login request body.
///
/// No `Debug`: carries a plaintext password.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn session_error(e: &tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {e}"))
}

/// `POST /api/auth/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<UserResponse>> {
    let user = AuthService::new(state.pool())
        .login(&request.username, &request.password)
        .await
        .inspect_err(|e| tracing::warn!(username = %request.username, error = %e, "Login failed"))?;

    // New session id on privilege change
    session.cycle_id().await.map_err(|e| session_error(&e))?;
    set_current_user(
        &session,
        &CurrentUser {
            id: user.id,
            username: user.username.clone(),
        },
    )
    .await
    .map_err(|e| session_error(&e))?;

    set_sentry_user(&user.id, &user.username);
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(UserResponse::new(&user, state.media())))
}

/// `POST /api/auth/logout`. Succeeds without a session too.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| session_error(&e))?;
    session.flush().await.map_err(|e| session_error(&e))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

//! Login and logout.
//!
//! Staff sign in with the same username and password they use on the API;
//! only active accounts with `is_staff` or `is_superuser` are let in.

use askama::Template;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use foodloc_api::services::auth::{AuthError, AuthService};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::render;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{LOGIN_PATH, clear_current_staff, set_current_staff};
use crate::models::CurrentStaff;
use crate::state::AppState;

const INVALID_LOGIN: &str =
    "Please enter the correct username and password for a staff account.";

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    error: Option<&'static str>,
    username: String,
}

/// Login form body. No `Debug`: carries a plaintext password.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// `GET /login`
pub async fn login_page() -> impl IntoResponse {
    render(&LoginTemplate {
        error: None,
        username: String::new(),
    })
}

/// `POST /login`
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let user = match AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) if user.is_admin() => user,
        Ok(user) => {
            tracing::warn!(user_id = %user.id, "Non-staff account tried the admin console");
            return Ok(login_failed(form.username));
        }
        Err(AuthError::InvalidCredentials | AuthError::InactiveAccount) => {
            return Ok(login_failed(form.username));
        }
        Err(e) => return Err(e.into()),
    };

    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    set_current_staff(
        &session,
        &CurrentStaff {
            id: user.id,
            username: user.username.clone(),
        },
    )
    .await
    .map_err(|e| AppError::Internal(format!("session: {e}")))?;

    tracing::info!(staff_id = %user.id, "Staff logged in");
    Ok(Redirect::to("/").into_response())
}

fn login_failed(username: String) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        render(&LoginTemplate {
            error: Some(INVALID_LOGIN),
            username,
        }),
    )
        .into_response()
}

/// `POST /logout`
pub async fn logout(session: Session) -> Redirect {
    let _ = clear_current_staff(&session).await;
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to flush admin session");
    }
    Redirect::to(LOGIN_PATH)
}

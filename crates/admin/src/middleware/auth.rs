//! Authentication extractors for the staff console.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use foodloc_api::db::UserRepository;
use foodloc_api::models::user::User;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentStaff, session_keys};
use crate::state::AppState;

/// Login page path.
pub const LOGIN_PATH: &str = "/login";

/// Extractor that requires an active staff or superuser account.
///
/// Anonymous visitors, and accounts that lost staff rights since they logged
/// in, are redirected to the login page.
pub struct RequireStaff(pub User);

/// Rejection for [`RequireStaff`].
pub enum StaffRejection {
    RedirectToLogin,
    Error(AppError),
}

impl IntoResponse for StaffRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Error(err) => err.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = StaffRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(StaffRejection::RedirectToLogin)?;

        let staff: CurrentStaff = session
            .get(session_keys::CURRENT_STAFF)
            .await
            .ok()
            .flatten()
            .ok_or(StaffRejection::RedirectToLogin)?;

        let user = UserRepository::new(state.pool())
            .get_by_id(staff.id)
            .await
            .map_err(|e| StaffRejection::Error(e.into()))?;

        match user {
            Some(user) if user.is_admin() => {
                tracing::Span::current().record("staff_id", tracing::field::display(user.id));
                Ok(Self(user))
            }
            _ => {
                tracing::info!(user_id = %staff.id, "Staff session no longer valid");
                let _ = session.flush().await;
                Err(StaffRejection::RedirectToLogin)
            }
        }
    }
}

/// Helper to set the current staff member in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_staff(
    session: &Session,
    staff: &CurrentStaff,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_STAFF, staff).await
}

/// Helper to clear the current staff member from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_staff(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentStaff>(session_keys::CURRENT_STAFF)
        .await?;
    Ok(())
}

/// Store a message for the next rendered page.
pub async fn set_flash(session: &Session, message: impl Into<String>) {
    if let Err(e) = session.insert(session_keys::FLASH, message.into()).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the pending flash message, if any.
pub async fn take_flash(session: &Session) -> Option<String> {
    session
        .remove::<String>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

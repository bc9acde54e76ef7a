//! Authentication extractors.
//!
//! The session only stores a [`CurrentUser`] marker; every request reloads
//! the account so deactivation and role changes take effect immediately.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::session::{CurrentUser, keys};
use crate::models::user::User;
use crate::state::AppState;

/// Extractor that requires a logged-in, active account.
///
/// Rejects with 401 otherwise.
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> String {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        load_user(parts, state)
            .await?
            .map(Self)
            .ok_or_else(|| {
                AppError::Unauthorized("Authentication credentials were not provided.".to_string())
            })
    }
}

/// Extractor that loads the account when there is one.
///
/// Never rejects for a missing session; database failures are still errors.
pub struct OptionalAuth(pub Option<User>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(load_user(parts, state).await?))
    }
}

async fn load_user(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };

    let current: Option<CurrentUser> = session.get(keys::CURRENT_USER).await.ok().flatten();
    let Some(current) = current else {
        return Ok(None);
    };

    let user = UserRepository::new(state.pool()).get_by_id(current.id).await?;
    match user {
        Some(user) if user.is_active => {
            tracing::Span::current().record("user_id", tracing::field::display(user.id));
            Ok(Some(user))
        }
        _ => {
            // Account disabled or deleted since login
            if let Err(e) = clear_current_user(session).await {
                tracing::warn!(error = %e, "Failed to clear stale session");
            }
            Ok(None)
        }
    }
}

/// Store the logged-in account in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CURRENT_USER, user).await
}

/// Remove the logged-in account from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(keys::CURRENT_USER).await?;
    Ok(())
}

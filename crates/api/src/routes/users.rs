//! Account registration and the caller's own profile.

use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use crate::error::Result;
use crate::extract::Json;
use crate::middleware::RequireAuth;
use crate::models::user::{NewUser, ProfileUpdate};
use crate::serializers::UserResponse;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// `POST /api/users`. Stores start unverified.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = AuthService::new(state.pool()).register(&new_user).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse::new(&user, state.media())),
    ))
}

/// `GET /api/users/current-user`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn current_user(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Json<UserResponse> {
    Json(UserResponse::new(&user, state.media()))
}

/// `PATCH /api/users/current-user`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_current_user(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>> {
    let user = AuthService::new(state.pool())
        .update_profile(&user, &update)
        .await?;
    Ok(Json(UserResponse::new(&user, state.media())))
}

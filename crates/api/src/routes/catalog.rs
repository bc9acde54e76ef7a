//! Tags and payment methods.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use crate::cache::CacheKey;
use crate::db::TagRepository;
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::RequireAuth;
use crate::models::catalog::{PaymentMethod, Tag};
use crate::permissions;
use crate::state::AppState;
use crate::validation::{self, MAX_TAG_LENGTH};

#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
    pub name: String,
}

/// `GET /api/tags`
#[instrument(skip_all)]
pub async fn tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>> {
    let tags = state.cache().tags(state.pool()).await?;
    Ok(Json(tags.as_ref().clone()))
}

/// `POST /api/tags`. Verified stores and staff.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_tag(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<NewTag>,
) -> Result<(StatusCode, Json<Tag>)> {
    permissions::require_tag_author(&user)?;
    let name = validation::required_text("name", &request.name, MAX_TAG_LENGTH)
        .map_err(AppError::BadRequest)?;

    let tag = TagRepository::new(state.pool()).create(&name).await?;
    state.cache().invalidate(CacheKey::Tags).await;
    tracing::info!(tag_id = %tag.id, "Tag created");
    Ok((StatusCode::CREATED, Json(tag)))
}

/// `GET /api/payment-methods`. Active methods only.
#[instrument(skip_all)]
pub async fn payment_methods(
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentMethod>>> {
    let methods = state.cache().payment_methods(state.pool()).await?;
    Ok(Json(methods.as_ref().clone()))
}

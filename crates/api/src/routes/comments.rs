//! Editing and deleting one's own comments.

use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use foodloc_core::CommentId;

use crate::db::InteractionRepository;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::middleware::RequireAuth;
use crate::models::interaction::Comment;
use crate::models::user::User;
use crate::permissions;
use crate::serializers::CommentResponse;
use crate::state::AppState;

use super::foods::{CommentRequest, comment_content};

async fn own_comment(state: &AppState, id: CommentId, user: &User) -> Result<Comment> {
    let comment = InteractionRepository::new(state.pool())
        .get_comment(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found.".to_string()))?;
    permissions::require_comment_owner(user, &comment)?;
    Ok(comment)
}

/// `PATCH /api/comments/{id}`
#[instrument(skip_all, fields(comment_id = %id, user_id = %user.id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<CommentId>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<CommentResponse>> {
    own_comment(&state, id, &user).await?;
    let content = comment_content(&request)?;

    let comment = InteractionRepository::new(state.pool())
        .update_comment(id, &content)
        .await?;
    Ok(Json(CommentResponse::new(&comment, Some(&user), state.media())))
}

/// `DELETE /api/comments/{id}`
#[instrument(skip_all, fields(comment_id = %id, user_id = %user.id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<CommentId>,
) -> Result<StatusCode> {
    own_comment(&state, id, &user).await?;
    InteractionRepository::new(state.pool())
        .delete_comment(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Store menus.

use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use foodloc_core::{MenuItemId, UserId};

use crate::db::{FoodFilter, FoodOrdering, MenuItemRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::menu::MenuItemWithCount;
use crate::models::user::User;
use crate::pagination::{PageParams, Paginated};
use crate::permissions;
use crate::serializers::{FoodResponse, MenuItemResponse};
use crate::state::AppState;
use crate::validation::{self, MAX_NAME_LENGTH};

use super::foods::food_page;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuQuery {
    pub store: Option<UserId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItem {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub active: Option<bool>,
}

const fn default_active() -> bool {
    true
}

/// Menus of `store`. The owner also sees disabled menus.
pub(crate) async fn store_menus(
    state: &AppState,
    store: Option<UserId>,
    viewer: Option<&User>,
) -> Result<Vec<MenuItemResponse>> {
    let include_inactive = matches!((store, viewer), (Some(s), Some(v)) if s == v.id);
    let menus = MenuItemRepository::new(state.pool())
        .list(store, include_inactive)
        .await?;
    Ok(menus.iter().map(MenuItemResponse::from).collect())
}

/// Load a menu visible to `viewer`.
async fn visible_menu(
    state: &AppState,
    id: MenuItemId,
    viewer: Option<&User>,
) -> Result<MenuItemWithCount> {
    let row = MenuItemRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found.".to_string()))?;
    let is_owner = viewer.is_some_and(|u| u.id == row.menu.store_id);
    if row.menu.active || is_owner {
        Ok(row)
    } else {
        Err(AppError::NotFound("Not found.".to_string()))
    }
}

async fn owned_menu(state: &AppState, id: MenuItemId, user: &User) -> Result<MenuItemWithCount> {
    let row = MenuItemRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found.".to_string()))?;
    permissions::require_owner(user, row.menu.store_id)?;
    Ok(row)
}

/// `GET /api/menu-items`
#[instrument(skip_all)]
pub async fn index(
    OptionalAuth(viewer): OptionalAuth,
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<Vec<MenuItemResponse>>> {
    Ok(Json(store_menus(&state, query.store, viewer.as_ref()).await?))
}

/// `POST /api/menu-items`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<NewMenuItem>,
) -> Result<(StatusCode, Json<MenuItemResponse>)> {
    permissions::require_verified_store(&user)?;
    let name = validation::required_text("name", &request.name, MAX_NAME_LENGTH)
        .map_err(AppError::BadRequest)?;

    let menu = MenuItemRepository::new(state.pool())
        .create(user.id, &name, request.active)
        .await?;
    tracing::info!(menu_item_id = %menu.id, "Menu created");
    Ok((StatusCode::CREATED, Json(MenuItemResponse::new(&menu, 0))))
}

/// `GET /api/menu-items/{id}`
#[instrument(skip_all, fields(menu_item_id = %id))]
pub async fn show(
    OptionalAuth(viewer): OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<MenuItemId>,
) -> Result<Json<MenuItemResponse>> {
    let row = visible_menu(&state, id, viewer.as_ref()).await?;
    Ok(Json(MenuItemResponse::from(&row)))
}

/// `PATCH /api/menu-items/{id}`
#[instrument(skip_all, fields(menu_item_id = %id, user_id = %user.id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<MenuItemId>,
    Json(request): Json<MenuItemUpdate>,
) -> Result<Json<MenuItemResponse>> {
    let row = owned_menu(&state, id, &user).await?;
    let name = request
        .name
        .as_deref()
        .map(|n| validation::required_text("name", n, MAX_NAME_LENGTH))
        .transpose()
        .map_err(AppError::BadRequest)?;

    let menu = MenuItemRepository::new(state.pool())
        .update(id, name.as_deref(), request.active)
        .await?;
    Ok(Json(MenuItemResponse::new(&menu, row.food_count)))
}

/// `DELETE /api/menu-items/{id}`. 409 once one of its dishes was ordered.
#[instrument(skip_all, fields(menu_item_id = %id, user_id = %user.id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<MenuItemId>,
) -> Result<StatusCode> {
    owned_menu(&state, id, &user).await?;
    MenuItemRepository::new(state.pool()).delete(id).await?;
    tracing::info!("Menu deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/menu-items/{id}/foods`
#[instrument(skip_all, fields(menu_item_id = %id))]
pub async fn foods(
    OptionalAuth(viewer): OptionalAuth,
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<MenuItemId>,
    Query(page): Query<PageParams>,
) -> Result<Json<Paginated<FoodResponse>>> {
    visible_menu(&state, id, viewer.as_ref()).await?;
    let filter = FoodFilter {
        menu_item: Some(id),
        ..FoodFilter::default()
    };
    Ok(Json(
        food_page(&state, &uri, page, &filter, FoodOrdering::default()).await?,
    ))
}

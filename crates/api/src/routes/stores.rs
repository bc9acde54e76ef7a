//! Store directory and subscriptions.
//!
//! Only active, verified stores are listed; a store awaiting verification is
//! a 404 here.

use axum::extract::{OriginalUri, State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use foodloc_core::UserId;

use crate::db::{FoodFilter, SubscriptionRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::user::StoreWithCount;
use crate::pagination::{self, PageParams, Paginated};
use crate::permissions;
use crate::serializers::{
    FoodResponse, MenuItemResponse, StoreResponse, SubscriptionResponse, by_id,
};
use crate::state::AppState;

use super::foods::{FoodQuery, food_page};
use super::menu_items::store_menus;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreQuery {
    /// Substring of the store name or address.
    pub q: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SubscribeResponse {
    pub subscribed: bool,
}

async fn listed_store(state: &AppState, id: UserId) -> Result<StoreWithCount> {
    UserRepository::new(state.pool())
        .get_store(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found.".to_string()))
}

/// `GET /api/stores`
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(page): Query<PageParams>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<Paginated<StoreResponse>>> {
    let request = pagination::STORES.resolve(page)?;
    let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let users = UserRepository::new(state.pool());

    let count = users.count_stores(q).await?;
    let rows = users
        .list_stores(q, request.limit(), request.offset())
        .await?;
    let results = rows
        .iter()
        .map(|row| StoreResponse::new(row, state.media()))
        .collect();

    Ok(Json(request.respond(
        &state.config().base_url,
        &uri,
        count,
        results,
    )?))
}

/// `GET /api/stores/{id}`
#[instrument(skip_all, fields(store_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<StoreResponse>> {
    let store = listed_store(&state, id).await?;
    Ok(Json(StoreResponse::new(&store, state.media())))
}

/// `GET /api/stores/{id}/menu-items`
#[instrument(skip_all, fields(store_id = %id))]
pub async fn menu_items(
    OptionalAuth(viewer): OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<MenuItemResponse>>> {
    listed_store(&state, id).await?;
    Ok(Json(store_menus(&state, Some(id), viewer.as_ref()).await?))
}

/// `GET /api/stores/{id}/foods`. Accepts the `/api/foods` filters.
#[instrument(skip_all, fields(store_id = %id))]
pub async fn foods(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<UserId>,
    Query(page): Query<PageParams>,
    Query(query): Query<FoodQuery>,
) -> Result<Json<Paginated<FoodResponse>>> {
    listed_store(&state, id).await?;
    let (filter, ordering) = query.to_filter(&state)?;
    let filter = FoodFilter {
        store: Some(id),
        ..filter
    };
    Ok(Json(food_page(&state, &uri, page, &filter, ordering).await?))
}

/// `POST /api/stores/{id}/subscribe`. Toggles following the store.
#[instrument(skip_all, fields(store_id = %id, user_id = %user.id))]
pub async fn subscribe(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<SubscribeResponse>> {
    listed_store(&state, id).await?;
    if user.id == id {
        return Err(AppError::BadRequest(
            "a store cannot subscribe to itself".to_string(),
        ));
    }

    let subscribed = SubscriptionRepository::new(state.pool())
        .toggle(user.id, id)
        .await?;
    tracing::info!(subscribed, "Subscription toggled");
    Ok(Json(SubscribeResponse { subscribed }))
}

/// `GET /api/stores/{id}/subscribers`. Owner only.
#[instrument(skip_all, fields(store_id = %id, user_id = %user.id))]
pub async fn subscribers(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<SubscriptionResponse>>> {
    permissions::require_owner(&user, id)?;

    let subs = SubscriptionRepository::new(state.pool())
        .for_store(id)
        .await?;
    let mut ids: Vec<UserId> = subs.iter().map(|s| s.follower_id).collect();
    ids.push(id);
    ids.sort_unstable();
    ids.dedup();
    let users = by_id(UserRepository::new(state.pool()).get_many(&ids).await?);

    Ok(Json(
        subs.iter()
            .map(|s| SubscriptionResponse::new(s, &users, state.media()))
            .collect(),
    ))
}

/// `GET /api/subscriptions`. Stores the caller follows.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn my_subscriptions(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubscriptionResponse>>> {
    let subs = SubscriptionRepository::new(state.pool())
        .for_follower(user.id)
        .await?;
    let mut ids: Vec<UserId> = subs.iter().map(|s| s.store_id).collect();
    ids.push(user.id);
    ids.sort_unstable();
    ids.dedup();
    let users = by_id(UserRepository::new(state.pool()).get_many(&ids).await?);

    Ok(Json(
        subs.iter()
            .map(|s| SubscriptionResponse::new(s, &users, state.media()))
            .collect(),
    ))
}

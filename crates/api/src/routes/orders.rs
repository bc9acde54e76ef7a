//! Orders: placement by customers, status changes by the receiving store.

use axum::{
    extract::{OriginalUri, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use foodloc_core::{OrderId, OrderStatus, UserRole};

use crate::db::{OrderRepository, OrderScope};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAuth;
use crate::models::order::Order;
use crate::models::user::User;
use crate::pagination::{self, PageParams, Paginated};
use crate::permissions::PermissionDenied;
use crate::serializers::OrderResponse;
use crate::services::orders::{OrderService, PlaceOrder};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
}

/// Orders a user sees: the ones they placed, or for a store, the ones it
/// received.
const fn scope_for(user: &User) -> OrderScope {
    match user.user_role {
        UserRole::Store => OrderScope::Store(user.id),
        UserRole::User => OrderScope::Buyer(user.id),
    }
}

async fn with_details(state: &AppState, order: &Order) -> Result<OrderResponse> {
    let details = OrderRepository::new(state.pool())
        .details_for(&[order.id])
        .await?;
    OrderResponse::many(std::slice::from_ref(order), &details, state.media())
        .pop()
        .ok_or_else(|| AppError::Internal("order response missing".to_string()))
}

/// `GET /api/orders`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(page): Query<PageParams>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Paginated<OrderResponse>>> {
    let request = pagination::DEFAULT.resolve(page)?;
    let scope = scope_for(&user);
    let orders = OrderRepository::new(state.pool());

    let count = orders.count(scope, query.status).await?;
    let rows = orders
        .list(scope, query.status, request.limit(), request.offset())
        .await?;
    let ids: Vec<OrderId> = rows.iter().map(|o| o.id).collect();
    let details = orders.details_for(&ids).await?;
    let results = OrderResponse::many(&rows, &details, state.media());

    Ok(Json(request.respond(
        &state.config().base_url,
        &uri,
        count,
        results,
    )?))
}

/// `POST /api/orders`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let (order, _) = OrderService::new(state.pool())
        .place_order(&user, &request, state.local_time())
        .await?;
    Ok((StatusCode::CREATED, Json(with_details(&state, &order).await?)))
}

/// `GET /api/orders/{id}`. The buyer and the receiving store only.
#[instrument(skip_all, fields(order_id = %id, user_id = %user.id))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found.".to_string()))?;
    if !order.involves(user.id) {
        return Err(PermissionDenied("you are not part of this order").into());
    }
    Ok(Json(with_details(&state, &order).await?))
}

/// `POST /api/orders/{id}/accept`
#[instrument(skip_all, fields(order_id = %id, user_id = %user.id))]
pub async fn accept(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = OrderService::new(state.pool()).accept(&user, id).await?;
    Ok(Json(with_details(&state, &order).await?))
}

/// `POST /api/orders/{id}/complete`
#[instrument(skip_all, fields(order_id = %id, user_id = %user.id))]
pub async fn complete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = OrderService::new(state.pool()).complete(&user, id).await?;
    Ok(Json(with_details(&state, &order).await?))
}

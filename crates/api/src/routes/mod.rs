//! HTTP routes for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Readiness (database round-trip)
//!
//! # Auth (rate limited)
//! POST   /api/auth/login                  - Start a session
//! POST   /api/auth/logout                 - End the session
//! POST   /api/users                       - Register a customer or store
//!
//! # Users
//! GET    /api/users/current-user          - Own profile
//! PATCH  /api/users/current-user          - Update own profile
//!
//! # Stores
//! GET    /api/stores                      - Verified stores, 5 per page
//! GET    /api/stores/{id}                 - One store
//! GET    /api/stores/{id}/menu-items      - Its menus
//! GET    /api/stores/{id}/foods           - Its dishes
//! POST   /api/stores/{id}/subscribe       - Toggle following
//! GET    /api/stores/{id}/subscribers     - Followers (owner)
//! GET    /api/subscriptions               - Stores the caller follows
//!
//! # Menus
//! GET    /api/menu-items                  - Active menus, `?store=`
//! POST   /api/menu-items                  - Create (verified store)
//! GET    /api/menu-items/{id}             - One menu
//! PATCH  /api/menu-items/{id}             - Update (owner)
//! DELETE /api/menu-items/{id}             - Delete (owner)
//! GET    /api/menu-items/{id}/foods       - Its dishes
//!
//! # Dishes
//! GET    /api/foods                       - Catalog with filters
//! POST   /api/foods                       - Create (menu owner)
//! GET    /api/foods/{id}                  - Detail
//! PATCH  /api/foods/{id}                  - Update (owner)
//! DELETE /api/foods/{id}                  - Delete (owner)
//! GET    /api/foods/{id}/comments         - Comments
//! POST   /api/foods/{id}/comments         - Comment
//! POST   /api/foods/{id}/like             - Toggle like
//! POST   /api/foods/{id}/rating           - Rate 1-5
//! POST   /api/foods/{id}/tags             - Attach tags by name (owner)
//! PATCH  /api/comments/{id}               - Edit own comment
//! DELETE /api/comments/{id}               - Delete own comment
//!
//! # Reference data
//! GET    /api/tags                        - All tags
//! POST   /api/tags                        - Create (verified store or staff)
//! GET    /api/payment-methods             - Active payment methods
//!
//! # Orders
//! GET    /api/orders                      - Placed (customer) or received (store)
//! POST   /api/orders                      - Place (customer)
//! GET    /api/orders/{id}                 - One order (buyer or store)
//! POST   /api/orders/{id}/accept          - PENDING -> ACCEPTED (store)
//! POST   /api/orders/{id}/complete        - ACCEPTED -> SUCCESSED (store)
//!
//! # Statistics (verified store)
//! GET    /api/stats/revenue               - Revenue per month/quarter/year
//! GET    /api/stats/foods                 - Revenue per dish
//! ```

pub mod auth;
pub mod catalog;
pub mod comments;
pub mod foods;
pub mod health;
pub mod menu_items;
pub mod orders;
pub mod stats;
pub mod stores;
pub mod users;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{auth_rate_limiter, create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Login and registration, behind the auth rate limiter.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/users", post(users::register))
        .layer(auth_rate_limiter())
}

fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route("/{id}", get(stores::show))
        .route("/{id}/menu-items", get(stores::menu_items))
        .route("/{id}/foods", get(stores::foods))
        .route("/{id}/subscribe", post(stores::subscribe))
        .route("/{id}/subscribers", get(stores::subscribers))
}

fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(menu_items::index).post(menu_items::create))
        .route(
            "/{id}",
            get(menu_items::show)
                .patch(menu_items::update)
                .delete(menu_items::delete),
        )
        .route("/{id}/foods", get(menu_items::foods))
}

fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(foods::index).post(foods::create))
        .route(
            "/{id}",
            get(foods::show).patch(foods::update).delete(foods::delete),
        )
        .route(
            "/{id}/comments",
            get(foods::comments).post(foods::add_comment),
        )
        .route("/{id}/like", post(foods::like))
        .route("/{id}/rating", post(foods::rate))
        .route("/{id}/tags", post(foods::add_tags))
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/accept", post(orders::accept))
        .route("/{id}/complete", post(orders::complete))
}

/// All API routes, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(auth_routes())
        .route("/api/auth/logout", post(auth::logout))
        .route(
            "/api/users/current-user",
            get(users::current_user).patch(users::update_current_user),
        )
        .nest("/api/stores", store_routes())
        .route("/api/subscriptions", get(stores::my_subscriptions))
        .nest("/api/menu-items", menu_routes())
        .nest("/api/foods", food_routes())
        .route(
            "/api/comments/{id}",
            patch(comments::update).delete(comments::delete),
        )
        .route("/api/tags", get(catalog::tags).post(catalog::create_tag))
        .route("/api/payment-methods", get(catalog::payment_methods))
        .nest("/api/orders", order_routes())
        .route("/api/stats/revenue", get(stats::revenue))
        .route("/api/stats/foods", get(stats::foods))
}

/// The complete application: routes plus sessions, tracing, request ids and
/// Sentry.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());

    routes()
        .layer(session_layer)
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness
//! GET  /health/ready            - Readiness (database reachable)
//!
//! GET  /login                   - Login page
//! POST /login                   - Username/password login (staff only)
//! POST /logout                  - Logout
//!
//! GET  /                        - Dashboard
//! GET  /users?q=&page=          - Account search
//! POST /users/{id}/active       - Toggle is_active
//! POST /users/{id}/verify       - Verify a store
//! GET  /foods?q=&page=          - Dish search
//! POST /foods/{id}/active       - Toggle active
//! GET  /orders?status=&page=    - Latest orders
//! GET  /tags                    - Tags
//! POST /tags                    - Create a tag
//! GET  /payment-methods         - Payment methods
//! POST /payment-methods         - Create or update a payment method
//! ```

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod foods;
pub mod health;
pub mod orders;
pub mod users;

use askama::Template;
use axum::{
    Router,
    middleware as axum_middleware,
    response::Html,
    routing::{get, post},
};
use foodloc_api::middleware::{auth_rate_limiter, request_id_middleware};
use foodloc_api::models::user::User;
use serde::Deserialize;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Rows per page on list screens.
pub const PAGE_SIZE: u32 = 50;

/// Page chrome shared by every screen behind the login.
#[derive(Debug, Clone)]
pub struct Layout {
    pub staff_name: String,
    pub current_path: &'static str,
    pub flash: Option<String>,
}

impl Layout {
    #[must_use]
    pub fn new(staff: &User, current_path: &'static str, flash: Option<String>) -> Self {
        Self {
            staff_name: staff.username.clone(),
            current_path,
            flash,
        }
    }
}

/// `q` and `page` parameters of list screens.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub page: Option<u32>,
}

impl ListParams {
    /// Trimmed search text, `None` when blank.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Previous/next links of a list screen.
#[derive(Debug, Clone, Default)]
pub struct Pager {
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl Pager {
    /// Build links for `page`, keeping `filters` in the query string.
    ///
    /// `has_next` comes from fetching one row more than [`PAGE_SIZE`].
    #[must_use]
    pub fn new(path: &str, filters: &[(&str, &str)], page: u32, has_next: bool) -> Self {
        let link = |page: u32| {
            let mut query = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in filters.iter().filter(|(_, v)| !v.is_empty()) {
                query.append_pair(key, value);
            }
            query.append_pair("page", &page.to_string());
            format!("{path}?{}", query.finish())
        };
        Self {
            previous: (page > 1).then(|| link(page - 1)),
            next: has_next.then(|| link(page + 1)),
        }
    }
}

/// `LIMIT`/`OFFSET` for a list page, fetching one extra row to detect a next page.
#[must_use]
pub fn page_window(page: u32) -> (i64, i64) {
    let size = i64::from(PAGE_SIZE);
    (size + 1, i64::from(page - 1) * size)
}

/// Drop the look-ahead row; returns whether there was one.
pub fn split_look_ahead<T>(rows: &mut Vec<T>) -> bool {
    let has_next = rows.len() > PAGE_SIZE as usize;
    rows.truncate(PAGE_SIZE as usize);
    has_next
}

/// Render a template, logging failures.
pub fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {e}");
        "Internal Server Error".to_string()
    }))
}

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/login", get(auth::login_page))
        .route("/login", post(auth::login).layer(auth_rate_limiter()))
        .route("/logout", post(auth::logout))
        .route("/", get(dashboard::index))
        .route("/users", get(users::index))
        .route("/users/{id}/active", post(users::toggle_active))
        .route("/users/{id}/verify", post(users::verify))
        .route("/foods", get(foods::index))
        .route("/foods/{id}/active", post(foods::toggle_active))
        .route("/orders", get(orders::index))
        .route("/tags", get(catalog::tags).post(catalog::create_tag))
        .route(
            "/payment-methods",
            get(catalog::payment_methods).post(catalog::save_payment_method),
        )
}

/// Full application with session, request id, tracing and Sentry layers.
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
                        staff_id = tracing::field::Empty,
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use tower::ServiceExt;

    use super::*;
    use crate::config::AdminConfig;

    const TEST_DATABASE_URL: &str = "postgres://localhost/foodloc_test";

    /// Router over a pool that never connects unless a query runs.
    fn test_app() -> Router {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy(TEST_DATABASE_URL)
            .unwrap();
        let config = AdminConfig::with_defaults(SecretString::from(TEST_DATABASE_URL));
        app(AppState::new(config, pool))
    }

    async fn get(uri: &str) -> axum::response::Response {
        test_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_protected_pages_redirect_to_login() {
        for uri in ["/", "/users", "/foods?q=pho", "/orders", "/tags", "/payment-methods"] {
            let response = get(uri).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(response.headers()[header::LOCATION], "/login", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = get("/login").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains(r#"action="/login""#));
        assert!(html.contains("FoodLocation admin"));
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(get("/health").await.status(), StatusCode::OK);
    }

    #[test]
    fn test_list_params() {
        let params = ListParams {
            q: Some("  ".to_string()),
            page: Some(0),
        };
        assert_eq!(params.search(), None);
        assert_eq!(params.page(), 1);
    }

    #[test]
    fn test_pager_keeps_filters() {
        let pager = Pager::new("/users", &[("q", "bún bò")], 2, true);
        assert_eq!(pager.previous.as_deref(), Some("/users?q=b%C3%BAn+b%C3%B2&page=1"));
        assert_eq!(pager.next.as_deref(), Some("/users?q=b%C3%BAn+b%C3%B2&page=3"));

        let pager = Pager::new("/orders", &[("status", "")], 1, false);
        assert!(pager.previous.is_none());
        assert!(pager.next.is_none());
    }

    #[test]
    fn test_page_window_and_look_ahead() {
        assert_eq!(page_window(1), (51, 0));
        assert_eq!(page_window(3), (51, 100));

        let mut rows: Vec<u32> = (0..51).collect();
        assert!(split_look_ahead(&mut rows));
        assert_eq!(rows.len(), 50);

        let mut rows: Vec<u32> = (0..10).collect();
        assert!(!split_look_ahead(&mut rows));
        assert_eq!(rows.len(), 10);
    }
}

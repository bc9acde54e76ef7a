//! Integration tests for FoodLocation.
//!
//! Requests go through the complete API router (sessions, request ids,
//! rate limiting, error mapping) in-process, without binding a socket.
//!
//! # Running Tests
//!
//! ```bash
//! # HTTP contract tests (no database needed)
//! cargo test -p foodloc-integration-tests
//!
//! # Database-backed scenarios
//! export FOODLOC_TEST_DATABASE_URL=postgres://localhost/foodloc_test
//! cargo test -p foodloc-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `api_http` - routing, authentication and error shapes
//! - `order_lifecycle` - registration through a completed order (database)
//! - `catalog` - dish editing, visibility and interactions (database)

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use foodloc_api::config::ApiConfig;
use foodloc_api::db::{PaymentMethodRepository, UserRepository};
use foodloc_api::middleware::SESSION_COOKIE_NAME;
use foodloc_api::routes::app;
use foodloc_api::state::AppState;
use foodloc_core::UserId;
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

/// Database used by the ignored, database-backed tests.
pub const TEST_DATABASE_URL_VAR: &str = "FOODLOC_TEST_DATABASE_URL";

/// Never dialled: the lazy pool only connects when a query runs.
const UNREACHABLE_DATABASE_URL: &str = "postgres://localhost:1/foodloc_unreachable";

/// The API application under test.
pub struct TestApp {
    router: Router,
    pool: PgPool,
}

impl TestApp {
    /// Application over a pool that never connects.
    ///
    /// Fine for anything answered before a query runs: health, anonymous
    /// access to protected routes, request validation.
    #[must_use]
    pub fn without_database() -> Self {
        let pool = PgPoolOptions::new()
            .connect_lazy(UNREACHABLE_DATABASE_URL)
            .expect("lazy pool");
        Self::new(UNREACHABLE_DATABASE_URL, pool)
    }

    /// Application over the test database, migrated to the latest schema.
    ///
    /// # Panics
    ///
    /// Panics if `FOODLOC_TEST_DATABASE_URL` is unset or the database is
    /// unreachable.
    pub async fn with_database() -> Self {
        let url = std::env::var(TEST_DATABASE_URL_VAR)
            .unwrap_or_else(|_| panic!("{TEST_DATABASE_URL_VAR} must be set"));
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("connect to test database");
        sqlx::migrate!("../api/migrations")
            .run(&pool)
            .await
            .expect("run migrations");
        Self::new(&url, pool)
    }

    fn new(url: &str, pool: PgPool) -> Self {
        let config = ApiConfig::with_defaults(SecretString::from(url));
        Self {
            router: app(AppState::new(config, pool.clone())),
            pool,
        }
    }

    /// Pool for seeding state the API offers no endpoint for.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Send a request as `client`, remembering any session cookie it gets.
    pub async fn send(
        &self,
        client: &mut Client,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", &client.ip);
        if let Some(cookie) = &client.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("valid request");

        let response = self.router.clone().oneshot(request).await.expect("infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        client.remember_cookie(&headers);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, client: &mut Client, uri: &str) -> TestResponse {
        self.send(client, Method::GET, uri, None).await
    }

    pub async fn post(&self, client: &mut Client, uri: &str, body: Value) -> TestResponse {
        self.send(client, Method::POST, uri, Some(body)).await
    }
}

/// One caller: a client address for the rate limiter and a cookie jar of one.
#[derive(Debug, Clone)]
pub struct Client {
    ip: String,
    cookie: Option<String>,
}

impl Client {
    /// Anonymous caller at `ip`.
    #[must_use]
    pub fn new(ip: &str) -> Self {
        Self {
            ip: ip.to_string(),
            cookie: None,
        }
    }

    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    fn remember_cookie(&mut self, headers: &HeaderMap) {
        let prefix = format!("{SESSION_COOKIE_NAME}=");
        for value in headers.get_all(header::SET_COOKIE) {
            let Some(pair) = value
                .to_str()
                .ok()
                .and_then(|v| v.split(';').next())
                .filter(|pair| pair.starts_with(&prefix))
            else {
                continue;
            };
            // Removal cookies carry an empty value
            self.cookie = (pair.len() > prefix.len()).then(|| pair.to_string());
        }
    }
}

/// Status, headers and the JSON body (or the raw text when not JSON).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `detail` message of an error body.
    #[must_use]
    pub fn detail(&self) -> &str {
        self.body["detail"].as_str().unwrap_or_default()
    }

    /// Numeric `id` field of the body.
    #[must_use]
    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .and_then(|id| i32::try_from(id).ok())
            .unwrap_or_else(|| panic!("no id in {}", self.body))
    }
}

/// Short random suffix for usernames and names that must be unique per run.
#[must_use]
pub fn unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..10].to_string()
}

/// Password of every account the scenarios register.
pub const PASSWORD: &str = "pho-bo-tai-nam";

/// Register an account and log in as it.
pub async fn signed_up(app: &TestApp, ip: &str, body: Value) -> (Client, i32) {
    let mut client = Client::new(ip);
    let username = body["username"].as_str().unwrap().to_string();

    let response = app.post(&mut client, "/api/users", body).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    let id = response.id();

    let response = app
        .post(
            &mut client,
            "/api/auth/login",
            json!({ "username": username, "password": PASSWORD }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert!(client.has_session());
    (client, id)
}

/// A logged-in store with an active menu.
pub struct SeededStore {
    pub client: Client,
    pub id: i32,
    pub menu: i32,
}

/// A verified store with one empty menu.
pub async fn store_with_menu(app: &TestApp, ip: &str) -> SeededStore {
    let suffix = unique_suffix();
    let (mut client, id) = signed_up(
        app,
        ip,
        json!({
            "username": format!("store_{suffix}"),
            "password": PASSWORD,
            "user_role": "STORE",
            "name_store": format!("Phở Gánh {suffix}"),
            "address": "12 Hàng Bạc, Hà Nội",
        }),
    )
    .await;

    // Menus need a verified store; verification is a staff action
    UserRepository::new(app.pool())
        .set_verified(UserId::new(id), true)
        .await
        .unwrap();

    let menu = app
        .post(&mut client, "/api/menu-items", json!({ "name": "Phở" }))
        .await;
    assert_eq!(menu.status, StatusCode::CREATED, "{}", menu.body);
    SeededStore {
        client,
        id,
        menu: menu.id(),
    }
}

/// A verified store with one menu and one dish at 45 000.
pub async fn store_with_dish(app: &TestApp, ip: &str) -> (SeededStore, i32) {
    let mut store = store_with_menu(app, ip).await;
    let food = app
        .post(
            &mut store.client,
            "/api/foods",
            json!({
                "name": "Phở bò tái",
                "price": "45000",
                "menu_item_id": store.menu,
            }),
        )
        .await;
    assert_eq!(food.status, StatusCode::CREATED, "{}", food.body);
    (store, food.id())
}

/// A logged-in customer.
pub async fn customer(app: &TestApp, ip: &str) -> Client {
    let (client, _) = signed_up(
        app,
        ip,
        json!({
            "username": format!("user_{}", unique_suffix()),
            "password": PASSWORD,
            "first_name": "Lan",
        }),
    )
    .await;
    client
}

/// Id of an active cash payment method.
pub async fn cash_on_delivery(app: &TestApp) -> i32 {
    PaymentMethodRepository::new(app.pool())
        .upsert("Cash on delivery", true)
        .await
        .unwrap()
        .id
        .as_i32()
}

/// Order body for `lines` of `(food, quantity)`.
#[must_use]
pub fn order_body(store_id: i32, payment_method: i32, lines: &[(i32, i32)]) -> Value {
    json!({
        "store": store_id,
        "paymentmethod": payment_method,
        "delivery_fee": "15000",
        "receiver_name": "Nguyễn Thị Lan",
        "receiver_phone": "090 123 4567",
        "receiver_address": "5 Lý Thái Tổ, Hà Nội",
        "order_details": lines
            .iter()
            .map(|(food, quantity)| json!({ "food": food, "quantity": quantity }))
            .collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn set_cookie(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.append(header::SET_COOKIE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_client_keeps_session_cookie() {
        let mut client = Client::new("10.0.0.1");
        client.remember_cookie(&set_cookie(
            "foodloc_session=abc123; HttpOnly; SameSite=Lax; Path=/",
        ));
        assert_eq!(client.cookie.as_deref(), Some("foodloc_session=abc123"));

        client.remember_cookie(&set_cookie("other=1; Path=/"));
        assert!(client.has_session());

        client.remember_cookie(&set_cookie("foodloc_session=; Max-Age=0; Path=/"));
        assert!(!client.has_session());
    }

    #[test]
    fn test_unique_suffix() {
        let a = unique_suffix();
        assert_eq!(a.len(), 10);
        assert_ne!(a, unique_suffix());
    }
}

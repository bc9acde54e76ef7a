//! HTTP contract of the API router.
//!
//! None of these requests reach the database, so they run everywhere.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use foodloc_integration_tests::{Client, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_health_is_ok() {
    let app = TestApp::without_database();
    let response = app.get(&mut Client::new("10.1.0.1"), "/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_every_response_has_a_request_id() {
    let app = TestApp::without_database();
    let response = app.get(&mut Client::new("10.1.0.2"), "/health").await;
    assert!(response.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_protected_endpoints_require_a_session() {
    let app = TestApp::without_database();
    let mut client = Client::new("10.1.0.3");

    let protected = [
        (Method::GET, "/api/users/current-user"),
        (Method::PATCH, "/api/users/current-user"),
        (Method::GET, "/api/orders"),
        (Method::POST, "/api/orders"),
        (Method::GET, "/api/orders/1"),
        (Method::POST, "/api/orders/1/accept"),
        (Method::POST, "/api/orders/1/complete"),
        (Method::POST, "/api/menu-items"),
        (Method::POST, "/api/foods"),
        (Method::POST, "/api/foods/1/like"),
        (Method::POST, "/api/foods/1/rating"),
        (Method::POST, "/api/stores/1/subscribe"),
        (Method::GET, "/api/subscriptions"),
        (Method::GET, "/api/stats/revenue"),
        (Method::GET, "/api/stats/foods"),
    ];

    for (method, uri) in protected {
        let response = app
            .send(&mut client, method.clone(), uri, Some(json!({})))
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(
            response.detail(),
            "Authentication credentials were not provided.",
            "{method} {uri}"
        );
    }
}

#[tokio::test]
async fn test_invalid_food_filters_are_rejected() {
    let app = TestApp::without_database();
    let mut client = Client::new("10.1.0.4");

    let response = app.get(&mut client, "/api/foods?ordering=rating").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.detail(), "unknown ordering `rating`");

    let response = app
        .get(&mut client, "/api/foods?min_price=50000&max_price=10000")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.detail(), "min_price must not exceed max_price");

    let response = app.get(&mut client, "/api/foods?min_price=cheap").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(!response.detail().is_empty());
}

#[tokio::test]
async fn test_malformed_login_body_is_400() {
    let app = TestApp::without_database();
    let response = app
        .post(
            &mut Client::new("10.1.0.5"),
            "/api/auth/login",
            json!({ "username": "pho" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(!response.detail().is_empty());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::without_database();
    let response = app.get(&mut Client::new("10.1.0.6"), "/api/dishes").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_auth_endpoints_are_rate_limited_per_client() {
    let app = TestApp::without_database();
    let mut noisy = Client::new("10.1.0.7");

    // Burst of five, then throttled
    for _ in 0..5 {
        let response = app.post(&mut noisy, "/api/auth/login", json!({})).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }
    let response = app.post(&mut noisy, "/api/users", json!({})).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);

    let response = app
        .post(&mut Client::new("10.1.0.8"), "/api/auth/login", json!({}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

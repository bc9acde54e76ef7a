//! Registration through a completed order, against a real database.
//!
//! Run with `FOODLOC_TEST_DATABASE_URL` set and `--ignored`.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use foodloc_integration_tests::{
    TestApp, TestResponse, cash_on_delivery, customer, order_body, store_with_dish,
};
use serde_json::json;

fn order_count(response: &TestResponse) -> i64 {
    response.body["count"].as_i64().unwrap()
}

#[tokio::test]
#[ignore = "requires FOODLOC_TEST_DATABASE_URL"]
async fn test_order_goes_from_pending_to_successed() {
    let app = TestApp::with_database().await;
    let (seeded, food_id) = store_with_dish(&app, "10.2.0.1").await;
    let (mut store, store_id) = (seeded.client, seeded.id);
    let mut buyer = customer(&app, "10.2.0.2").await;
    let payment_method = cash_on_delivery(&app).await;

    let placed = app
        .post(
            &mut buyer,
            "/api/orders",
            order_body(store_id, payment_method, &[(food_id, 2)]),
        )
        .await;
    assert_eq!(placed.status, StatusCode::CREATED, "{}", placed.body);
    assert_eq!(placed.body["order_status"], "PENDING");
    assert_eq!(placed.body["amount"], "90000");
    assert_eq!(placed.body["delivery_fee"], "15000");
    assert_eq!(placed.body["receiver_phone"], "0901234567");
    assert_eq!(placed.body["payment_status"], false);
    assert_eq!(placed.body["order_details"][0]["unit_price"], "45000");
    let order = placed.id();

    // Only the receiving store moves the order along
    let response = app
        .post(&mut buyer, &format!("/api/orders/{order}/accept"), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Completing a pending order skips a step
    let response = app
        .post(&mut store, &format!("/api/orders/{order}/complete"), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let accepted = app
        .post(&mut store, &format!("/api/orders/{order}/accept"), json!({}))
        .await;
    assert_eq!(accepted.status, StatusCode::OK, "{}", accepted.body);
    assert_eq!(accepted.body["order_status"], "ACCEPTED");

    let completed = app
        .post(&mut store, &format!("/api/orders/{order}/complete"), json!({}))
        .await;
    assert_eq!(completed.status, StatusCode::OK, "{}", completed.body);
    assert_eq!(completed.body["order_status"], "SUCCESSED");
    assert_eq!(completed.body["payment_status"], true);
    assert!(completed.body["payment_date"].is_string());

    let response = app
        .post(&mut store, &format!("/api/orders/{order}/accept"), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // Both sides see it
    let mine = app.get(&mut buyer, "/api/orders?status=SUCCESSED").await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(order_count(&mine), 1);
    let received = app.get(&mut store, "/api/orders").await;
    assert_eq!(order_count(&received), 1);

    let stats = app.get(&mut store, "/api/stats/foods").await;
    assert_eq!(stats.status, StatusCode::OK, "{}", stats.body);
    assert_eq!(stats.body[0]["food_id"], food_id);
    assert_eq!(stats.body[0]["quantity"], 2);
}

#[tokio::test]
#[ignore = "requires FOODLOC_TEST_DATABASE_URL"]
async fn test_rejected_order_leaves_nothing_behind() {
    let app = TestApp::with_database().await;
    let (store, food_id) = store_with_dish(&app, "10.3.0.1").await;
    let store_id = store.id;
    let (_, other_food) = store_with_dish(&app, "10.3.0.2").await;
    let mut buyer = customer(&app, "10.3.0.3").await;
    let payment_method = cash_on_delivery(&app).await;

    // Second line belongs to another store
    let response = app
        .post(
            &mut buyer,
            "/api/orders",
            order_body(store_id, payment_method, &[(food_id, 1), (other_food, 1)]),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(!response.detail().is_empty());

    let response = app
        .post(
            &mut buyer,
            "/api/orders",
            order_body(store_id, payment_method, &[(food_id, 1), (food_id, 3)]),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let mine = app.get(&mut buyer, "/api/orders").await;
    assert_eq!(order_count(&mine), 0);
}

#[tokio::test]
#[ignore = "requires FOODLOC_TEST_DATABASE_URL"]
async fn test_stores_cannot_order() {
    let app = TestApp::with_database().await;
    let (mut store, food_id) = store_with_dish(&app, "10.4.0.1").await;
    let payment_method = cash_on_delivery(&app).await;

    let response = app
        .post(
            &mut store.client,
            "/api/orders",
            order_body(store.id, payment_method, &[(food_id, 1)]),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires FOODLOC_TEST_DATABASE_URL"]
async fn test_logout_ends_the_session() {
    let app = TestApp::with_database().await;
    let mut buyer = customer(&app, "10.5.0.1").await;

    let me = app.get(&mut buyer, "/api/users/current-user").await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user_role"], "USER");
    assert_eq!(me.body["first_name"], "Lan");

    let response = app.post(&mut buyer, "/api/auth/logout", json!({})).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let me = app.get(&mut buyer, "/api/users/current-user").await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires FOODLOC_TEST_DATABASE_URL"]
async fn test_concurrent_accepts_let_exactly_one_through() {
    let app = TestApp::with_database().await;
    let (store, food_id) = store_with_dish(&app, "10.6.0.1").await;
    let mut buyer = customer(&app, "10.6.0.2").await;
    let payment_method = cash_on_delivery(&app).await;

    let placed = app
        .post(
            &mut buyer,
            "/api/orders",
            order_body(store.id, payment_method, &[(food_id, 1)]),
        )
        .await;
    assert_eq!(placed.status, StatusCode::CREATED, "{}", placed.body);
    let uri = format!("/api/orders/{}/accept", placed.id());

    let (mut first, mut second) = (store.client.clone(), store.client.clone());
    let (a, b) = tokio::join!(
        app.post(&mut first, &uri, json!({})),
        app.post(&mut second, &uri, json!({})),
    );

    let mut statuses = [a.status, b.status];
    statuses.sort_unstable();
    assert_eq!(statuses[0], StatusCode::OK, "{} / {}", a.body, b.body);
    // The loser either lost the race on the write (409) or read the
    // already accepted order (400)
    assert!(
        matches!(statuses[1], StatusCode::CONFLICT | StatusCode::BAD_REQUEST),
        "{} / {}",
        a.body,
        b.body
    );

    let mut store_client = store.client;
    let order = app
        .get(&mut store_client, &format!("/api/orders/{}", placed.id()))
        .await;
    assert_eq!(order.body["order_status"], "ACCEPTED");
}

#[tokio::test]
#[ignore = "requires FOODLOC_TEST_DATABASE_URL"]
async fn test_ordered_dish_and_its_menu_cannot_be_deleted() {
    let app = TestApp::with_database().await;
    let (mut store, food_id) = store_with_dish(&app, "10.7.0.1").await;
    let mut buyer = customer(&app, "10.7.0.2").await;
    let payment_method = cash_on_delivery(&app).await;

    let placed = app
        .post(
            &mut buyer,
            "/api/orders",
            order_body(store.id, payment_method, &[(food_id, 1)]),
        )
        .await;
    assert_eq!(placed.status, StatusCode::CREATED, "{}", placed.body);

    let response = app
        .send(
            &mut store.client,
            Method::DELETE,
            &format!("/api/foods/{food_id}"),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT, "{}", response.body);
    assert_eq!(response.detail(), "food is referenced by other records");

    let response = app
        .send(
            &mut store.client,
            Method::DELETE,
            &format!("/api/menu-items/{}", store.menu),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT, "{}", response.body);
    assert_eq!(response.detail(), "menu item is referenced by other records");

    // Both survive, and so does the order
    let dish = app.get(&mut buyer, &format!("/api/foods/{food_id}")).await;
    assert_eq!(dish.status, StatusCode::OK);
    let mine = app.get(&mut buyer, "/api/orders").await;
    assert_eq!(order_count(&mine), 1);
}

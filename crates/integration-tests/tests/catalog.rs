//! Dish editing, visibility and customer interactions, against a real
//! database.
//!
//! Run with `FOODLOC_TEST_DATABASE_URL` set and `--ignored`.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use foodloc_api::db::UserRepository;
use foodloc_core::UserId;
use foodloc_integration_tests::{
    Client, PASSWORD, TestApp, customer, signed_up, store_with_dish, store_with_menu,
    unique_suffix,
};
use serde_json::json;

#[tokio::test]
#[ignore = "requires FOODLOC_TEST_DATABASE_URL"]
async fn test_patch_null_clears_optional_dish_fields() {
    let app = TestApp::with_database().await;
    let mut store = store_with_menu(&app, "10.8.0.1").await;

    let created = app
        .post(
            &mut store.client,
            "/api/foods",
            json!({
                "name": "Bánh cuốn",
                "price": "30000",
                "menu_item_id": store.menu,
                "start_time": "06:00:00",
                "end_time": "10:00:00",
                "description": "Chả lụa",
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.body["start_time"], "06:00:00");
    let uri = format!("/api/foods/{}", created.id());

    let updated = app
        .send(
            &mut store.client,
            Method::PATCH,
            &uri,
            Some(json!({ "start_time": null, "end_time": null, "description": null })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert!(updated.body["start_time"].is_null());
    assert!(updated.body["end_time"].is_null());
    assert!(updated.body["description"].is_null());
    assert_eq!(updated.body["name"], "Bánh cuốn");

    // Leaving a key out keeps the stored value
    let updated = app
        .send(
            &mut store.client,
            Method::PATCH,
            &uri,
            Some(json!({ "description": "Chả quế" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    let updated = app
        .send(&mut store.client, Method::PATCH, &uri, Some(json!({ "price": "32000" })))
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.body["description"], "Chả quế");
    assert_eq!(updated.body["price"], "32000");
}

#[tokio::test]
#[ignore = "requires FOODLOC_TEST_DATABASE_URL"]
async fn test_dish_with_unknown_tag_is_not_created() {
    let app = TestApp::with_database().await;
    let mut store = store_with_menu(&app, "10.9.0.1").await;

    let response = app
        .post(
            &mut store.client,
            "/api/foods",
            json!({
                "name": "Bún chả",
                "price": "40000",
                "menu_item_id": store.menu,
                "tags": [i32::MAX],
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", response.body);
    assert_eq!(response.detail(), "tag does not exist");

    let menu_foods = app
        .get(
            &mut store.client,
            &format!("/api/menu-items/{}/foods", store.menu),
        )
        .await;
    assert_eq!(menu_foods.status, StatusCode::OK, "{}", menu_foods.body);
    assert_eq!(menu_foods.body["count"], 0);
}

#[tokio::test]
#[ignore = "requires FOODLOC_TEST_DATABASE_URL"]
async fn test_like_toggles_and_rating_is_replaced() {
    let app = TestApp::with_database().await;
    let (_, food_id) = store_with_dish(&app, "10.10.0.1").await;
    let mut buyer = customer(&app, "10.10.0.2").await;
    let uri = format!("/api/foods/{food_id}");

    let liked = app
        .post(&mut buyer, &format!("{uri}/like"), json!({}))
        .await;
    assert_eq!(liked.status, StatusCode::OK, "{}", liked.body);
    assert_eq!(liked.body["liked"], true);
    let detail = app.get(&mut buyer, &uri).await;
    assert_eq!(detail.body["like_count"], 1);
    assert_eq!(detail.body["liked"], true);

    let unliked = app
        .post(&mut buyer, &format!("{uri}/like"), json!({}))
        .await;
    assert_eq!(unliked.body["liked"], false);
    let detail = app.get(&mut buyer, &uri).await;
    assert_eq!(detail.body["like_count"], 0);
    assert_eq!(detail.body["liked"], false);

    for rate in [2, 5] {
        let rated = app
            .post(&mut buyer, &format!("{uri}/rating"), json!({ "rate": rate }))
            .await;
        assert_eq!(rated.status, StatusCode::OK, "{}", rated.body);
        assert_eq!(rated.body["rate"], rate);
    }
    let detail = app.get(&mut buyer, &uri).await;
    assert_eq!(detail.body["rating_count"], 1);
    assert_eq!(detail.body["rate"], 5);
    assert_eq!(detail.body["rating_avg"], 5.0);

    let response = app
        .post(&mut buyer, &format!("{uri}/rating"), json!({ "rate": 6 }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // Anonymous callers see the totals only
    let detail = app.get(&mut Client::new("10.10.0.3"), &uri).await;
    assert_eq!(detail.body["rating_count"], 1);
    assert!(detail.body.get("liked").is_none());
}

#[tokio::test]
#[ignore = "requires FOODLOC_TEST_DATABASE_URL"]
async fn test_unverified_store_hides_its_dishes() {
    let app = TestApp::with_database().await;
    let (mut store, food_id) = store_with_dish(&app, "10.11.0.1").await;
    let mut buyer = customer(&app, "10.11.0.2").await;
    let mut anonymous = Client::new("10.11.0.3");
    let uri = format!("/api/foods/{food_id}");

    assert_eq!(app.get(&mut anonymous, &uri).await.status, StatusCode::OK);

    UserRepository::new(app.pool())
        .set_verified(UserId::new(store.id), false)
        .await
        .unwrap();

    assert_eq!(app.get(&mut anonymous, &uri).await.status, StatusCode::NOT_FOUND);
    let response = app
        .get(&mut anonymous, &format!("{uri}/comments"))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let response = app
        .post(&mut buyer, &format!("{uri}/like"), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let response = app
        .post(&mut buyer, &format!("{uri}/rating"), json!({ "rate": 4 }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    // The owner still manages it
    assert_eq!(app.get(&mut store.client, &uri).await.status, StatusCode::OK);

    UserRepository::new(app.pool())
        .set_verified(UserId::new(store.id), true)
        .await
        .unwrap();
    UserRepository::new(app.pool())
        .set_active(UserId::new(store.id), false)
        .await
        .unwrap();
    assert_eq!(app.get(&mut anonymous, &uri).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires FOODLOC_TEST_DATABASE_URL"]
async fn test_password_changes_with_the_profile() {
    let app = TestApp::with_database().await;
    let username = format!("user_{}", unique_suffix());
    let (mut user, _) = signed_up(
        &app,
        "10.12.0.1",
        json!({ "username": username, "password": PASSWORD, "first_name": "Lan" }),
    )
    .await;

    // A weak password rejects the whole update
    let response = app
        .send(
            &mut user,
            Method::PATCH,
            "/api/users/current-user",
            Some(json!({ "first_name": "Hoa", "password": "short" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let me = app.get(&mut user, "/api/users/current-user").await;
    assert_eq!(me.body["first_name"], "Lan");

    let response = app
        .send(
            &mut user,
            Method::PATCH,
            "/api/users/current-user",
            Some(json!({ "first_name": "Hoa", "password": "cha-ca-la-vong" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["first_name"], "Hoa");

    let mut fresh = Client::new("10.12.0.2");
    let response = app
        .post(
            &mut fresh,
            "/api/auth/login",
            json!({ "username": username, "password": PASSWORD }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    let response = app
        .post(
            &mut fresh,
            "/api/auth/login",
            json!({ "username": username, "password": "cha-ca-la-vong" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["first_name"], "Hoa");
}

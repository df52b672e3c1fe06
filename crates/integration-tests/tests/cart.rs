//! Cart operations through the HTTP API.

use afterschool_integration_tests::{TestContext, id_of};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_cart_requires_token() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/cart", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], false);

    let (status, _) = ctx.get("/cart", Some("not-a-real-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_and_show_cart() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;
    let drama = id_of(&ctx.lesson("drama").await);

    let (status, body) = ctx
        .post("/cart/add", Some(&token), &json!({ "lessonId": drama, "qty": 2 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    ctx.post("/cart/add", Some(&token), &json!({ "lessonId": drama, "qty": 1 }))
        .await;

    let (status, cart) = ctx.get("/cart", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart.as_array().map(Vec::len), Some(1));
    assert_eq!(cart[0]["lessonId"], drama);
    assert_eq!(cart[0]["qty"], 3);

    // Adding to the cart does not hold spaces.
    assert_eq!(ctx.spaces_of(drama).await, 10);
}

#[tokio::test]
async fn test_add_more_than_available_is_rejected() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;
    let drama = id_of(&ctx.lesson("drama").await);

    let (status, body) = ctx
        .post("/cart/add", Some(&token), &json!({ "lessonId": drama, "qty": 11 }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Lesson not available or insufficient spaces");
    assert_eq!(ctx.spaces_of(drama).await, 10);
    let (_, cart) = ctx.get("/cart", Some(&token)).await;
    assert_eq!(cart.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_add_requires_lesson_and_quantity() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;

    let (status, body) = ctx
        .post("/cart/add", Some(&token), &json!({ "qty": 1 }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Lesson ID and quantity required");
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;
    let art = id_of(&ctx.lesson("art").await);

    ctx.post("/cart/add", Some(&token), &json!({ "lessonId": art, "qty": 1 }))
        .await;

    for _ in 0..2 {
        let (status, body) = ctx
            .post("/cart/remove", Some(&token), &json!({ "lessonId": art }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    let (_, cart) = ctx.get("/cart", Some(&token)).await;
    assert_eq!(cart.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let ctx = TestContext::new().await;
    ctx.create_user("M00654321", "another-password").await;
    let first = ctx.login().await;
    let second = ctx.login_as("M00654321", "another-password").await;
    let art = id_of(&ctx.lesson("art").await);

    ctx.post("/cart/add", Some(&first), &json!({ "lessonId": art, "qty": 1 }))
        .await;

    let (_, cart) = ctx.get("/cart", Some(&second)).await;
    assert_eq!(cart.as_array().map(Vec::len), Some(0));
}

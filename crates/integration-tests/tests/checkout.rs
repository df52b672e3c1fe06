//! Placing orders and reading order history.

use afterschool_integration_tests::{TestContext, cash_order, id_of};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_cart_to_order_takes_spaces_and_clears_cart() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;
    let drama = ctx.lesson("drama").await;
    let id = id_of(&drama);
    assert_eq!(drama["price"].as_f64(), Some(20.0));

    ctx.post("/cart/add", Some(&token), &json!({ "lessonId": id, "qty": 3 }))
        .await;
    let (status, body) = ctx
        .post(
            "/orders",
            Some(&token),
            &cash_order(&json!([{ "lessonId": id, "qty": 3 }])),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["ok"], true);
    assert!(body["orderId"].is_number());
    assert_eq!(body["total"].as_f64(), Some(60.0));
    assert_eq!(ctx.spaces_of(id).await, 7);

    let (_, cart) = ctx.get("/cart", Some(&token)).await;
    assert_eq!(cart.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_order_beyond_spaces_changes_nothing() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;
    let drama = id_of(&ctx.lesson("drama").await);
    let art = id_of(&ctx.lesson("art").await);

    let (status, body) = ctx
        .post(
            "/orders",
            Some(&token),
            &cash_order(&json!([
                { "lessonId": art, "qty": 1 },
                { "lessonId": drama, "qty": 11 },
            ])),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Not enough spaces");
    assert_eq!(ctx.spaces_of(drama).await, 10);
    assert_eq!(ctx.spaces_of(art).await, 10);

    let (_, orders) = ctx.get("/orders", Some(&token)).await;
    assert_eq!(orders.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_order_for_unknown_lesson() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;

    let (status, body) = ctx
        .post(
            "/orders",
            Some(&token),
            &cash_order(&json!([{ "lessonId": 9999, "qty": 1 }])),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Lesson not found");
}

#[tokio::test]
async fn test_order_validates_contact_details() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;
    let art = id_of(&ctx.lesson("art").await);

    let mut order = cash_order(&json!([{ "lessonId": art, "qty": 1 }]));
    order["phone"] = json!("12345");

    let (status, body) = ctx.post("/orders", Some(&token), &order).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid name or phone (phone must be at least 10 digits)"
    );
    assert_eq!(ctx.spaces_of(art).await, 10);
}

#[tokio::test]
async fn test_order_with_missing_fields() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;

    let (status, body) = ctx
        .post("/orders", Some(&token), &json!({ "name": "Ada Lovelace" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid order data");
}

#[tokio::test]
async fn test_online_payment_requires_valid_card() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;
    let art = id_of(&ctx.lesson("art").await);

    let mut order = cash_order(&json!([{ "lessonId": art, "qty": 1 }]));
    order["paymentMethod"] = json!("online");
    order["cardNumber"] = json!("1234");
    order["cardName"] = json!("Ada Lovelace");
    order["expiryDate"] = json!("12/30");
    order["securityCode"] = json!("123");

    let (status, body) = ctx.post("/orders", Some(&token), &order).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid card details");

    order["cardNumber"] = json!("4111111111111111");
    let (status, body) = ctx.post("/orders", Some(&token), &order).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, orders) = ctx.get("/orders", Some(&token)).await;
    let payment = &orders[0]["payment"];
    assert_eq!(payment["method"], "online");
    assert_eq!(payment["cardLast4"], "1111");
    assert!(payment.get("cardNumber").is_none());
    assert!(payment.get("securityCode").is_none());
}

#[tokio::test]
async fn test_order_history_is_newest_first() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;
    let art = id_of(&ctx.lesson("art").await);
    let music = id_of(&ctx.lesson("music").await);

    let (_, first) = ctx
        .post(
            "/orders",
            Some(&token),
            &cash_order(&json!([{ "lessonId": art, "qty": 1 }])),
        )
        .await;
    let (_, second) = ctx
        .post(
            "/orders",
            Some(&token),
            &cash_order(&json!([{ "lessonId": music, "qty": 2 }])),
        )
        .await;

    let (status, orders) = ctx.get("/orders", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().map(Vec::len), Some(2));
    assert_eq!(orders[0]["id"], second["orderId"]);
    assert_eq!(orders[1]["id"], first["orderId"]);
    assert_eq!(orders[0]["total"].as_f64(), Some(30.0));
}

#[tokio::test]
async fn test_orders_require_token() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx.get("/orders", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .post("/orders", None, &cash_order(&json!([])))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

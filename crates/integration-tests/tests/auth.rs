//! Login, logout and login rate limiting.

use afterschool_integration_tests::{PASSWORD, STUDENT_ID, TestContext};
use afterschool_server::config::ServerConfig;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

#[tokio::test]
async fn test_login_issues_usable_token() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post("/login", None, &json!({ "user": STUDENT_ID, "password": PASSWORD }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(body["expiresAt"].is_string());
    let token = body["token"].as_str().unwrap_or_default();
    assert!(!token.is_empty());

    let (status, _) = ctx.get("/cart", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let ctx = TestContext::new().await;

    for (user, password) in [
        (STUDENT_ID, "wrong-password"),
        ("M00999999", PASSWORD),
        ("not-an-id", PASSWORD),
    ] {
        let (status, body) = ctx
            .post("/login", None, &json!({ "user": user, "password": password }))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{user}");
        assert_eq!(body["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.post("/login", None, &json!({ "user": STUDENT_ID })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User and password required");
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let ctx = TestContext::new().await;
    let token = ctx.login().await;

    let (status, body) = ctx
        .request(Method::POST, "/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, _) = ctx.get("/cart", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_is_rate_limited_per_client() {
    let ctx = TestContext::with_config(ServerConfig::default()).await;
    let body = json!({ "user": STUDENT_ID, "password": "wrong-password" });
    let login_from = |ip: &str| {
        Request::post("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(body.to_string()))
            .expect("Failed to build request")
    };

    let mut statuses = Vec::new();
    for _ in 0..8 {
        let (status, body) = ctx.send(login_from("203.0.113.7")).await;
        if status == StatusCode::TOO_MANY_REQUESTS {
            assert_eq!(body["ok"], false);
            assert_eq!(body["error"], "Too many requests");
        }
        statuses.push(status);
    }
    assert!(statuses.contains(&StatusCode::UNAUTHORIZED));
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));

    // Another client still gets through.
    let (status, _) = ctx.send(login_from("198.51.100.2")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

//! Store preparation as the server binary runs it.

use afterschool_integration_tests::{TestContext, id_of};
use afterschool_server::config::{DEFAULT_DEMO_PASSWORD, DEFAULT_DEMO_STUDENT_ID, ServerConfig};
use axum::http::StatusCode;
use secrecy::SecretString;
use serde_json::json;

fn memory_config() -> ServerConfig {
    ServerConfig {
        rate_limit_login: false,
        ..ServerConfig::default()
    }
}

#[tokio::test]
async fn test_memory_backend_demo_student_can_book() {
    let ctx = TestContext::booted(memory_config()).await;
    assert_eq!(ctx.state.store().backend(), "memory");

    let token = ctx
        .login_as(DEFAULT_DEMO_STUDENT_ID, DEFAULT_DEMO_PASSWORD)
        .await;

    let (status, lessons) = ctx.get("/lessons", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lessons.as_array().map(Vec::len), Some(10));

    let lesson_id = id_of(&lessons[0]);
    let (status, body) = ctx
        .post("/cart/add", Some(&token), &json!({ "lessonId": lesson_id }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, cart) = ctx.get("/cart", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart.as_array().map(Vec::len), Some(1));
    assert_eq!(cart[0]["lessonId"], lesson_id);
}

#[tokio::test]
async fn test_configured_demo_credentials_replace_defaults() {
    let ctx = TestContext::booted(ServerConfig {
        demo_student_id: "M00424242".to_string(),
        demo_password: SecretString::from("library-card".to_string()),
        ..memory_config()
    })
    .await;

    ctx.login_as("M00424242", "library-card").await;

    let (status, _) = ctx
        .post(
            "/login",
            None,
            &json!({ "user": DEFAULT_DEMO_STUDENT_ID, "password": DEFAULT_DEMO_PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reset_on_start_keeps_demo_student() {
    let ctx = TestContext::booted(ServerConfig {
        reset_on_start: true,
        ..memory_config()
    })
    .await;

    ctx.login_as(DEFAULT_DEMO_STUDENT_ID, DEFAULT_DEMO_PASSWORD)
        .await;
}

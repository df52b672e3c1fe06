//! Integration tests for the afterschool booking server.
//!
//! Tests drive the full axum router in-process (no socket) against the
//! in-memory store, seeded with the sample lessons.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p afterschool-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `lessons` - Listing, sorting, detail and search
//! - `cart` - Adding and removing lessons
//! - `checkout` - Placing orders and order history
//! - `auth` - Login, logout and rate limiting
//! - `startup` - Store preparation as the server binary runs it

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use afterschool_server::config::ServerConfig;
use afterschool_server::db::{MemoryStore, seed};
use afterschool_server::routes;
use afterschool_server::services::AuthService;
use afterschool_server::startup;
use afterschool_server::state::AppState;

/// Student id of the account every context starts with.
pub const STUDENT_ID: &str = "M00123456";
/// Password of [`STUDENT_ID`].
pub const PASSWORD: &str = "correct-horse";

/// A seeded application plus one registered student.
pub struct TestContext {
    pub app: Router,
    pub state: AppState,
}

impl TestContext {
    /// Seeded app with the login rate limiter off.
    pub async fn new() -> Self {
        Self::with_config(ServerConfig {
            rate_limit_login: false,
            ..ServerConfig::default()
        })
        .await
    }

    /// Seeded app with the given configuration.
    pub async fn with_config(config: ServerConfig) -> Self {
        let state = AppState::new(config, Arc::new(MemoryStore::new()));
        seed::seed_if_empty(state.store())
            .await
            .expect("Failed to seed lessons");

        let ctx = Self {
            app: routes::app(state.clone()),
            state,
        };
        ctx.create_user(STUDENT_ID, PASSWORD).await;
        ctx
    }

    /// App whose store went through the same preparation as the server binary.
    ///
    /// No student is registered beyond what startup itself creates.
    pub async fn booted(config: ServerConfig) -> Self {
        let store = startup::prepare_store(&config)
            .await
            .expect("Failed to prepare store");
        let state = AppState::new(config, store);
        Self {
            app: routes::app(state.clone()),
            state,
        }
    }

    /// Register a student directly through the auth service.
    pub async fn create_user(&self, student_id: &str, password: &str) {
        AuthService::new(self.state.store(), self.state.config().token_ttl)
            .create_user(student_id, password)
            .await
            .expect("Failed to create user");
    }

    /// Log in over HTTP and return the bearer token.
    pub async fn login_as(&self, student_id: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/login",
                None,
                &serde_json::json!({ "user": student_id, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"]
            .as_str()
            .expect("login response has no token")
            .to_string()
    }

    /// Log in as the default student.
    pub async fn login(&self) -> String {
        self.login_as(STUDENT_ID, PASSWORD).await
    }

    /// Send a request and return the status with the body parsed as JSON.
    ///
    /// Bodies that are not JSON come back as `Value::String`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).expect("Failed to build request"))
            .await
    }

    /// Send a prebuilt request and return the status with the body parsed as JSON.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let json = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: &Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// The listed lesson with the given subject.
    pub async fn lesson(&self, subject: &str) -> Value {
        let (_, lessons) = self.get("/lessons", None).await;
        lessons
            .as_array()
            .expect("lesson list is an array")
            .iter()
            .find(|lesson| lesson["subject"] == subject)
            .cloned()
            .unwrap_or_else(|| panic!("no lesson with subject {subject}"))
    }

    /// Current remaining spaces of a lesson.
    pub async fn spaces_of(&self, lesson_id: i64) -> u64 {
        let (status, lesson) = self.get(&format!("/lessons/{lesson_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        lesson["spaces"].as_u64().expect("spaces is a number")
    }
}

/// Numeric id of a lesson JSON object.
pub fn id_of(lesson: &Value) -> i64 {
    lesson["id"].as_i64().expect("lesson id is a number")
}

/// A valid cash order body for the given lines.
pub fn cash_order(items: &Value) -> Value {
    serde_json::json!({
        "name": "Ada Lovelace",
        "phone": "07123456789",
        "paymentMethod": "cash",
        "items": items,
    })
}

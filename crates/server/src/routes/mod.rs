//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (store reachable)
//!
//! # Lessons (public)
//! GET  /lessons                - Lesson list (?sort=&order=)
//! GET  /lessons/{id}           - Lesson detail
//! GET  /search                 - Free-text search (?q=)
//!
//! # Cart (bearer token)
//! GET  /cart                   - Cart lines
//! POST /cart/add               - Add a lesson
//! POST /cart/remove            - Remove a lesson
//!
//! # Orders (bearer token)
//! GET  /orders                 - Order history, newest first
//! POST /orders                 - Place an order
//!
//! # Auth
//! POST /login                  - Issue a bearer token (rate limited)
//! POST /logout                 - Revoke the presented token
//! ```
//!
//! Any other path falls through to the static client when
//! `AFTERSCHOOL_STATIC_DIR` is set.

pub mod auth;
pub mod cart;
pub mod lessons;
pub mod orders;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Request, State},
    http::{
        HeaderName, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::middleware::request_id::REQUEST_ID_HEADER;
use crate::middleware::{json_rate_limit_response, login_rate_limiter, request_id_middleware};
use crate::state::AppState;

// =============================================================================
// Extractors
// =============================================================================

/// `Json` extractor whose rejection is rendered as the JSON error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor whose rejection is rendered as the JSON error body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `{"ok": true}`
fn ok() -> Json<Value> {
    Json(json!({ "ok": true }))
}

// =============================================================================
// Routers
// =============================================================================

/// Create the lesson routes router.
pub fn lesson_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(lessons::index))
        .route("/{id}", get(lessons::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
}

/// Create the auth routes router.
///
/// `POST /login` gets the per-IP rate limiter unless disabled in config.
pub fn auth_routes(config: &ServerConfig) -> Router<AppState> {
    let mut login = Router::new().route("/login", post(auth::login));
    if config.rate_limit_login {
        login = login
            .layer(login_rate_limiter())
            .layer(middleware::map_response(json_rate_limit_response));
    }

    login.route("/logout", post(auth::logout))
}

/// Create all API routes.
pub fn routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .nest("/lessons", lesson_routes())
        .route("/search", get(lessons::search))
        .nest("/cart", cart_routes())
        .route("/orders", get(orders::index).post(orders::create))
        .merge(auth_routes(config))
}

/// Build the complete application router with its middleware stack.
///
/// Sentry layers are added by the binary on top of this.
pub fn app(state: AppState) -> Router {
    let config = state.config().clone();

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes(&config));

    if let Some(dir) = &config.static_dir {
        // Unknown paths get index.html so client-side routing works.
        router = router.fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        );
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]);

    router
        .layer(cors)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{HeaderValue, Request};
    use tower::ServiceExt;

    use super::*;
    use crate::db::MemoryStore;

    fn test_app() -> Router {
        let config = ServerConfig {
            rate_limit_login: false,
            ..ServerConfig::default()
        };
        app(AppState::new(config, Arc::new(MemoryStore::new())))
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_readiness_with_memory_store() {
        let response = test_app()
            .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = test_app()
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("x-request-id"),
            Some(&HeaderValue::from_static("abc-123"))
        );
    }

    #[tokio::test]
    async fn test_cart_requires_token() {
        let response = test_app()
            .oneshot(Request::get("/cart").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_json_gets_json_error() {
        let response = test_app()
            .oneshot(
                Request::post("/login")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["ok"], false);
    }
}

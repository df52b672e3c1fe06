//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//!
//! Every failure is rendered as `{"ok": false, "error": "<message>"}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use afterschool_core::{ContactError, PaymentError};

use crate::db::StoreError;
use crate::services::{AuthError, ShopError};

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Catalog, cart or checkout operation failed.
    #[error("Shop error: {0}")]
    Shop(#[from] ShopError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,
}

impl AppError {
    /// Whether this error is our fault rather than the client's.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Store(_)
                | Self::Shop(ShopError::Store(_))
                | Self::Auth(AuthError::Store(_) | AuthError::PasswordHash)
        )
    }

    fn status(&self) -> StatusCode {
        if self.is_server_error() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::InvalidStudentId(_)
                | AuthError::InvalidToken
                | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Internal details are never exposed.
    fn message(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Shop(err) => match err {
                ShopError::Validation(msg) => msg.clone(),
                ShopError::Contact(ContactError::InvalidName | ContactError::InvalidPhone { .. }) => {
                    "Invalid name or phone (phone must be at least 10 digits)".to_string()
                }
                ShopError::Payment(PaymentError::InvalidCard) => "Invalid card details".to_string(),
                ShopError::Payment(PaymentError::UnknownMethod(_)) => {
                    "Invalid order data".to_string()
                }
                ShopError::LessonNotFound(_) => "Lesson not found".to_string(),
                ShopError::LessonUnavailable(_) => {
                    "Lesson not available or insufficient spaces".to_string()
                }
                ShopError::InsufficientSpaces { .. } => "Not enough spaces".to_string(),
                ShopError::Store(_) => "Internal server error".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidStudentId(_) => {
                    "Invalid credentials".to_string()
                }
                AuthError::InvalidToken => "Invalid or missing token".to_string(),
                AuthError::TokenExpired => "Token expired, please log in again".to_string(),
                AuthError::UserAlreadyExists => {
                    "A user with this student id already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                _ => "Authentication error".to_string(),
            },
            Self::NotFound(msg) | Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => "Too many requests".to_string(),
            Self::Store(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let body = json!({ "ok": false, "error": self.message() });
        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

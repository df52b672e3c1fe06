//! Authentication extractor.
//!
//! Resolves the `Authorization: Bearer <token>` header to the user the token
//! was issued to.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// Rejects with `401` and the usual JSON error body when the header is
/// missing, malformed, unknown or expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, user {}!", user.id)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            AppError::Unauthorized("Missing bearer token".to_string())
        })?;

        let user = AuthService::new(state.store(), state.config().token_ttl)
            .authenticate(token)
            .await?;

        tracing::Span::current().record("user_id", user.id.as_i32());
        set_sentry_user(&user.id);

        Ok(Self(user))
    }
}

/// The token from an `Authorization: Bearer` header, if present.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

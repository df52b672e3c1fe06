//! Login and logout route handlers.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::{ApiJson, ok};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::RequireAuth;
use crate::services::AuthService;
use crate::state::AppState;

/// Request body for `POST /login`.
#[derive(Deserialize)]
pub struct LoginForm {
    /// Student id, e.g. `M00123456`.
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Response body for a successful login.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub ok: bool,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Exchange student id and password for a bearer token.
///
/// # Route
///
/// `POST /login`
#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginForm>,
) -> Result<Json<LoginResponse>> {
    let (Some(user), Some(password)) = (form.user, form.password) else {
        return Err(AppError::BadRequest(
            "User and password required".to_string(),
        ));
    };

    let issued = AuthService::new(state.store(), state.config().token_ttl)
        .login(&user, &password)
        .await?;
    set_sentry_user(&issued.user_id);

    Ok(Json(LoginResponse {
        ok: true,
        token: issued.token.expose_secret().to_owned(),
        expires_at: issued.expires_at,
    }))
}

/// Revoke the presented bearer token.
///
/// # Route
///
/// `POST /logout`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    AuthService::new(state.store(), state.config().token_ttl)
        .logout(&user)
        .await?;
    clear_sentry_user();
    Ok(ok())
}

//! Cart route handlers.
//!
//! Every cart route requires a bearer token; the cart belongs to the token's user.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use afterschool_core::{CartItem, LessonId};

use super::{ApiJson, ok};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::CartService;
use crate::state::AppState;

/// Request body for `POST /cart/add`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub lesson_id: Option<LessonId>,
    pub qty: Option<u32>,
}

/// Request body for `POST /cart/remove`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCart {
    pub lesson_id: Option<LessonId>,
}

/// The caller's cart lines.
///
/// # Route
///
/// `GET /cart`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<CartItem>>> {
    let items = CartService::new(state.store()).items(user.id).await?;
    Ok(Json(items))
}

/// Add a lesson to the caller's cart.
///
/// # Route
///
/// `POST /cart/add`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<AddToCart>,
) -> Result<Json<Value>> {
    let (Some(lesson_id), Some(qty)) = (body.lesson_id, body.qty) else {
        return Err(AppError::BadRequest(
            "Lesson ID and quantity required".to_string(),
        ));
    };

    CartService::new(state.store())
        .add(user.id, lesson_id, qty)
        .await?;
    Ok(ok())
}

/// Remove a lesson from the caller's cart. Removing an absent lesson succeeds.
///
/// # Route
///
/// `POST /cart/remove`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<RemoveFromCart>,
) -> Result<Json<Value>> {
    let lesson_id = body
        .lesson_id
        .ok_or_else(|| AppError::BadRequest("Lesson ID required".to_string()))?;

    CartService::new(state.store())
        .remove(user.id, lesson_id)
        .await?;
    Ok(ok())
}

//! Order route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use afterschool_core::{CardDetails, Order, OrderId, OrderLine, PaymentMethod, Price};

use super::ApiJson;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::{CheckoutRequest, CheckoutService, ShopError};
use crate::state::AppState;

/// Request body for `POST /orders`.
///
/// Every field is optional at the JSON level so that a missing field gets the
/// same error message as a malformed one.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderForm {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub payment_method: Option<String>,
    pub card_number: Option<String>,
    pub card_name: Option<String>,
    pub expiry_date: Option<String>,
    pub security_code: Option<String>,
    pub items: Option<Vec<OrderLine>>,
}

// Card fields stay out of logs.
impl std::fmt::Debug for OrderForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderForm")
            .field("payment_method", &self.payment_method)
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl TryFrom<OrderForm> for CheckoutRequest {
    type Error = AppError;

    fn try_from(form: OrderForm) -> std::result::Result<Self, Self::Error> {
        let invalid = || AppError::BadRequest("Invalid order data".to_string());

        let name = form.name.ok_or_else(invalid)?;
        let phone = form.phone.ok_or_else(invalid)?;
        let items = form.items.ok_or_else(invalid)?;
        let payment_method: PaymentMethod = form
            .payment_method
            .ok_or_else(invalid)?
            .parse()
            .map_err(ShopError::Payment)?;

        let card = CardDetails {
            card_number: form.card_number.unwrap_or_default(),
            card_name: form.card_name.unwrap_or_default(),
            expiry_date: form.expiry_date.unwrap_or_default(),
            security_code: form.security_code.unwrap_or_default(),
        };

        Ok(Self {
            name,
            phone,
            payment_method,
            card: Some(card),
            items,
        })
    }
}

/// Response body for a placed order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlaced {
    pub ok: bool,
    pub order_id: OrderId,
    pub total: Price,
}

/// The caller's orders, newest first.
///
/// # Route
///
/// `GET /orders`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = CheckoutService::new(state.store()).history(user.id).await?;
    Ok(Json(orders))
}

/// Place an order.
///
/// # Route
///
/// `POST /orders`
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(form): ApiJson<OrderForm>,
) -> Result<Json<OrderPlaced>> {
    let request = CheckoutRequest::try_from(form)?;
    let receipt = CheckoutService::new(state.store())
        .checkout(user.id, request)
        .await?;

    Ok(Json(OrderPlaced {
        ok: true,
        order_id: receipt.order_id,
        total: receipt.total,
    }))
}

//! Checkout: turn a set of lesson lines into an order and take the spaces.
//!
//! Checkout runs in two phases. Every line is validated against the current
//! lesson records first, so a request that cannot be satisfied fails before
//! anything is written. Spaces are then taken with the store's conditional
//! decrement. If a decrement loses a race with another checkout, the spaces
//! already taken by this request are released again and the checkout fails
//! with `InsufficientSpaces`. Spaces therefore never go negative and a failed
//! checkout leaves no partial decrement behind.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use afterschool_core::{
    CardDetails, CustomerName, LessonId, NewOrder, Order, OrderId, OrderLine, PaymentDetails,
    PaymentMethod, PhoneNumber, Price, UserId,
};

use super::ShopError;
use crate::db::{Store, StoreError};

/// A submitted order form.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub name: String,
    pub phone: String,
    pub payment_method: PaymentMethod,
    /// Card fields; only consulted for online payment.
    pub card: Option<CardDetails>,
    pub items: Vec<OrderLine>,
}

/// What a successful checkout returns to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub order_id: OrderId,
    pub total: Price,
}

/// Order placement and order history.
pub struct CheckoutService<'a> {
    store: &'a dyn Store,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Place an order for `user_id`.
    ///
    /// Ordered lessons are removed from the user's cart afterwards. There is
    /// no idempotency: submitting the same form twice places two orders.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Contact`, `ShopError::Payment` or
    /// `ShopError::Validation` for a malformed form.
    /// Returns `ShopError::LessonNotFound` if an ordered lesson does not exist.
    /// Returns `ShopError::InsufficientSpaces` if a lesson cannot cover its quantity.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        request: CheckoutRequest,
    ) -> Result<Receipt, ShopError> {
        let name = CustomerName::parse(&request.name)?;
        let phone = PhoneNumber::parse(&request.phone)?;
        let payment = PaymentDetails::capture(request.payment_method, request.card.as_ref())?;
        let items = request.items;

        if items.is_empty() {
            return Err(ShopError::Validation("Invalid order data".to_owned()));
        }
        if items.iter().any(|line| line.qty == 0) {
            return Err(ShopError::Validation(
                "Quantity must be at least 1".to_owned(),
            ));
        }

        let total = self.validate(&items).await?;
        self.take_all(&items).await?;

        let order = NewOrder {
            user_id,
            name,
            phone,
            payment,
            items: items.clone(),
            total,
            created_at: Utc::now(),
        };
        let order = match self.store.insert_order(order).await {
            Ok(order) => order,
            Err(e) => {
                self.release_all(&items).await;
                return Err(e.into());
            }
        };

        self.clear_ordered(&order).await;

        info!(order_id = %order.id, total = %order.total, "Order placed");
        Ok(Receipt {
            order_id: order.id,
            total: order.total,
        })
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Store` if the orders cannot be read.
    #[instrument(skip(self))]
    pub async fn history(&self, user_id: UserId) -> Result<Vec<Order>, ShopError> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    /// Phase one: every lesson exists and can cover what is asked of it.
    ///
    /// Lines for the same lesson are summed before the space check.
    async fn validate(&self, items: &[OrderLine]) -> Result<Price, ShopError> {
        let mut requested: BTreeMap<LessonId, u32> = BTreeMap::new();
        let mut total = Price::ZERO;

        for line in items {
            let lesson = self
                .store
                .get_lesson(line.lesson_id)
                .await?
                .ok_or(ShopError::LessonNotFound(line.lesson_id))?;

            let wanted = requested.entry(line.lesson_id).or_default();
            *wanted = wanted.saturating_add(line.qty);
            if !lesson.has_spaces(*wanted) {
                return Err(ShopError::InsufficientSpaces {
                    lesson_id: line.lesson_id,
                    requested: *wanted,
                    available: lesson.spaces,
                });
            }

            total += lesson.price.times(line.qty);
        }

        Ok(total)
    }

    /// Phase two: conditionally decrement each line, undoing on failure.
    async fn take_all(&self, items: &[OrderLine]) -> Result<(), ShopError> {
        let mut taken: Vec<OrderLine> = Vec::with_capacity(items.len());

        for line in items {
            match self.store.take_spaces(line.lesson_id, line.qty).await {
                Ok(Some(_)) => taken.push(*line),
                Ok(None) => {
                    self.release_all(&taken).await;
                    let available = self
                        .store
                        .get_lesson(line.lesson_id)
                        .await?
                        .map_or(0, |lesson| lesson.spaces);
                    warn!(
                        lesson_id = %line.lesson_id,
                        requested = line.qty,
                        available,
                        "Spaces taken by a concurrent checkout"
                    );
                    return Err(ShopError::InsufficientSpaces {
                        lesson_id: line.lesson_id,
                        requested: line.qty,
                        available,
                    });
                }
                Err(e) => {
                    self.release_all(&taken).await;
                    return Err(e.into());
                }
            }
        }

        Ok(())
    }

    /// Give back spaces taken by a checkout that did not complete.
    async fn release_all(&self, taken: &[OrderLine]) {
        for line in taken {
            if let Err(e) = self.store.release_spaces(line.lesson_id, line.qty).await {
                error!(
                    lesson_id = %line.lesson_id,
                    qty = line.qty,
                    error = %e,
                    "Failed to release spaces after aborted checkout"
                );
            }
        }
    }

    /// Remove the ordered lessons from the user's cart.
    ///
    /// The order is already committed at this point, so a failure here is
    /// logged rather than returned.
    async fn clear_ordered(&self, order: &Order) {
        let result = async {
            let Some(mut cart) = self.store.get_cart(order.user_id).await? else {
                return Ok(0);
            };
            let removed = cart.remove_all(&order.lesson_ids());
            if removed > 0 {
                self.store.put_cart(&cart).await?;
            }
            Ok::<_, StoreError>(removed)
        }
        .await;

        if let Err(e) = result {
            error!(order_id = %order.id, error = %e, "Failed to clear ordered lessons from cart");
        }
    }
}

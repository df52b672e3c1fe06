//! Orders: the append-only record of completed checkouts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::contact::{CustomerName, PhoneNumber};
use super::id::{LessonId, OrderId, UserId};
use super::payment::PaymentDetails;
use super::price::Price;

/// A lesson and quantity requested in an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub lesson_id: LessonId,
    pub qty: u32,
}

/// An order about to be appended to the order log.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub name: CustomerName,
    pub phone: PhoneNumber,
    pub payment: PaymentDetails,
    pub items: Vec<OrderLine>,
    pub total: Price,
    pub created_at: DateTime<Utc>,
}

/// A stored order. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub name: String,
    pub phone: String,
    pub payment: PaymentDetails,
    pub items: Vec<OrderLine>,
    pub total: Price,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Materialize a stored order from its insert form and assigned id.
    #[must_use]
    pub fn from_new(id: OrderId, new: NewOrder) -> Self {
        Self {
            id,
            user_id: new.user_id,
            name: new.name.as_str().to_owned(),
            phone: new.phone.as_str().to_owned(),
            payment: new.payment,
            items: new.items,
            total: new.total,
            created_at: new.created_at,
        }
    }

    /// Distinct lessons referenced by this order, in first-seen order.
    #[must_use]
    pub fn lesson_ids(&self) -> Vec<LessonId> {
        let mut ids: Vec<LessonId> = Vec::with_capacity(self.items.len());
        for line in &self.items {
            if !ids.contains(&line.lesson_id) {
                ids.push(line.lesson_id);
            }
        }
        ids
    }
}

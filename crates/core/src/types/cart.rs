//! Per-user shopping cart.

use serde::{Deserialize, Serialize};

use super::id::{LessonId, UserId};
use super::lesson::Lesson;
use super::price::Price;

/// One line in a cart.
///
/// `subject` and `price` are a snapshot taken when the lesson was first
/// added and are not refreshed if the lesson changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub lesson_id: LessonId,
    pub subject: String,
    pub price: Price,
    pub qty: u32,
}

/// A user's cart. Items are kept in insertion order and are unique by lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart for a user.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
        }
    }

    /// Add `qty` of a lesson, merging with an existing line for the same lesson.
    ///
    /// Returns the line's quantity after the add.
    pub fn add(&mut self, lesson: &Lesson, qty: u32) -> u32 {
        if let Some(item) = self.items.iter_mut().find(|i| i.lesson_id == lesson.id) {
            item.qty = item.qty.saturating_add(qty);
            return item.qty;
        }

        self.items.push(CartItem {
            lesson_id: lesson.id,
            subject: lesson.subject.clone(),
            price: lesson.price,
            qty,
        });
        qty
    }

    /// Remove the line for a lesson. Returns `false` if there was none.
    pub fn remove(&mut self, lesson_id: LessonId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.lesson_id != lesson_id);
        self.items.len() != before
    }

    /// Remove every line whose lesson is in `ordered`. Returns how many lines went.
    pub fn remove_all(&mut self, ordered: &[LessonId]) -> usize {
        let before = self.items.len();
        self.items.retain(|i| !ordered.contains(&i.lesson_id));
        before - self.items.len()
    }
}

//! Per-user cart mutation.
//!
//! Adding to a cart checks availability but does not reserve spaces. Spaces
//! are only taken at checkout, so removing a line never has to give any back.

use tracing::{info, instrument};

use afterschool_core::{Cart, CartItem, LessonId, UserId};

use super::ShopError;
use crate::db::Store;

/// Cart operations for an authenticated user.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The user's cart lines, empty if they never added anything.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Store` if the cart cannot be read.
    #[instrument(skip(self))]
    pub async fn items(&self, user_id: UserId) -> Result<Vec<CartItem>, ShopError> {
        Ok(self
            .store
            .get_cart(user_id)
            .await?
            .map(|cart| cart.items)
            .unwrap_or_default())
    }

    /// Add `qty` places of a lesson to the user's cart.
    ///
    /// Returns the line's quantity after the add.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Validation` if `qty` is zero.
    /// Returns `ShopError::LessonUnavailable` if the lesson is missing or has
    /// fewer than `qty` spaces left.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        qty: u32,
    ) -> Result<u32, ShopError> {
        if qty == 0 {
            return Err(ShopError::Validation(
                "Lesson ID and quantity required".to_owned(),
            ));
        }

        let lesson = self
            .store
            .get_lesson(lesson_id)
            .await?
            .filter(|lesson| lesson.has_spaces(qty))
            .ok_or(ShopError::LessonUnavailable(lesson_id))?;

        let mut cart = self
            .store
            .get_cart(user_id)
            .await?
            .unwrap_or_else(|| Cart::new(user_id));
        let line_qty = cart.add(&lesson, qty);
        self.store.put_cart(&cart).await?;

        info!(%lesson_id, qty, line_qty, "Added lesson to cart");
        Ok(line_qty)
    }

    /// Drop a lesson's line from the user's cart. Removing an absent line is a no-op.
    ///
    /// Returns `true` if a line was removed.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Store` if the cart cannot be read or written.
    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: UserId, lesson_id: LessonId) -> Result<bool, ShopError> {
        let Some(mut cart) = self.store.get_cart(user_id).await? else {
            return Ok(false);
        };
        if !cart.remove(lesson_id) {
            return Ok(false);
        }
        self.store.put_cart(&cart).await?;

        info!(%lesson_id, "Removed lesson from cart");
        Ok(true)
    }
}

//! In-memory store.
//!
//! Used when no database is configured and as the store behind tests. All
//! collections sit behind one lock, so every trait method is atomic with
//! respect to every other.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use afterschool_core::{
    Cart, Lesson, LessonId, NewLesson, NewOrder, Order, OrderId, StudentId, UserId,
};

use super::{CartStore, LessonStore, OrderStore, Store, StoreError, TokenStore, UserStore};
use crate::models::{AuthToken, NewUser, User};

#[derive(Default)]
struct Collections {
    lessons: BTreeMap<LessonId, Lesson>,
    carts: HashMap<UserId, Cart>,
    orders: Vec<Order>,
    users: BTreeMap<UserId, User>,
    tokens: HashMap<String, AuthToken>,
    next_lesson_id: i32,
    next_order_id: i32,
    next_user_id: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LessonStore for MemoryStore {
    async fn list_lessons(&self) -> Result<Vec<Lesson>, StoreError> {
        let data = self.data.read().await;
        let mut lessons: Vec<Lesson> = data.lessons.values().cloned().collect();
        lessons.sort_by(|a, b| a.subject.cmp(&b.subject));
        Ok(lessons)
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StoreError> {
        Ok(self.data.read().await.lessons.get(&id).cloned())
    }

    async fn insert_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        let mut data = self.data.write().await;
        let id = LessonId::new(next_id(&mut data.next_lesson_id));
        let lesson = Lesson {
            id,
            subject: lesson.subject,
            location: lesson.location,
            price: lesson.price,
            spaces: lesson.spaces,
            image: lesson.image,
        };
        data.lessons.insert(id, lesson.clone());
        Ok(lesson)
    }

    async fn count_lessons(&self) -> Result<u64, StoreError> {
        Ok(self.data.read().await.lessons.len() as u64)
    }

    async fn take_spaces(&self, id: LessonId, qty: u32) -> Result<Option<Lesson>, StoreError> {
        let mut data = self.data.write().await;
        let Some(lesson) = data.lessons.get_mut(&id) else {
            return Ok(None);
        };
        if !lesson.has_spaces(qty) {
            return Ok(None);
        }
        lesson.spaces -= qty;
        Ok(Some(lesson.clone()))
    }

    async fn release_spaces(&self, id: LessonId, qty: u32) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        let lesson = data.lessons.get_mut(&id).ok_or(StoreError::NotFound)?;
        lesson.spaces = lesson.spaces.saturating_add(qty);
        Ok(())
    }

    async fn reset_spaces(&self, spaces: u32) -> Result<u64, StoreError> {
        let mut data = self.data.write().await;
        for lesson in data.lessons.values_mut() {
            lesson.spaces = spaces;
        }
        Ok(data.lessons.len() as u64)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        Ok(self.data.read().await.carts.get(&user_id).cloned())
    }

    async fn put_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        self.data
            .write()
            .await
            .carts
            .insert(cart.user_id, cart.clone());
        Ok(())
    }

    async fn clear_carts(&self) -> Result<u64, StoreError> {
        let mut data = self.data.write().await;
        let removed = data.carts.len() as u64;
        data.carts.clear();
        Ok(removed)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut data = self.data.write().await;
        let id = OrderId::new(next_id(&mut data.next_order_id));
        let order = Order::from_new(id, order);
        data.orders.push(order.clone());
        Ok(order)
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let data = self.data.read().await;
        let mut orders: Vec<Order> = data
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut data = self.data.write().await;
        if data
            .users
            .values()
            .any(|u| u.student_id == user.student_id)
        {
            return Err(StoreError::Conflict("student id already exists".to_owned()));
        }
        let id = UserId::new(next_id(&mut data.next_user_id));
        let user = User {
            id,
            student_id: user.student_id,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        data.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user_by_student_id(
        &self,
        student_id: &StudentId,
    ) -> Result<Option<User>, StoreError> {
        let data = self.data.read().await;
        Ok(data
            .users
            .values()
            .find(|u| &u.student_id == student_id)
            .cloned())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn put_token(&self, token: &AuthToken) -> Result<(), StoreError> {
        self.data
            .write()
            .await
            .tokens
            .insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn get_token(&self, token_hash: &str) -> Result<Option<AuthToken>, StoreError> {
        Ok(self.data.read().await.tokens.get(token_hash).cloned())
    }

    async fn delete_token(&self, token_hash: &str) -> Result<bool, StoreError> {
        Ok(self.data.write().await.tokens.remove(token_hash).is_some())
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut data = self.data.write().await;
        let before = data.tokens.len();
        data.tokens.retain(|_, token| !token.is_expired(now));
        Ok((before - data.tokens.len()) as u64)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use afterschool_core::Price;

    use super::*;

    fn new_lesson(subject: &str, spaces: u32) -> NewLesson {
        NewLesson {
            subject: subject.to_string(),
            location: "A 12".to_string(),
            price: Price::from_units(5),
            spaces,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_take_spaces_is_conditional() {
        let store = MemoryStore::new();
        let lesson = store.insert_lesson(new_lesson("art", 3)).await.unwrap();

        assert!(store.take_spaces(lesson.id, 4).await.unwrap().is_none());
        assert_eq!(store.get_lesson(lesson.id).await.unwrap().unwrap().spaces, 3);

        let updated = store.take_spaces(lesson.id, 3).await.unwrap().unwrap();
        assert_eq!(updated.spaces, 0);
        assert!(store.take_spaces(lesson.id, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_take_spaces_missing_lesson() {
        let store = MemoryStore::new();
        assert!(store.take_spaces(LessonId::new(99), 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_lessons_sorted_by_subject() {
        let store = MemoryStore::new();
        store.insert_lesson(new_lesson("music", 10)).await.unwrap();
        store.insert_lesson(new_lesson("art", 10)).await.unwrap();
        let subjects: Vec<String> = store
            .list_lessons()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.subject)
            .collect();
        assert_eq!(subjects, ["art", "music"]);
    }

    #[tokio::test]
    async fn test_reset_spaces_and_clear_carts() {
        let store = MemoryStore::new();
        let lesson = store.insert_lesson(new_lesson("art", 10)).await.unwrap();
        store.take_spaces(lesson.id, 4).await.unwrap();
        store.put_cart(&Cart::new(UserId::new(1))).await.unwrap();

        assert_eq!(store.reset_spaces(10).await.unwrap(), 1);
        assert_eq!(store.clear_carts().await.unwrap(), 1);
        assert_eq!(store.get_lesson(lesson.id).await.unwrap().unwrap().spaces, 10);
        assert!(store.get_cart(UserId::new(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_student_id_conflicts() {
        let store = MemoryStore::new();
        let student_id = StudentId::parse("M00123456").unwrap();
        let new_user = NewUser {
            student_id: student_id.clone(),
            password_hash: "hash".to_string(),
        };
        store.insert_user(new_user.clone()).await.unwrap();
        let err = store.insert_user(new_user).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(
            store
                .get_user_by_student_id(&student_id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_purge_expired_tokens() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for (hash, ttl) in [("old", -1), ("edge", 0), ("live", 1)] {
            store
                .put_token(&AuthToken {
                    token_hash: hash.to_string(),
                    user_id: UserId::new(1),
                    created_at: now,
                    expires_at: now + chrono::Duration::hours(ttl),
                })
                .await
                .unwrap();
        }

        assert_eq!(store.purge_expired_tokens(now).await.unwrap(), 2);
        assert!(store.get_token("old").await.unwrap().is_none());
        assert!(store.get_token("edge").await.unwrap().is_none());
        assert!(store.get_token("live").await.unwrap().is_some());
    }
}

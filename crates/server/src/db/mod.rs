//! Storage for lessons, carts, orders, users and bearer tokens.
//!
//! Everything above this module talks to a [`Store`] trait object, so the
//! backend is chosen once at startup:
//!
//! - [`PgStore`] - `PostgreSQL` (`afterschool` schema) when a database URL is configured
//! - [`MemoryStore`] - process-local fallback, also used by tests
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p afterschool-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;
pub mod seed;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use afterschool_core::{Cart, Lesson, LessonId, NewLesson, NewOrder, Order, StudentId, UserId};

use crate::models::{AuthToken, NewUser, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or out of range.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate student id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Lesson records and their remaining spaces.
#[async_trait]
pub trait LessonStore: Send + Sync {
    /// All lessons, ordered by subject.
    async fn list_lessons(&self) -> Result<Vec<Lesson>, StoreError>;

    /// One lesson by id.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StoreError>;

    /// Insert a lesson and return it with its assigned id.
    async fn insert_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError>;

    /// Number of stored lessons.
    async fn count_lessons(&self) -> Result<u64, StoreError>;

    /// Atomically decrement `spaces` by `qty` if at least `qty` remain.
    ///
    /// Returns the updated lesson, or `None` when the lesson is missing or
    /// has fewer than `qty` spaces left (nothing is changed in that case).
    async fn take_spaces(&self, id: LessonId, qty: u32) -> Result<Option<Lesson>, StoreError>;

    /// Give `qty` spaces back to a lesson.
    async fn release_spaces(&self, id: LessonId, qty: u32) -> Result<(), StoreError>;

    /// Set every lesson's spaces to `spaces`. Returns the number of lessons touched.
    async fn reset_spaces(&self, spaces: u32) -> Result<u64, StoreError>;
}

/// One cart per user, keyed by user id.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's cart, if one was ever created.
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>, StoreError>;

    /// Replace the user's cart with `cart` (upsert).
    async fn put_cart(&self, cart: &Cart) -> Result<(), StoreError>;

    /// Delete every cart. Returns the number of carts removed.
    async fn clear_carts(&self) -> Result<u64, StoreError>;
}

/// Append-only order log.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Append an order and return it with its assigned id.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// A user's orders, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError>;
}

/// Registered students.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `StoreError::Conflict` for a duplicate student id.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Look a user up by the id they log in with.
    async fn get_user_by_student_id(&self, student_id: &StudentId)
    -> Result<Option<User>, StoreError>;
}

/// Issued bearer tokens, keyed by token digest.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store a newly issued token.
    async fn put_token(&self, token: &AuthToken) -> Result<(), StoreError>;

    /// Fetch a token by digest.
    async fn get_token(&self, token_hash: &str) -> Result<Option<AuthToken>, StoreError>;

    /// Revoke a token. Returns `false` if it did not exist.
    async fn delete_token(&self, token_hash: &str) -> Result<bool, StoreError>;

    /// Delete every token that expired at or before `now`. Returns the number removed.
    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// The full storage capability the server runs on.
#[async_trait]
pub trait Store: LessonStore + CartStore + OrderStore + UserStore + TokenStore {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Shared handle to the configured store.
pub type SharedStore = Arc<dyn Store>;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Open the configured store: `PostgreSQL` when a URL is given, memory otherwise.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database pool cannot be created.
pub async fn open_store(
    database_url: Option<&secrecy::SecretString>,
) -> Result<SharedStore, sqlx::Error> {
    match database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            tracing::warn!("No database configured, using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Convert a stored integer count to `u32`, rejecting negatives.
pub(crate) fn to_u32(value: i32, what: &str) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::DataCorruption(format!("negative {what} in store: {value}")))
}

/// Convert a `u32` count to the `INTEGER` the database stores.
pub(crate) fn to_i32(value: u32, what: &str) -> Result<i32, StoreError> {
    i32::try_from(value)
        .map_err(|_| StoreError::DataCorruption(format!("{what} out of range: {value}")))
}

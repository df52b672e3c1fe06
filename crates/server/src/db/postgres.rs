//! `PostgreSQL` store.
//!
//! Queries are built at runtime with `sqlx::query_as` against row structs so
//! the crate builds without a live database. All tables live in the
//! `afterschool` schema (see `crates/server/migrations/`).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use afterschool_core::{
    Cart, CartItem, Lesson, LessonId, NewLesson, NewOrder, Order, OrderId, OrderLine,
    PaymentDetails, PaymentMethod, Price, StudentId, UserId,
};

use super::{
    CartStore, LessonStore, OrderStore, Store, StoreError, TokenStore, UserStore, to_i32, to_u32,
};
use crate::models::{AuthToken, NewUser, User};

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct LessonRow {
    id: i32,
    subject: String,
    location: String,
    price: Decimal,
    spaces: i32,
    image: Option<String>,
}

impl TryFrom<LessonRow> for Lesson {
    type Error = StoreError;

    fn try_from(row: LessonRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: LessonId::new(row.id),
            subject: row.subject,
            location: row.location,
            price: to_price(row.price)?,
            spaces: to_u32(row.spaces, "lesson spaces")?,
            image: row.image,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    lesson_id: i32,
    subject: String,
    price: Decimal,
    qty: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    name: String,
    phone: String,
    payment_method: String,
    card_name: Option<String>,
    card_last4: Option<String>,
    total: Decimal,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: i32,
    lesson_id: i32,
    qty: i32,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    student_id: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let student_id = StudentId::parse(&row.student_id).map_err(|e| {
            StoreError::DataCorruption(format!("invalid student id in database: {e}"))
        })?;
        Ok(Self {
            id: UserId::new(row.id),
            student_id,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    token_hash: String,
    user_id: i32,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

fn to_price(amount: Decimal) -> Result<Price, StoreError> {
    Price::new(amount).map_err(|e| StoreError::DataCorruption(e.to_string()))
}

const LESSON_COLUMNS: &str = "id, subject, location, price, spaces, image";

// =============================================================================
// Lessons
// =============================================================================

#[async_trait]
impl LessonStore for PgStore {
    async fn list_lessons(&self) -> Result<Vec<Lesson>, StoreError> {
        let rows = sqlx::query_as::<_, LessonRow>(&format!(
            "SELECT {LESSON_COLUMNS} FROM afterschool.lessons ORDER BY subject, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Lesson::try_from).collect()
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StoreError> {
        let row = sqlx::query_as::<_, LessonRow>(&format!(
            "SELECT {LESSON_COLUMNS} FROM afterschool.lessons WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Lesson::try_from).transpose()
    }

    async fn insert_lesson(&self, lesson: NewLesson) -> Result<Lesson, StoreError> {
        let row = sqlx::query_as::<_, LessonRow>(&format!(
            r"
            INSERT INTO afterschool.lessons (subject, location, price, spaces, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LESSON_COLUMNS}
            "
        ))
        .bind(&lesson.subject)
        .bind(&lesson.location)
        .bind(lesson.price.amount())
        .bind(to_i32(lesson.spaces, "lesson spaces")?)
        .bind(&lesson.image)
        .fetch_one(&self.pool)
        .await?;

        Lesson::try_from(row)
    }

    async fn count_lessons(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM afterschool.lessons")
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count)
            .map_err(|_| StoreError::DataCorruption(format!("negative lesson count: {count}")))
    }

    async fn take_spaces(&self, id: LessonId, qty: u32) -> Result<Option<Lesson>, StoreError> {
        // The WHERE clause makes check-and-decrement a single atomic statement.
        let row = sqlx::query_as::<_, LessonRow>(&format!(
            r"
            UPDATE afterschool.lessons
            SET spaces = spaces - $2
            WHERE id = $1 AND spaces >= $2
            RETURNING {LESSON_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(to_i32(qty, "quantity")?)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Lesson::try_from).transpose()
    }

    async fn release_spaces(&self, id: LessonId, qty: u32) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE afterschool.lessons
            SET spaces = spaces + $2
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(to_i32(qty, "quantity")?)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn reset_spaces(&self, spaces: u32) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE afterschool.lessons SET spaces = $1")
            .bind(to_i32(spaces, "lesson spaces")?)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Carts
// =============================================================================

#[async_trait]
impl CartStore for PgStore {
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT lesson_id, subject, price, qty
            FROM afterschool.cart_items
            WHERE user_id = $1
            ORDER BY position
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        // An emptied cart has no rows and reads back the same as a missing one.
        if rows.is_empty() {
            return Ok(None);
        }

        let items = rows
            .into_iter()
            .map(|row| {
                Ok(CartItem {
                    lesson_id: LessonId::new(row.lesson_id),
                    subject: row.subject,
                    price: to_price(row.price)?,
                    qty: to_u32(row.qty, "cart quantity")?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(Some(Cart { user_id, items }))
    }

    async fn put_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM afterschool.cart_items WHERE user_id = $1")
            .bind(cart.user_id.as_i32())
            .execute(&mut *tx)
            .await?;

        for (position, item) in (0_i32..).zip(&cart.items) {
            sqlx::query(
                r"
                INSERT INTO afterschool.cart_items (user_id, lesson_id, position, subject, price, qty)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(cart.user_id.as_i32())
            .bind(item.lesson_id.as_i32())
            .bind(position)
            .bind(&item.subject)
            .bind(item.price.amount())
            .bind(to_i32(item.qty, "cart quantity")?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn clear_carts(&self) -> Result<u64, StoreError> {
        let removed: i64 = sqlx::query_scalar(
            r"
            WITH deleted AS (DELETE FROM afterschool.cart_items RETURNING user_id)
            SELECT COUNT(DISTINCT user_id) FROM deleted
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(u64::try_from(removed).unwrap_or_default())
    }
}

// =============================================================================
// Orders
// =============================================================================

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;

        let order_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO afterschool.orders
                (user_id, name, phone, payment_method, card_name, card_last4, total, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(order.user_id.as_i32())
        .bind(order.name.as_str())
        .bind(order.phone.as_str())
        .bind(order.payment.method.as_str())
        .bind(&order.payment.card_name)
        .bind(&order.payment.card_last4)
        .bind(order.total.amount())
        .bind(order.created_at)
        .fetch_one(&mut *tx)
        .await?;

        for (position, line) in (0_i32..).zip(&order.items) {
            sqlx::query(
                r"
                INSERT INTO afterschool.order_items (order_id, position, lesson_id, qty)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order_id)
            .bind(position)
            .bind(line.lesson_id.as_i32())
            .bind(to_i32(line.qty, "order quantity")?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Order::from_new(OrderId::new(order_id), order))
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, name, phone, payment_method, card_name, card_last4,
                   total, created_at
            FROM afterschool.orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT order_id, lesson_id, qty
            FROM afterschool.order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            ",
        )
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<i32, Vec<OrderLine>> = HashMap::new();
        for row in item_rows {
            lines.entry(row.order_id).or_default().push(OrderLine {
                lesson_id: LessonId::new(row.lesson_id),
                qty: to_u32(row.qty, "order quantity")?,
            });
        }

        rows.into_iter()
            .map(|row| {
                let method: PaymentMethod = row
                    .payment_method
                    .parse()
                    .map_err(|e: afterschool_core::PaymentError| {
                        StoreError::DataCorruption(e.to_string())
                    })?;
                Ok(Order {
                    id: OrderId::new(row.id),
                    user_id: UserId::new(row.user_id),
                    name: row.name,
                    phone: row.phone,
                    payment: PaymentDetails {
                        method,
                        card_name: row.card_name,
                        card_last4: row.card_last4,
                    },
                    items: lines.remove(&row.id).unwrap_or_default(),
                    total: to_price(row.total)?,
                    created_at: row.created_at,
                })
            })
            .collect()
    }
}

// =============================================================================
// Users
// =============================================================================

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO afterschool.users (student_id, password_hash)
            VALUES ($1, $2)
            RETURNING id, student_id, password_hash, created_at
            ",
        )
        .bind(user.student_id.as_str())
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict("student id already exists".to_owned());
            }
            StoreError::Database(e)
        })?;

        User::try_from(row)
    }

    async fn get_user_by_student_id(
        &self,
        student_id: &StudentId,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, student_id, password_hash, created_at
            FROM afterschool.users
            WHERE student_id = $1
            ",
        )
        .bind(student_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

}

// =============================================================================
// Tokens
// =============================================================================

#[async_trait]
impl TokenStore for PgStore {
    async fn put_token(&self, token: &AuthToken) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO afterschool.auth_tokens (token_hash, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(&token.token_hash)
        .bind(token.user_id.as_i32())
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_token(&self, token_hash: &str) -> Result<Option<AuthToken>, StoreError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r"
            SELECT token_hash, user_id, created_at, expires_at
            FROM afterschool.auth_tokens
            WHERE token_hash = $1
            ",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| AuthToken {
            token_hash: r.token_hash,
            user_id: UserId::new(r.user_id),
            created_at: r.created_at,
            expires_at: r.expires_at,
        }))
    }

    async fn delete_token(&self, token_hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM afterschool.auth_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM afterschool.auth_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

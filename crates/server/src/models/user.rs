//! User and bearer-token domain types.

use chrono::{DateTime, Utc};

use afterschool_core::{StudentId, UserId};

/// A registered student.
#[derive(Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// External identifier the student logs in with.
    pub student_id: StudentId,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("student_id", &self.student_id)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// A user that has not been stored yet.
#[derive(Clone)]
pub struct NewUser {
    pub student_id: StudentId,
    pub password_hash: String,
}

/// A stored bearer token.
///
/// Only the SHA-256 digest of the token is kept; the token itself is handed
/// to the client once and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    /// Base64url SHA-256 digest of the bearer token.
    pub token_hash: String,
    /// Owner of the token.
    pub user_id: UserId,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    /// Whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// The verified identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Digest of the bearer token the request presented.
    pub token_hash: String,
}

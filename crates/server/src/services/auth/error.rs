//! Authentication error types.

use thiserror::Error;

use crate::db::StoreError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid student id format.
    #[error("invalid student id: {0}")]
    InvalidStudentId(#[from] afterschool_core::StudentIdError),

    /// Invalid credentials (wrong password or unknown student).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Bearer token is missing, malformed or unknown.
    #[error("invalid token")]
    InvalidToken,

    /// Bearer token is past its expiry.
    #[error("token expired")]
    TokenExpired,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

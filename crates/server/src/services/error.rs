//! Errors raised by the catalog, cart and checkout services.

use thiserror::Error;

use afterschool_core::{ContactError, LessonId, PaymentError};

use crate::db::StoreError;

/// Errors that can occur while browsing, filling a cart or checking out.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Request fields are missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// Order-form name or phone is malformed.
    #[error("invalid contact details: {0}")]
    Contact(#[from] ContactError),

    /// Payment fields are malformed.
    #[error("invalid payment details: {0}")]
    Payment(#[from] PaymentError),

    /// An ordered lesson does not exist.
    #[error("lesson {0} not found")]
    LessonNotFound(LessonId),

    /// The lesson is missing or cannot cover the requested quantity.
    #[error("lesson {0} not available or insufficient spaces")]
    LessonUnavailable(LessonId),

    /// Checkout asked for more spaces than a lesson has left.
    #[error("lesson {lesson_id} has {available} spaces, {requested} requested")]
    InsufficientSpaces {
        lesson_id: LessonId,
        requested: u32,
        available: u32,
    },

    /// Storage failed underneath the service.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

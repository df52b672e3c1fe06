//! Core types for Afterschool.
//!
//! This module provides type-safe wrappers for the booking domain.

pub mod cart;
pub mod contact;
pub mod id;
pub mod lesson;
pub mod order;
pub mod payment;
pub mod price;
pub mod student_id;

pub use cart::{Cart, CartItem};
pub use contact::{ContactError, CustomerName, PhoneNumber};
pub use id::*;
pub use lesson::{Lesson, NewLesson, SortDirection, SortKey, matches_query, sort_lessons};
pub use order::{NewOrder, Order, OrderLine};
pub use payment::{CardDetails, PaymentDetails, PaymentError, PaymentMethod};
pub use price::{Price, PriceError};
pub use student_id::{StudentId, StudentIdError};

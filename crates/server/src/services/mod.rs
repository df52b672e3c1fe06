//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Student login, bearer tokens and user creation
//! - `catalog` - Lesson listing, lookup and search
//! - `cart` - Per-user cart mutation
//! - `checkout` - Order placement and order history
//!
//! Services borrow the shared [`Store`](crate::db::Store) for the duration of
//! a request and hold no state of their own.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
mod error;

pub use auth::{AuthError, AuthService, IssuedToken};
pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::{CheckoutRequest, CheckoutService, Receipt};
pub use error::ShopError;

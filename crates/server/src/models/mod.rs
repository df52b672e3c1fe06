//! Server-side domain models.
//!
//! Lesson, cart and order types are shared and live in `afterschool-core`;
//! the types here only exist on the server (credentials and tokens).

pub mod user;

pub use user::{AuthToken, CurrentUser, NewUser, User};

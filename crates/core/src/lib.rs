//! Afterschool Core - Shared domain types.
//!
//! This crate provides the types used across all Afterschool components:
//! - `server` - The lesson booking HTTP API
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain rules - no I/O, no
//! database access, no HTTP. Cart merging, lesson search and sorting, and
//! order-form validation live here so they can be tested without a store.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, validated form fields, lessons, carts and orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

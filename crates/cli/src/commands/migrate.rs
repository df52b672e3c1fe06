//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! afterschool-cli migrate
//! ```
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/` and are embedded into this
//! binary at compile time.

use super::{CommandError, connect};

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails or
/// a migration cannot be applied.
pub async fn run() -> Result<(), CommandError> {
    let (_, store) = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations")
        .run(store.pool())
        .await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

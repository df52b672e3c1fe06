//! Lesson seeding and reset commands.
//!
//! Both operate on the same code paths the server runs at startup.

use afterschool_server::db::seed::{reset as reset_store, seed_if_empty};

use super::{CommandError, connect};

/// Insert the sample lessons if the lesson table is empty.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn seed() -> Result<(), CommandError> {
    let (_, store) = connect().await?;

    let inserted = seed_if_empty(&store).await?;
    if inserted == 0 {
        tracing::info!("Lessons already present, nothing to seed");
    } else {
        tracing::info!("Seeded {inserted} lessons");
    }
    Ok(())
}

/// Restore every lesson to the default number of spaces and clear all carts.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an update fails.
pub async fn reset() -> Result<(), CommandError> {
    let (_, store) = connect().await?;

    let summary = reset_store(&store).await?;
    tracing::info!(
        lessons = summary.lessons_reset,
        carts = summary.carts_cleared,
        "Reset complete"
    );
    Ok(())
}

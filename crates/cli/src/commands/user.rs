//! Student account management.

use secrecy::{ExposeSecret, SecretString};

use afterschool_core::{StudentId, UserId};
use afterschool_server::services::AuthService;

use super::{CommandError, connect};

/// Create a student account.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the password is too short, the student id is already
/// registered, or the database is unreachable.
pub async fn create(
    student_id: &StudentId,
    password: &SecretString,
) -> Result<UserId, CommandError> {
    let (config, store) = connect().await?;

    let user = AuthService::new(&store, config.token_ttl)
        .create_user(student_id.as_str(), password.expose_secret())
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Student ID: {}",
        user.id,
        user.student_id
    );
    Ok(user.id)
}

//! Store preparation run once before the server accepts requests.

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::db::{self, SharedStore, StoreError, seed};
use crate::services::{AuthError, AuthService};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("demo student: {0}")]
    DemoStudent(#[from] AuthError),
}

/// Open the configured store and bring it into a servable state.
///
/// Seeds the sample lessons when there are none and applies the optional
/// reset. On the in-memory store nothing survives a restart, so the demo
/// student from config is registered too.
///
/// # Errors
///
/// Returns `StartupError` if the store cannot be opened or prepared, or the
/// configured demo credentials are invalid.
pub async fn prepare_store(config: &ServerConfig) -> Result<SharedStore, StartupError> {
    let store = db::open_store(config.database_url.as_ref()).await?;
    info!(backend = store.backend(), "Store opened");

    seed::seed_if_empty(store.as_ref()).await?;
    if config.reset_on_start {
        seed::reset(store.as_ref()).await?;
    }

    if store.backend() == "memory" {
        register_demo_student(store.as_ref(), config).await?;
    }

    Ok(store)
}

async fn register_demo_student(
    store: &dyn db::Store,
    config: &ServerConfig,
) -> Result<(), AuthError> {
    let auth = AuthService::new(store, config.token_ttl);
    match auth
        .create_user(&config.demo_student_id, config.demo_password.expose_secret())
        .await
    {
        Ok(user) => {
            warn!(
                user_id = %user.id,
                student_id = %user.student_id,
                "In-memory store: registered demo student"
            );
            Ok(())
        }
        Err(AuthError::UserAlreadyExists) => Ok(()),
        Err(e) => Err(e),
    }
}

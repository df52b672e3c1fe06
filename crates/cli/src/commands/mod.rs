//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use thiserror::Error;

use afterschool_server::config::{ConfigError, ServerConfig};
use afterschool_server::db::{PgStore, StoreError, create_pool};
use afterschool_server::services::AuthError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No database URL in the environment.
    #[error("Missing environment variable: AFTERSCHOOL_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Load configuration and return the database URL the commands operate on.
///
/// Unlike the server, the CLI has no in-memory fallback.
fn database_url() -> Result<(ServerConfig, SecretString), CommandError> {
    let config = ServerConfig::from_env()?;
    let url = config
        .database_url
        .clone()
        .ok_or(CommandError::MissingDatabaseUrl)?;
    Ok((config, url))
}

/// Connect to `PostgreSQL` and wrap the pool in the server's store.
async fn connect() -> Result<(ServerConfig, PgStore), CommandError> {
    let (config, url) = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&url).await?;
    Ok((config, PgStore::new(pool)))
}

//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `AFTERSCHOOL_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; when neither is set the in-memory store is used)
//! - `AFTERSCHOOL_HOST` - Bind address (default: 127.0.0.1)
//! - `AFTERSCHOOL_PORT` - Listen port (default: 8080)
//! - `AFTERSCHOOL_TOKEN_TTL_HOURS` - Bearer token lifetime (default: 24)
//! - `AFTERSCHOOL_RESET_ON_START` - Reset lesson spaces and carts at boot (default: false)
//! - `AFTERSCHOOL_STATIC_DIR` - Directory with the single-page client to serve
//! - `AFTERSCHOOL_RATE_LIMIT_LOGIN` - Rate limit `POST /login` per client IP (default: true)
//! - `AFTERSCHOOL_DEMO_STUDENT_ID` - Student registered at boot on the in-memory
//!   store (default: M00000001)
//! - `AFTERSCHOOL_DEMO_PASSWORD` - Password of that student (default: afterschool)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_TRACES_SAMPLE_RATE` - Fraction of requests traced (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

/// Student registered at boot when running on the in-memory store.
pub const DEFAULT_DEMO_STUDENT_ID: &str = "M00000001";

/// Password of [`DEFAULT_DEMO_STUDENT_ID`].
pub const DEFAULT_DEMO_PASSWORD: &str = "afterschool";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` connection URL (contains password). `None` selects the in-memory store.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// How long an issued bearer token stays valid
    pub token_ttl: chrono::Duration,
    /// Restore every lesson to the default spaces and empty all carts at boot
    pub reset_on_start: bool,
    /// Directory holding the client bundle, served for non-API paths
    pub static_dir: Option<PathBuf>,
    /// Apply the per-IP rate limiter to the login endpoint
    pub rate_limit_login: bool,
    /// Student id registered at boot on the in-memory store
    pub demo_student_id: String,
    /// Password for `demo_student_id`
    pub demo_password: SecretString,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8080,
            token_ttl: chrono::Duration::hours(24),
            reset_on_start: false,
            static_dir: None,
            rate_limit_login: true,
            demo_student_id: DEFAULT_DEMO_STUDENT_ID.to_string(),
            demo_password: SecretString::from(DEFAULT_DEMO_PASSWORD.to_string()),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("AFTERSCHOOL_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .filter(|url| !url.trim().is_empty())
            .map(SecretString::from);

        let host = parse_or(&lookup, "AFTERSCHOOL_HOST", defaults.host)?;
        let port = parse_or(&lookup, "AFTERSCHOOL_PORT", defaults.port)?;

        let ttl_hours: u32 = parse_or(&lookup, "AFTERSCHOOL_TOKEN_TTL_HOURS", 24)?;
        if ttl_hours == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "AFTERSCHOOL_TOKEN_TTL_HOURS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let reset_on_start = parse_bool(&lookup, "AFTERSCHOOL_RESET_ON_START", false)?;
        let rate_limit_login = parse_bool(&lookup, "AFTERSCHOOL_RATE_LIMIT_LOGIN", true)?;
        let static_dir = lookup("AFTERSCHOOL_STATIC_DIR").map(PathBuf::from);
        let demo_student_id = lookup("AFTERSCHOOL_DEMO_STUDENT_ID")
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or(defaults.demo_student_id);
        let demo_password = lookup("AFTERSCHOOL_DEMO_PASSWORD")
            .filter(|password| !password.is_empty())
            .map_or(defaults.demo_password, SecretString::from);

        let sentry_traces_sample_rate = parse_or(
            &lookup,
            "SENTRY_TRACES_SAMPLE_RATE",
            defaults.sentry_traces_sample_rate,
        )?;

        Ok(Self {
            database_url,
            host,
            port,
            token_ttl: chrono::Duration::hours(i64::from(ttl_hours)),
            reset_on_start,
            static_dir,
            rate_limit_login,
            demo_student_id,
            demo_password,
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable with `FromStr`, falling back to `default` when unset.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

/// Parse a boolean flag. Accepts `true/false`, `1/0`, `yes/no`.
fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

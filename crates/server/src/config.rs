//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BLOCKED_SUPPLY_DATABASE_URL` - `SQLite` connection string (e.g. `sqlite:blocked-supply.db?mode=rwc`)
//! - `BLOCKED_SUPPLY_BROKER_URL` - Base URL of the blockchain broker service
//! - `BLOCKED_SUPPLY_JWT_SECRET` - HMAC signing secret for bearer tokens (min 32 chars)
//! - `BLOCKED_SUPPLY_ENCRYPTION_KEY` - Base64-encoded 32-byte AES key for addresses at rest
//!
//! ## Optional
//! - `BLOCKED_SUPPLY_HOST` - Bind address (default: 127.0.0.1)
//! - `BLOCKED_SUPPLY_PORT` - Listen port (default: 8080)
//! - `BLOCKED_SUPPLY_JWT_EXPIRATION_SECS` - Access token lifetime (default: 86400)
//! - `BLOCKED_SUPPLY_JWT_REFRESH_EXPIRATION_SECS` - Refresh token lifetime (default: 604800)
//! - `BLOCKED_SUPPLY_BROKER_TIMEOUT_SECS` - Broker request timeout (default: 10)

use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Base URL of the broker service (no trailing slash)
    pub broker_url: String,
    /// Broker HTTP request timeout in seconds
    pub broker_timeout_secs: u64,
    /// JWT signing secret
    pub jwt_secret: SecretString,
    /// Access token lifetime in seconds
    pub jwt_expiration_secs: i64,
    /// Refresh token lifetime in seconds
    pub jwt_refresh_expiration_secs: i64,
    /// Base64-encoded 32-byte key for blockchain address encryption at rest
    pub encryption_key: SecretString,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the JWT secret fails the minimum-length check.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(get_required_env("BLOCKED_SUPPLY_DATABASE_URL")?);
        let host = get_env_or_default("BLOCKED_SUPPLY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BLOCKED_SUPPLY_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("BLOCKED_SUPPLY_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BLOCKED_SUPPLY_PORT".to_string(), e.to_string())
            })?;

        let broker_url = get_required_env("BLOCKED_SUPPLY_BROKER_URL")?
            .trim_end_matches('/')
            .to_string();
        let broker_timeout_secs = parse_env_or_default("BLOCKED_SUPPLY_BROKER_TIMEOUT_SECS", 10)?;

        let jwt_secret = SecretString::from(get_required_env("BLOCKED_SUPPLY_JWT_SECRET")?);
        validate_jwt_secret(&jwt_secret, "BLOCKED_SUPPLY_JWT_SECRET")?;
        let jwt_expiration_secs =
            parse_env_or_default("BLOCKED_SUPPLY_JWT_EXPIRATION_SECS", 86_400)?;
        let jwt_refresh_expiration_secs =
            parse_env_or_default("BLOCKED_SUPPLY_JWT_REFRESH_EXPIRATION_SECS", 604_800)?;

        let encryption_key = SecretString::from(get_required_env("BLOCKED_SUPPLY_ENCRYPTION_KEY")?);

        Ok(Self {
            database_url,
            host,
            port,
            broker_url,
            broker_timeout_secs,
            jwt_secret,
            jwt_expiration_secs,
            jwt_refresh_expiration_secs,
            encryption_key,
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

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable parsed as a number, with a default.
fn parse_env_or_default<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Validate that the JWT secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

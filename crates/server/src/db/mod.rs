//! Database operations for the backend `SQLite` store.
//!
//! # Tables
//!
//! - `users` - Local accounts (broker addresses stored encrypted)
//! - `tokens` - Issued access tokens (revocation tracked, never deleted)
//! - `shipment_records` - Denormalized mirror of broker shipments
//! - `notifications` - Per-user transfer-event inbox
//!
//! All queries use the runtime `sqlx` API with `FromRow` models. Migrations
//! are embedded from `crates/server/migrations/` and run at startup.

pub mod notifications;
pub mod shipments;
pub mod tokens;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique constraint violation.
    #[error("{0}")]
    Conflict(String),

    /// Row not found where one was required.
    #[error("not found")]
    NotFound,

    /// Stored data failed to parse back into its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `SQLite` connection pool with sensible defaults and run migrations.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established or a
/// migration fails.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Create an in-memory pool with migrations applied. Test use only.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection or a migration fails.
pub async fn create_pool_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    // A single connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Current unix timestamp in seconds.
#[must_use]
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Convert a stored unix timestamp back into a `DateTime<Utc>`.
pub(crate) fn timestamp_to_datetime(
    secs: i64,
) -> Result<chrono::DateTime<chrono::Utc>, RepositoryError> {
    chrono::DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| RepositoryError::DataCorruption(format!("invalid timestamp: {secs}")))
}

/// Classify a unique-constraint violation as a `Conflict`, passing other
/// errors through as `Database`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

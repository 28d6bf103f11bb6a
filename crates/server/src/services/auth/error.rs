//! Authentication error types.

use thiserror::Error;

use crate::broker::BrokerError;
use crate::db::RepositoryError;
use crate::services::crypto::CryptoError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required registration field is empty or missing.
    #[error("Email, password and name cannot be null")]
    MissingFields,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] blocked_supply_core::EmailError),

    /// Password too weak.
    #[error("{0}")]
    WeakPassword(String),

    /// Name shorter than the minimum length.
    #[error("Name has to be at least 3 characters long")]
    NameTooShort,

    /// Email already registered.
    #[error("Email already in use")]
    EmailTaken,

    /// Every broker account is already assigned to a user.
    #[error("No available blockchain addresses")]
    AddressExhausted,

    /// Invalid credentials (wrong password or unknown email).
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Missing, malformed, or unverifiable bearer token.
    #[error("Invalid Bearer token")]
    InvalidToken,

    /// User not found.
    #[error("User not found")]
    UserNotFound,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Token issuance error.
    #[error("token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Address encryption error.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Broker call failed.
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),
}

//! Unified error handling for the API surface.
//!
//! Provides a unified `AppError` type that maps workflow failures onto HTTP
//! status codes with human-readable bodies. All route handlers return
//! `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::broker::BrokerError;
use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::crypto::CryptoError;

/// Application-level error type for the backend.
#[derive(Debug, Error)]
pub enum AppError {
    /// User input failed a precondition. Surfaced as 400 with the message.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request carried no valid authenticated principal.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization/ownership violation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate email or SKU.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Authentication workflow failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Broker call failed.
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Address encryption/decryption failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(
            self,
            Self::Database(_) | Self::Crypto(_) | Self::Internal(_) | Self::Broker(_)
        ) {
            tracing::error!(error = %self, "Request error");
        }

        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Auth(err) => auth_status(err),
            Self::Broker(err) => broker_status(err),
            Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Crypto(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) | Self::Crypto(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Auth(err) => err.to_string(),
            Self::Broker(err) => match err {
                BrokerError::Status { body, .. } => format!("Broker responded with error: {body}"),
                BrokerError::Unavailable(_) => "Broker unavailable".to_string(),
                BrokerError::Parse(_) => "Internal server error".to_string(),
            },
            Self::Validation(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg) => msg.clone(),
        };

        (status, message).into_response()
    }
}

fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        // UserNotFound only arises from refresh, where the subject comes out
        // of a signed token; treat it like any other bad token.
        AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::UserNotFound => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::EmailTaken | AuthError::AddressExhausted => StatusCode::CONFLICT,
        AuthError::MissingFields
        | AuthError::InvalidEmail(_)
        | AuthError::WeakPassword(_)
        | AuthError::NameTooShort => StatusCode::BAD_REQUEST,
        AuthError::Repository(_)
        | AuthError::Jwt(_)
        | AuthError::Crypto(_)
        | AuthError::PasswordHash => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AuthError::Broker(err) => broker_status(err),
    }
}

fn broker_status(err: &BrokerError) -> StatusCode {
    match err {
        BrokerError::Status { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        BrokerError::Unavailable(_) => StatusCode::BAD_GATEWAY,
        BrokerError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("shipment 7".to_string());
        assert_eq!(err.to_string(), "Not found: shipment 7");

        let err = AppError::Validation("units must be greater than 0".to_string());
        assert_eq!(
            err.to_string(),
            "Validation error: units must be greater than 0"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("no token".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("not a participant".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Conflict("email in use".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_broker_status_passthrough() {
        let err = AppError::Broker(BrokerError::Status {
            status: 422,
            body: "invalid transfer".to_string(),
        });
        assert_eq!(get_status(err), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

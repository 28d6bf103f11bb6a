//! Authentication extractor for bearer-token protected routes.
//!
//! A request is authenticated when its bearer token verifies against the
//! signing secret AND its digest is on record as neither revoked nor
//! expired. Token sweeps at login/refresh therefore cut off older sessions
//! even before their JWTs lapse.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::db::tokens::TokenRepository;
use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::services::jwt::JwtKeys;
use crate::state::AppState;

/// Extractor providing the authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        let claims = state
            .jwt()
            .validate(token)
            .map_err(|_| AppError::Unauthorized("Invalid bearer token".to_string()))?;

        let stored = TokenRepository::new(state.pool())
            .get_by_hash(&JwtKeys::hash_token(token))
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown bearer token".to_string()))?;
        if !stored.is_valid() {
            return Err(AppError::Unauthorized("Token has been revoked".to_string()));
        }

        let user = UserRepository::new(state.pool())
            .get_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

        Ok(Self(user))
    }
}

//! Authentication route handlers.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthService, TokenPair};
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authenticated user details.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub name: String,
    pub email: String,
    /// Plain (decrypted) broker account address.
    pub blockchain_address: String,
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<TokenPair>> {
    let auth = AuthService::new(state.pool(), state.jwt(), state.cipher(), state.broker());
    let pair = auth
        .register(&request.name, &request.email, &request.password)
        .await?;
    Ok(Json(pair))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenPair>> {
    let auth = AuthService::new(state.pool(), state.jwt(), state.cipher(), state.broker());
    let pair = auth.login(&request.email, &request.password).await?;
    Ok(Json(pair))
}

/// `POST /auth/refresh`
///
/// Expects the refresh token in the `Authorization: Bearer` header.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenPair>> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let auth = AuthService::new(state.pool(), state.jwt(), state.cipher(), state.broker());
    let pair = auth.refresh(auth_header).await?;
    Ok(Json(pair))
}

/// `GET /api/user`
pub async fn user_details(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserDetails>> {
    let blockchain_address = state.cipher().decrypt(&user.blockchain_address)?;
    Ok(Json(UserDetails {
        name: user.name,
        email: user.email.into_inner(),
        blockchain_address,
    }))
}

//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness probe
//! GET  /health/ready                  - Readiness probe (DB ping)
//!
//! # Auth (no bearer token required)
//! POST /auth/register                 - Create account, returns token pair
//! POST /auth/login                    - Login, returns token pair
//! POST /auth/refresh                  - Exchange refresh token for access token
//!
//! # Authenticated API
//! GET  /api/user                      - Current user details
//! POST /api/shipment/create           - Create shipment on chain + mirror
//! GET  /api/shipment/{id}             - On-chain shipment with local SKU
//! GET  /api/shipment/nextId           - Proxied next shipment id
//! POST /api/transfer/create           - Transfer of custody
//! GET  /api/transfer/{sku}            - Transfer history (participants only)
//! GET  /api/transfer/nextId           - Proxied next transfer id
//! GET  /api/records/shipment/{id}     - Mirror record
//! GET  /api/records/stats             - Shipment statistics
//! GET  /api/records/participant       - Records the caller participates in
//! GET  /api/records/owner             - Records the caller owns
//! GET  /api/notification              - Unread notifications, newest first
//! POST /api/notification/read/{id}    - Mark one notification read
//! POST /api/notification/read         - Mark all notifications read
//! ```

pub mod auth;
pub mod notifications;
pub mod records;
pub mod shipments;
pub mod transfers;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .nest("/auth", auth_routes())
        .route("/api/user", get(auth::user_details))
        .nest("/api/shipment", shipment_routes())
        .nest("/api/transfer", transfer_routes())
        .nest("/api/records", record_routes())
        .nest("/api/notification", notification_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
}

fn shipment_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(shipments::create))
        .route("/nextId", get(shipments::next_id))
        .route("/{id}", get(shipments::get_shipment))
}

fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(transfers::create))
        .route("/nextId", get(transfers::next_id))
        .route("/{sku}", get(transfers::history))
}

fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/shipment/{id}", get(records::get_record))
        .route("/stats", get(records::statistics))
        .route("/participant", get(records::by_participant))
        .route("/owner", get(records::by_owner))
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::unread))
        .route("/read", post(notifications::mark_all_read))
        .route("/read/{id}", post(notifications::mark_read))
}

/// Liveness probe.
async fn health() -> &'static str {
    "OK"
}

/// Readiness probe: verifies the database answers.
async fn ready(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    sqlx::query("SELECT 1")
        .execute(state.pool())
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok("READY")
}

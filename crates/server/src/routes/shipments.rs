//! Shipment route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use blocked_supply_core::ShipmentId;

use crate::broker::NextShipmentId;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::ShipmentRecord;
use crate::services::shipments::{ShipmentInput, ShipmentOutput, ShipmentService};
use crate::state::AppState;

/// `POST /api/shipment/create`
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<ShipmentInput>,
) -> Result<(StatusCode, Json<ShipmentRecord>)> {
    let record = ShipmentService::new(&state).create(&user, &input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /api/shipment/{id}`
pub async fn get_shipment(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ShipmentOutput>> {
    let output = ShipmentService::new(&state).get(ShipmentId::new(id)).await?;
    Ok(Json(output))
}

/// `GET /api/shipment/nextId`
pub async fn next_id(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<NextShipmentId>> {
    let next = ShipmentService::new(&state).next_id().await?;
    Ok(Json(next))
}

//! Mirror-record route handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use blocked_supply_core::ShipmentId;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::ShipmentRecord;
use crate::services::records::{RecordService, ShipmentStatistics};
use crate::state::AppState;

/// `GET /api/records/shipment/{id}`
pub async fn get_record(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ShipmentRecord>> {
    let record = RecordService::new(&state).get(ShipmentId::new(id)).await?;
    Ok(Json(record))
}

/// `GET /api/records/stats`
pub async fn statistics(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<ShipmentStatistics>> {
    let stats = RecordService::new(&state).statistics().await?;
    Ok(Json(stats))
}

/// `GET /api/records/participant`
pub async fn by_participant(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ShipmentRecord>>> {
    let records = RecordService::new(&state).by_participant(user.id).await?;
    Ok(Json(records))
}

/// `GET /api/records/owner`
pub async fn by_owner(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ShipmentRecord>>> {
    let records = RecordService::new(&state).by_owner(user.id).await?;
    Ok(Json(records))
}

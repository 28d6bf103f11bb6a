//! Transfer route handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::broker::NextTransferId;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::services::transfers::{TransferInput, TransferOutput, TransferService};
use crate::state::AppState;

/// `POST /api/transfer/create`
///
/// Responds with the broker's confirmation payload verbatim.
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<TransferInput>,
) -> Result<Json<serde_json::Value>> {
    let confirmation = TransferService::new(&state).transfer(&user, &input).await?;
    Ok(Json(confirmation))
}

/// `GET /api/transfer/{sku}`
pub async fn history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(sku): Path<String>,
) -> Result<Json<Vec<TransferOutput>>> {
    let transfers = TransferService::new(&state).history(&user, &sku).await?;
    Ok(Json(transfers))
}

/// `GET /api/transfer/nextId`
pub async fn next_id(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<NextTransferId>> {
    let next = TransferService::new(&state).next_id().await?;
    Ok(Json(next))
}

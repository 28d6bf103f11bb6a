//! Shipment creation and lookup workflows.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use blocked_supply_core::{ShipmentId, ShipmentState};

use crate::broker::{CreateShipmentRequest, NextShipmentId};
use crate::db::shipments::ShipmentRecordRepository;
use crate::error::{AppError, Result};
use crate::models::{ShipmentRecord, User};
use crate::services::transfers::{TransferInput, TransferService};
use crate::state::AppState;

const MAX_WEIGHT: i64 = 10_000;

/// Client input for shipment creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentInput {
    pub product_name: String,
    pub description: String,
    pub origin: String,
    pub destination: String,
    /// Expected delivery date, `yyyy-MM-dd`.
    pub delivery_date: String,
    pub units: i64,
    pub weight: i64,
}

/// On-chain shipment decorated with local data for clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentOutput {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub origin: String,
    pub destination: String,
    pub delivery_date: String,
    pub units: i64,
    pub weight: i64,
    pub current_state: ShipmentState,
    /// Email of the owning user, not their chain address.
    pub current_owner: String,
}

/// Shipment workflow service.
pub struct ShipmentService<'a> {
    state: &'a AppState,
}

impl<'a> ShipmentService<'a> {
    /// Create a new shipment service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Create a shipment on chain and mirror it locally.
    ///
    /// Validation happens before the broker is contacted; on broker failure
    /// no mirror record exists. The creator becomes sole owner and
    /// participant, and an initial transfer (state CREATED, at the
    /// shipment's origin) is recorded on chain through the normal transfer
    /// workflow.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for rejected input, broker errors
    /// verbatim.
    pub async fn create(&self, user: &User, input: &ShipmentInput) -> Result<ShipmentRecord> {
        let delivery_date = validate_create_input(input)?;

        let from = self.state.cipher().decrypt(&user.blockchain_address)?;
        let response = self
            .state
            .broker()
            .create_shipment(&CreateShipmentRequest {
                product_name: input.product_name.clone(),
                description: input.description.clone(),
                origin: input.origin.clone(),
                destination: input.destination.clone(),
                delivery_date: input.delivery_date.clone(),
                units: input.units,
                weight: input.weight,
                from,
            })
            .await?;

        let shipment_id = ShipmentId::new(response.id);
        let record = ShipmentRecord::new(
            shipment_id,
            user.blockchain_address.clone(),
            delivery_date,
            user.id,
        );
        ShipmentRecordRepository::new(self.state.pool())
            .insert(&record)
            .await?;
        tracing::info!(%shipment_id, sku = %record.sku, "Shipment mirrored");

        // Record the creation itself as the first on-chain transfer.
        TransferService::new(self.state)
            .transfer(
                user,
                &TransferInput {
                    shipment_id: shipment_id.as_i64(),
                    new_shipment_owner: user.email.as_str().to_string(),
                    new_state: ShipmentState::Created.as_i64(),
                    location: input.origin.clone(),
                    transfer_notes: Some("Shipment created".to_string()),
                },
            )
            .await?;

        ShipmentRecordRepository::new(self.state.pool())
            .get_by_id(shipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Shipment record not found".to_string()))
    }

    /// Fetch the on-chain shipment, decorated with the local SKU and the
    /// owner resolved to a user email.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no mirror record exists, broker
    /// errors verbatim, `AppError::Internal` if the on-chain owner is not a
    /// registered user.
    pub async fn get(&self, shipment_id: ShipmentId) -> Result<ShipmentOutput> {
        let record = ShipmentRecordRepository::new(self.state.pool())
            .get_by_id(shipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Shipment record not found".to_string()))?;

        let shipment = self.state.broker().shipment(shipment_id.as_i64()).await?;

        let current_state = ShipmentState::from_i64(shipment.current_state)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let encrypted_owner = self.state.cipher().encrypt(&shipment.current_owner)?;
        let owner = crate::db::users::UserRepository::new(self.state.pool())
            .get_by_address(&encrypted_owner)
            .await?
            .ok_or_else(|| {
                AppError::Internal("shipment owner is not a registered user".to_string())
            })?;

        Ok(ShipmentOutput {
            id: shipment.id,
            sku: record.sku.into_inner(),
            name: shipment.name,
            description: shipment.description,
            origin: shipment.origin,
            destination: shipment.destination,
            delivery_date: shipment.delivery_date,
            units: shipment.units,
            weight: shipment.weight,
            current_state,
            current_owner: owner.email.into_inner(),
        })
    }

    /// Next shipment id the contract will assign, proxied from the broker.
    ///
    /// # Errors
    ///
    /// Returns broker errors verbatim.
    pub async fn next_id(&self) -> Result<NextShipmentId> {
        Ok(self.state.broker().next_shipment_id().await?)
    }
}

/// Validate shipment input; first failure wins. Returns the parsed
/// delivery deadline (end of the given local day).
fn validate_create_input(input: &ShipmentInput) -> Result<DateTime<Utc>> {
    let name = input.product_name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Product name cannot be empty".to_string()));
    }
    if input.product_name.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Product name cannot contain numbers".to_string(),
        ));
    }
    if input.product_name.len() < 3 || input.product_name.len() > 100 {
        return Err(AppError::Validation(
            "Product name must contain a minimum of 3 and a maximum of 100 characters".to_string(),
        ));
    }

    if input.description.trim().is_empty() {
        return Err(AppError::Validation("Description cannot be null".to_string()));
    }
    if input.description.len() > 500 {
        return Err(AppError::Validation(
            "Description cannot exceed 500 characters long".to_string(),
        ));
    }

    if input.origin.trim().is_empty() || input.destination.trim().is_empty() {
        return Err(AppError::Validation(
            "Origin and destination cannot be empty".to_string(),
        ));
    }
    if input.origin == input.destination {
        return Err(AppError::Validation(
            "Origin must be different to destination".to_string(),
        ));
    }

    if input.delivery_date.trim().is_empty() {
        return Err(AppError::Validation("Delivery date cannot be empty".to_string()));
    }
    let delivery_date = parse_delivery_date(&input.delivery_date)?;
    if delivery_date <= Utc::now() {
        return Err(AppError::Validation("Delivery date must be future".to_string()));
    }

    if input.units <= 0 {
        return Err(AppError::Validation("Units must be greater than 0".to_string()));
    }
    if input.weight <= 0 {
        return Err(AppError::Validation("Weight must be greater than 0".to_string()));
    }
    if input.weight > MAX_WEIGHT {
        return Err(AppError::Validation(
            "The weight exceeds the maximum available".to_string(),
        ));
    }

    Ok(delivery_date)
}

/// Parse a `yyyy-MM-dd` date into the delivery deadline, 23:59 local time
/// on that day.
fn parse_delivery_date(date: &str) -> Result<DateTime<Utc>> {
    let invalid =
        || AppError::Validation("Date format invalid, it must be as yyyy-MM-dd".to_string());

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())?;
    let deadline = date.and_time(NaiveTime::MIN) + Duration::minutes(23 * 60 + 59);
    let local = deadline
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(invalid)?;
    Ok(local.with_timezone(&Utc))
}

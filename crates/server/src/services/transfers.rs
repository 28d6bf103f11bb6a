//! Transfer-of-custody workflow.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use blocked_supply_core::{ShipmentId, ShipmentState};

use crate::broker::{NextTransferId, TransferRequest};
use crate::db::notifications::NotificationRepository;
use crate::db::shipments::ShipmentRecordRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::state::AppState;

const MAX_NOTES_LENGTH: usize = 100;

/// Client input for a transfer of custody.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInput {
    pub shipment_id: i64,
    /// Email of the receiving user.
    pub new_shipment_owner: String,
    pub new_state: i64,
    pub location: String,
    pub transfer_notes: Option<String>,
}

/// One transfer history entry for clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutput {
    pub id: i64,
    pub shipment_id: i64,
    pub timestamp: i64,
    pub new_state: ShipmentState,
    pub location: String,
    /// Email of the receiving user, "Unknown" if no user holds the address.
    pub new_shipment_owner: String,
    pub transfer_notes: String,
}

/// Transfer workflow service.
pub struct TransferService<'a> {
    state: &'a AppState,
}

impl<'a> TransferService<'a> {
    /// Create a new transfer service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Execute a transfer on chain and apply it to the mirror record.
    ///
    /// The mirror update runs under the per-shipment lock, so concurrent
    /// transfers of the same shipment apply in sequence. When the receiving
    /// user differs from the actor, they get a notification. Returns the
    /// broker's confirmation payload verbatim.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for rejected input,
    /// `AppError::NotFound` for unknown shipments or receivers, broker
    /// errors verbatim.
    pub async fn transfer(
        &self,
        actor: &User,
        input: &TransferInput,
    ) -> Result<serde_json::Value> {
        let shipment_id = ShipmentId::new(input.shipment_id);
        let records = ShipmentRecordRepository::new(self.state.pool());
        records
            .get_by_id(shipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Shipment not found".to_string()))?;

        let notes = validate_transfer_input(input)?;

        let users = UserRepository::new(self.state.pool());
        let new_owner = users
            .get_by_email(&input.new_shipment_owner)
            .await?
            .ok_or_else(|| AppError::NotFound("New owner not found".to_string()))?;

        let from = self.state.cipher().decrypt(&actor.blockchain_address)?;
        let new_owner_address = self.state.cipher().decrypt(&new_owner.blockchain_address)?;

        let _guard = self.state.lock_shipment(shipment_id).await;

        let (confirmation, raw) = self
            .state
            .broker()
            .transfer(
                input.shipment_id,
                &TransferRequest {
                    shipment_id: input.shipment_id,
                    new_shipment_owner: new_owner_address,
                    new_state: input.new_state,
                    location: input.location.clone(),
                    transfer_notes: notes.clone(),
                    from,
                },
            )
            .await?;

        let new_state = ShipmentState::from_i64(confirmation.new_state)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let mut record = records
            .get_by_id(shipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Shipment record not found".to_string()))?;
        record.state = new_state;
        if new_state == ShipmentState::Delivered {
            record.delivered_at = Some(Utc::now());
        }
        record.owner_address = new_owner.blockchain_address.clone();
        record.add_participant(new_owner.id);
        records.update(&record).await?;
        tracing::info!(%shipment_id, state = new_state.as_str(), "Transfer applied");

        if actor.id != new_owner.id {
            let message = format!(
                "A user with email {} transferred a shipment to you. State: {}. Notes: {}",
                actor.email,
                new_state.as_str(),
                notes
            );
            NotificationRepository::new(self.state.pool())
                .create(new_owner.id, &message)
                .await?;
        }

        Ok(raw)
    }

    /// Transfer history of the shipment behind `sku`, oldest first as the
    /// chain reports it. The caller must be a participant.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown SKU,
    /// `AppError::Forbidden` when the caller never held the shipment,
    /// broker errors verbatim.
    pub async fn history(&self, user: &User, sku: &str) -> Result<Vec<TransferOutput>> {
        let record = ShipmentRecordRepository::new(self.state.pool())
            .get_by_sku(sku)
            .await?
            .ok_or_else(|| AppError::NotFound("Shipment not found".to_string()))?;

        if !record.participants.contains(&user.id) {
            return Err(AppError::Forbidden(
                "User is not a participant of this shipment".to_string(),
            ));
        }

        let transfers = self
            .state
            .broker()
            .transfers(record.shipment_id.as_i64())
            .await?;

        let users = UserRepository::new(self.state.pool());
        let mut outputs = Vec::with_capacity(transfers.len());
        for transfer in transfers {
            let new_state = ShipmentState::from_i64(transfer.new_state)
                .map_err(|e| AppError::Internal(e.to_string()))?;

            let encrypted = self.state.cipher().encrypt(&transfer.new_shipment_owner)?;
            let email = users
                .get_by_address(&encrypted)
                .await?
                .map_or_else(|| "Unknown".to_string(), |u| u.email.into_inner());

            outputs.push(TransferOutput {
                id: transfer.id,
                shipment_id: transfer.shipment_id,
                timestamp: transfer.timestamp,
                new_state,
                location: transfer.location,
                new_shipment_owner: email,
                transfer_notes: transfer.transfer_notes,
            });
        }

        Ok(outputs)
    }

    /// Next transfer id the contract will assign, proxied from the broker.
    ///
    /// # Errors
    ///
    /// Returns broker errors verbatim.
    pub async fn next_id(&self) -> Result<NextTransferId> {
        Ok(self.state.broker().next_transfer_id().await?)
    }
}

/// Validate transfer input; first failure wins. Returns the notes to send,
/// empty string when absent.
fn validate_transfer_input(input: &TransferInput) -> Result<String> {
    if input.shipment_id <= 0 {
        return Err(AppError::Validation("Invalid shipment ID".to_string()));
    }
    if input.new_shipment_owner.trim().is_empty() {
        return Err(AppError::Validation(
            "New shipment owner cannot be empty".to_string(),
        ));
    }
    if ShipmentState::from_i64(input.new_state).is_err() {
        return Err(AppError::Validation("Invalid new state".to_string()));
    }
    if input.location.trim().is_empty() {
        return Err(AppError::Validation("Location cannot be empty".to_string()));
    }
    if input.location.len() < 3 || input.location.len() > 100 {
        return Err(AppError::Validation(
            "Location must contain a minimum of 3 and a maximum of 100 characters".to_string(),
        ));
    }
    let notes = input.transfer_notes.clone().unwrap_or_default();
    if notes.len() > MAX_NOTES_LENGTH {
        return Err(AppError::Validation(
            "Transfer notes must contain a maximum of 100 characters".to_string(),
        ));
    }
    Ok(notes)
}

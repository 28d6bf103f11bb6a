//! Shipment mirror record model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use blocked_supply_core::{ShipmentId, ShipmentState, Sku, UserId};

/// Local denormalized copy of a broker shipment.
///
/// Keyed by the broker-assigned shipment id. Created when the broker
/// confirms shipment creation, mutated on every successful transfer, never
/// deleted. Users are referenced by plain id values only - the broker is
/// the source of truth for identities, so no relational integrity is
/// enforced here.
///
/// Invariants:
/// - `owner_id` is always the most recently added participant.
/// - `participants` preserves insertion order, holds no duplicates, and
///   only ever grows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRecord {
    pub shipment_id: ShipmentId,
    pub sku: Sku,
    /// Encrypted (at-rest) form of the current owner's broker address.
    pub owner_address: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub delivery_date: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub state: ShipmentState,
    pub participants: Vec<UserId>,
}

impl ShipmentRecord {
    /// Create a fresh mirror record with the given user as sole
    /// participant and owner, state CREATED, and a newly generated SKU.
    #[must_use]
    pub fn new(
        shipment_id: ShipmentId,
        owner_address: String,
        delivery_date: DateTime<Utc>,
        owner: UserId,
    ) -> Self {
        let mut record = Self {
            shipment_id,
            sku: Sku::generate(),
            owner_address,
            owner_id: owner,
            created_at: Utc::now(),
            delivery_date,
            delivered_at: None,
            state: ShipmentState::Created,
            participants: Vec::new(),
        };
        record.add_participant(owner);
        record
    }

    /// Make `participant_id` the current owner, appending it to the
    /// participant set if not already present.
    pub fn add_participant(&mut self, participant_id: UserId) {
        self.owner_id = participant_id;
        if !self.participants.contains(&participant_id) {
            self.participants.push(participant_id);
        }
    }
}

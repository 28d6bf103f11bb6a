//! Wire types for the broker API.
//!
//! The broker serializes on-chain integers as decimal strings (`"7"`), but
//! plain numbers also appear depending on the field. Every integer field
//! here goes through [`int_or_string`] so both forms land as `i64`.

use serde::{Deserialize, Serialize};

/// Deserialize an `i64` from either a JSON number or a decimal string.
pub(crate) mod int_or_string {
    use serde::{Deserialize, Deserializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Str(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match IntOrString::deserialize(deserializer)? {
            IntOrString::Int(n) => Ok(n),
            IntOrString::Str(s) => s
                .parse()
                .map_err(|_| de::Error::custom(format!("invalid integer string: {s}"))),
        }
    }
}

/// `GET /api/accounts` response.
#[derive(Debug, Deserialize)]
pub struct AccountsResponse {
    pub accounts: Vec<String>,
}

/// `POST /api/shipments` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    pub product_name: String,
    pub description: String,
    pub origin: String,
    pub destination: String,
    /// Formatted as `yyyy-MM-dd`; passed through to the chain verbatim.
    pub delivery_date: String,
    pub units: i64,
    pub weight: i64,
    /// Plain (decrypted) broker address of the sender.
    pub from: String,
}

/// `POST /api/shipments` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentResponse {
    #[serde(with = "int_or_string")]
    pub id: i64,
    pub current_owner: String,
    pub delivery_date: String,
}

/// `GET /api/shipments/{id}` response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerShipment {
    #[serde(deserialize_with = "int_or_string::deserialize")]
    pub id: i64,
    pub name: String,
    pub description: String,
    pub origin: String,
    pub destination: String,
    pub delivery_date: String,
    #[serde(deserialize_with = "int_or_string::deserialize")]
    pub units: i64,
    #[serde(deserialize_with = "int_or_string::deserialize")]
    pub weight: i64,
    #[serde(deserialize_with = "int_or_string::deserialize")]
    pub current_state: i64,
    pub current_owner: String,
}

/// `GET /api/shipments/next-id` response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextShipmentId {
    #[serde(deserialize_with = "int_or_string::deserialize")]
    pub next_shipment_id: i64,
}

/// `GET /api/transfers/next-id` response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextTransferId {
    #[serde(deserialize_with = "int_or_string::deserialize")]
    pub next_transfer_id: i64,
}

/// `POST /api/shipments/{id}/transfer` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub shipment_id: i64,
    /// Plain (decrypted) broker address of the receiving party.
    pub new_shipment_owner: String,
    pub new_state: i64,
    pub location: String,
    pub transfer_notes: String,
    /// Plain (decrypted) broker address of the sender.
    pub from: String,
}

/// `POST /api/shipments/{id}/transfer` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferConfirmation {
    #[serde(with = "int_or_string")]
    pub shipment_id: i64,
    pub new_owner: String,
    #[serde(with = "int_or_string")]
    pub new_state: i64,
}

/// One entry of `GET /api/shipments/{id}/transfers`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerTransfer {
    #[serde(with = "int_or_string")]
    pub id: i64,
    #[serde(with = "int_or_string")]
    pub shipment_id: i64,
    #[serde(with = "int_or_string")]
    pub timestamp: i64,
    #[serde(with = "int_or_string")]
    pub new_state: i64,
    pub location: String,
    pub new_shipment_owner: String,
    pub transfer_notes: String,
}

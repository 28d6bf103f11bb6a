//! HTTP client for the blockchain broker.
//!
//! The broker fronts the smart contract and is the source of truth for
//! shipment state. This client owns the base URL, request timeout, and the
//! translation of non-success responses into [`BrokerError`]. All addresses
//! crossing this boundary are plain (decrypted) broker account addresses.

mod types;

pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ServerConfig;

/// Errors from broker API calls.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The broker answered with a non-success status.
    #[error("broker returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The broker could not be reached.
    #[error("broker unreachable: {0}")]
    Unavailable(String),

    /// The broker answered with a payload this client cannot interpret.
    #[error("unexpected broker payload: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for BrokerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

/// Broker API client.
#[derive(Clone)]
pub struct BrokerClient {
    inner: Arc<BrokerClientInner>,
}

struct BrokerClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl BrokerClient {
    /// Create a new broker client from server configuration.
    ///
    /// # Errors
    ///
    /// Returns `BrokerError::Unavailable` if the HTTP client fails to build.
    pub fn new(config: &ServerConfig) -> Result<Self, BrokerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.broker_timeout_secs))
            .build()?;

        Ok(Self {
            inner: Arc::new(BrokerClientInner {
                client,
                base_url: config.broker_url.clone(),
            }),
        })
    }

    /// All broker account addresses.
    ///
    /// # Errors
    ///
    /// Returns `BrokerError` if the call fails.
    pub async fn accounts(&self) -> Result<Vec<String>, BrokerError> {
        let response: AccountsResponse = self.get("/api/accounts").await?;
        Ok(response.accounts)
    }

    /// Create a shipment on chain.
    ///
    /// # Errors
    ///
    /// Returns `BrokerError` if the call fails.
    pub async fn create_shipment(
        &self,
        request: &CreateShipmentRequest,
    ) -> Result<CreateShipmentResponse, BrokerError> {
        self.post("/api/shipments", request).await
    }

    /// Fetch the full on-chain shipment.
    ///
    /// # Errors
    ///
    /// Returns `BrokerError` if the call fails.
    pub async fn shipment(&self, shipment_id: i64) -> Result<BrokerShipment, BrokerError> {
        self.get(&format!("/api/shipments/{shipment_id}")).await
    }

    /// Next shipment id the contract will assign.
    ///
    /// # Errors
    ///
    /// Returns `BrokerError` if the call fails.
    pub async fn next_shipment_id(&self) -> Result<NextShipmentId, BrokerError> {
        self.get("/api/shipments/next-id").await
    }

    /// Execute a transfer of custody on chain.
    ///
    /// # Errors
    ///
    /// Returns `BrokerError` if the call fails.
    pub async fn transfer(
        &self,
        shipment_id: i64,
        request: &TransferRequest,
    ) -> Result<(TransferConfirmation, serde_json::Value), BrokerError> {
        let raw: serde_json::Value = self
            .post(&format!("/api/shipments/{shipment_id}/transfer"), request)
            .await?;
        let confirmation =
            serde_json::from_value(raw.clone()).map_err(|e| BrokerError::Parse(e.to_string()))?;
        Ok((confirmation, raw))
    }

    /// Full transfer history of a shipment.
    ///
    /// # Errors
    ///
    /// Returns `BrokerError` if the call fails.
    pub async fn transfers(&self, shipment_id: i64) -> Result<Vec<BrokerTransfer>, BrokerError> {
        self.get(&format!("/api/shipments/{shipment_id}/transfers"))
            .await
    }

    /// Next transfer id the contract will assign.
    ///
    /// # Errors
    ///
    /// Returns `BrokerError` if the call fails.
    pub async fn next_transfer_id(&self) -> Result<NextTransferId, BrokerError> {
        self.get("/api/transfers/next-id").await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BrokerError> {
        let url = format!("{}{path}", self.inner.base_url);
        tracing::debug!(%url, "Broker GET");
        let response = self.inner.client.get(&url).send().await?;
        Self::parse_response(response).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BrokerError> {
        let url = format!("{}{path}", self.inner.base_url);
        tracing::debug!(%url, "Broker POST");
        let response = self.inner.client.post(&url).json(body).send().await?;
        Self::parse_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BrokerError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BrokerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| BrokerError::Parse(e.to_string()))
    }
}

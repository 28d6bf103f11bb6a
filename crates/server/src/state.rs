//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sqlx::SqlitePool;
use tokio::sync::OwnedMutexGuard;

use blocked_supply_core::ShipmentId;

use crate::broker::{BrokerClient, BrokerError};
use crate::config::ServerConfig;
use crate::services::crypto::{AddressCipher, CryptoError};
use crate::services::jwt::JwtKeys;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: SqlitePool,
    broker: BrokerClient,
    cipher: AddressCipher,
    jwt: JwtKeys,
    shipment_locks: ShipmentLocks,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the encryption key is invalid or the broker
    /// client fails to build.
    pub fn new(config: ServerConfig, pool: SqlitePool) -> Result<Self, StateError> {
        let broker = BrokerClient::new(&config)?;
        let cipher = AddressCipher::new(&config.encryption_key)?;
        let jwt = JwtKeys::new(
            &config.jwt_secret,
            config.jwt_expiration_secs,
            config.jwt_refresh_expiration_secs,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                broker,
                cipher,
                jwt,
                shipment_locks: ShipmentLocks::default(),
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the broker API client.
    #[must_use]
    pub fn broker(&self) -> &BrokerClient {
        &self.inner.broker
    }

    /// Get a reference to the address cipher.
    #[must_use]
    pub fn cipher(&self) -> &AddressCipher {
        &self.inner.cipher
    }

    /// Get a reference to the JWT keys.
    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }

    /// Acquire the per-shipment transfer lock.
    ///
    /// Held across the mirror-record read/modify/write of a transfer so
    /// concurrent transfers of the same shipment apply in sequence.
    pub async fn lock_shipment(&self, shipment_id: ShipmentId) -> OwnedMutexGuard<()> {
        self.inner.shipment_locks.lock(shipment_id).await
    }
}

/// Keyed mutexes, one per shipment id.
///
/// Lock entries are created on first use and kept for the process lifetime;
/// the shipment id space is small enough that this never needs eviction.
#[derive(Default)]
struct ShipmentLocks {
    locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl ShipmentLocks {
    async fn lock(&self, shipment_id: ShipmentId) -> OwnedMutexGuard<()> {
        let lock = {
            #[allow(clippy::unwrap_used)]
            let mut locks = self.locks.lock().unwrap();
            Arc::clone(
                locks
                    .entry(shipment_id.as_i64())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }
}

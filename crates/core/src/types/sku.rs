//! Locally generated human-readable shipment identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A shipment SKU.
///
/// SKUs are generated locally when a mirror record is created and are
/// distinct from the broker's numeric shipment id. Format: `SKU-` followed
/// by eight upper-case hex characters. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    /// Generate a fresh SKU.
    #[must_use]
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        // The first 8 hex chars of a v4 uuid are random
        Self(format!("SKU-{}", uuid[..8].to_uppercase()))
    }

    /// Wrap an existing SKU string (as loaded from the database).
    #[must_use]
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Returns the SKU as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Sku` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sku {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

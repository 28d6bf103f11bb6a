//! Issued-token model.

use chrono::{DateTime, Utc};

use blocked_supply_core::{TokenId, UserId};

/// A persisted access token.
///
/// Only the SHA-256 digest of the signed token is stored. Issuing a new
/// token marks all of a user's prior tokens revoked and expired in the same
/// transaction; rows are never deleted, so validity is a read-time check.
#[derive(Debug, Clone)]
pub struct Token {
    pub id: TokenId,
    pub user_id: UserId,
    pub token_hash: String,
    pub token_type: String,
    pub revoked: bool,
    pub expired: bool,
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// A token is usable only while neither flag is set.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !self.revoked && !self.expired
    }
}

//! User model.

use chrono::{DateTime, Utc};

use blocked_supply_core::{Email, UserId};

/// A registered user.
///
/// `blockchain_address` holds the AES-encrypted, base64 form of the user's
/// broker account address. It is assigned once at registration, is unique
/// across users, and is never reassigned. The plain address only exists in
/// memory on its way to the broker or the client.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub blockchain_address: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

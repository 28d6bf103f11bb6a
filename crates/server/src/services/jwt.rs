//! JWT token issuance and validation.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use blocked_supply_core::UserId;

use crate::models::User;

/// Claims carried by both access and refresh tokens.
///
/// `sub` is the user's email; `id` and `name` are convenience claims so
/// clients can render the signed-in user without an extra request. `jti`
/// makes every issued token unique even within the same second, which the
/// per-token revocation records rely on.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub id: i64,
    pub sub: String,
    pub name: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::new(self.id)
    }
}

/// Manages JWT token creation and validation.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl JwtKeys {
    /// Create new keys from the shared signing secret.
    #[must_use]
    pub fn new(secret: &SecretString, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Issue a short-lived access token for the given user.
    ///
    /// # Errors
    ///
    /// Returns an error if token encoding fails.
    pub fn issue_access_token(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue(user, self.access_ttl_secs)
    }

    /// Issue a long-lived refresh token for the given user.
    ///
    /// # Errors
    ///
    /// Returns an error if token encoding fails.
    pub fn issue_refresh_token(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue(user, self.refresh_ttl_secs)
    }

    fn issue(&self, user: &User, ttl_secs: i64) -> Result<String, jsonwebtoken::errors::Error> {
        let now = now_secs();
        let claims = Claims {
            id: user.id.as_i64(),
            sub: user.email.as_str().to_string(),
            name: user.name.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + ttl_secs,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Validate a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, forged, or expired.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }

    /// Hash a token for storage (raw tokens never hit the database).
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

fn now_secs() -> i64 {
    #[allow(clippy::cast_possible_wrap)]
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    secs
}

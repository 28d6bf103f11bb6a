//! Authentication service.
//!
//! Registration, login, and refresh. Registration also claims an unused
//! broker account for the new user; that address is encrypted before it is
//! stored and never handed out again.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::SqlitePool;

use blocked_supply_core::Email;

use crate::broker::BrokerClient;
use crate::db::RepositoryError;
use crate::db::tokens::TokenRepository;
use crate::db::users::UserRepository;
use crate::models::User;
use crate::services::crypto::AddressCipher;
use crate::services::jwt::JwtKeys;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum user name length.
const MIN_NAME_LENGTH: usize = 3;

/// An access/refresh token pair as returned by every auth operation.
#[derive(Debug, serde::Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
    jwt: &'a JwtKeys,
    cipher: &'a AddressCipher,
    broker: &'a BrokerClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        pool: &'a SqlitePool,
        jwt: &'a JwtKeys,
        cipher: &'a AddressCipher,
        broker: &'a BrokerClient,
    ) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
            jwt,
            cipher,
            broker,
        }
    }

    /// Register a new user and issue their first token pair.
    ///
    /// Validation runs before the broker is contacted, in a fixed order so
    /// clients get stable error messages.
    ///
    /// # Errors
    ///
    /// Returns a validation variant for bad input, `AuthError::EmailTaken`
    /// for duplicate emails, `AuthError::AddressExhausted` when the broker
    /// account pool is used up.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<TokenPair, AuthError> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        if self.users.get_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }
        validate_password(password)?;
        if name.len() < MIN_NAME_LENGTH {
            return Err(AuthError::NameTooShort);
        }
        let email = Email::parse(email)?;

        let encrypted_address = self.acquire_address().await?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(name, &email, &password_hash, &encrypted_address)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;
        tracing::info!(user_id = %user.id, "User registered");

        let pair = self.issue_pair(&user)?;
        self.tokens
            .insert(user.id, &JwtKeys::hash_token(&pair.access_token))
            .await?;
        Ok(pair)
    }

    /// Login with email and password.
    ///
    /// Every previously issued access token of the user is revoked; exactly
    /// one valid token exists per user after this returns.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or
    /// the password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, &user.password_hash)?;

        let pair = self.issue_pair(&user)?;
        self.tokens
            .revoke_all_and_insert(user.id, &JwtKeys::hash_token(&pair.access_token))
            .await?;
        tracing::debug!(user_id = %user.id, "User logged in");
        Ok(pair)
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// The refresh token itself is returned unchanged; only access tokens
    /// rotate.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for a missing or unverifiable
    /// header, `AuthError::UserNotFound` if the subject no longer exists.
    pub async fn refresh(&self, auth_header: Option<&str>) -> Result<TokenPair, AuthError> {
        let refresh_token = auth_header
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(AuthError::InvalidToken)?;

        let claims = self
            .jwt
            .validate(refresh_token)
            .map_err(|_| AuthError::InvalidToken)?;

        let user = self
            .users
            .get_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let access_token = self.jwt.issue_access_token(&user)?;
        self.tokens
            .revoke_all_and_insert(user.id, &JwtKeys::hash_token(&access_token))
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }

    /// Claim the first broker account not yet assigned to any user.
    ///
    /// Returns the encrypted form, ready for storage. Deterministic
    /// encryption makes the used-address check a plain set lookup.
    async fn acquire_address(&self) -> Result<String, AuthError> {
        let accounts = self.broker.accounts().await?;
        let used = self.users.list_addresses().await?;

        for account in accounts {
            let encrypted = self.cipher.encrypt(&account)?;
            if !used.contains(&encrypted) {
                return Ok(encrypted);
            }
        }

        Err(AuthError::AddressExhausted)
    }

    fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.jwt.issue_access_token(user)?,
            refresh_token: self.jwt.issue_refresh_token(user)?,
        })
    }
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(
            "Password has to be at least 8 characters long".to_string(),
        ));
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(AuthError::WeakPassword(
            "Password has to contain at least one letter and one number".to_string(),
        ));
    }
    Ok(())
}

/// Hash a password with Argon2.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::db::create_pool_in_memory;
    use base64::Engine as _;
    use secrecy::SecretString;

    fn test_jwt() -> JwtKeys {
        JwtKeys::new(
            &SecretString::from("test-secret-key-long-enough-for-tests"),
            3600,
            86400,
        )
    }

    fn test_cipher() -> AddressCipher {
        let key = base64::engine::general_purpose::STANDARD.encode([9u8; 32]);
        AddressCipher::new(&SecretString::from(key)).unwrap()
    }

    fn test_broker() -> BrokerClient {
        // Points at nothing; only used by paths that fail before any call.
        let config = ServerConfig {
            database_url: SecretString::from("sqlite::memory:"),
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            broker_url: "http://127.0.0.1:1".to_string(),
            broker_timeout_secs: 1,
            jwt_secret: SecretString::from("test-secret-key-long-enough-for-tests"),
            jwt_expiration_secs: 3600,
            jwt_refresh_expiration_secs: 86400,
            encryption_key: SecretString::from(
                base64::engine::general_purpose::STANDARD.encode([9u8; 32]),
            ),
        };
        BrokerClient::new(&config).unwrap()
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("abcdef12").is_ok());
        assert!(matches!(
            validate_password("short1"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("onlyletters"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("12345678"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("secret12").unwrap();
        assert!(verify_password("secret12", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-pw1", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_validation_order() {
        let pool = create_pool_in_memory().await.unwrap();
        let jwt = test_jwt();
        let cipher = test_cipher();
        let broker = test_broker();
        let auth = AuthService::new(&pool, &jwt, &cipher, &broker);

        assert!(matches!(
            auth.register("", "a@bc.de", "abcdef12").await,
            Err(AuthError::MissingFields)
        ));
        assert!(matches!(
            auth.register("Alice", "a@bc.de", "short").await,
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            auth.register("Al", "a@bc.de", "abcdef12").await,
            Err(AuthError::NameTooShort)
        ));
        assert!(matches!(
            auth.register("Alice", "a@bc", "abcdef12").await,
            Err(AuthError::InvalidEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_login_and_refresh_rotate_access_tokens() {
        let pool = create_pool_in_memory().await.unwrap();
        let jwt = test_jwt();
        let cipher = test_cipher();
        let broker = test_broker();
        let auth = AuthService::new(&pool, &jwt, &cipher, &broker);

        let email = Email::parse("alice@example.com").unwrap();
        let hash = hash_password("abcdef12").unwrap();
        let user = UserRepository::new(&pool)
            .create("Alice", &email, &hash, "enc-addr")
            .await
            .unwrap();

        let pair = auth.login("alice@example.com", "abcdef12").await.unwrap();
        assert!(jwt.validate(&pair.access_token).is_ok());

        assert!(matches!(
            auth.login("alice@example.com", "wrong-pw1").await,
            Err(AuthError::InvalidCredentials)
        ));

        let header = format!("Bearer {}", pair.refresh_token);
        let refreshed = auth.refresh(Some(&header)).await.unwrap();
        assert_eq!(refreshed.refresh_token, pair.refresh_token);
        assert_ne!(refreshed.access_token, pair.access_token);

        // old access token is swept, the refreshed one is the only valid one
        let tokens = TokenRepository::new(&pool);
        let valid = tokens.list_valid_for_user(user.id).await.unwrap();
        assert_eq!(valid.len(), 1);
        assert_eq!(
            valid[0].token_hash,
            JwtKeys::hash_token(&refreshed.access_token)
        );
    }

    #[tokio::test]
    async fn test_refresh_rejects_bad_headers() {
        let pool = create_pool_in_memory().await.unwrap();
        let jwt = test_jwt();
        let cipher = test_cipher();
        let broker = test_broker();
        let auth = AuthService::new(&pool, &jwt, &cipher, &broker);

        assert!(matches!(auth.refresh(None).await, Err(AuthError::InvalidToken)));
        assert!(matches!(
            auth.refresh(Some("Basic abc")).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            auth.refresh(Some("Bearer not-a-token")).await,
            Err(AuthError::InvalidToken)
        ));
    }
}

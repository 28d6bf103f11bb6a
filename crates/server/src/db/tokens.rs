//! Token repository.
//!
//! Tokens are persisted as SHA-256 digests of the signed value. Issuing a
//! new token revokes all of the user's prior tokens in the same
//! transaction, which enforces single-active-session semantics at read
//! time without deleting history.

use sqlx::SqlitePool;

use blocked_supply_core::{TokenId, UserId};

use super::{RepositoryError, timestamp_to_datetime, unix_timestamp};
use crate::models::Token;

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: i64,
    user_id: i64,
    token_hash: String,
    token_type: String,
    revoked: i64,
    expired: i64,
    created_at: i64,
}

impl TokenRow {
    fn into_token(self) -> Result<Token, RepositoryError> {
        Ok(Token {
            id: TokenId::new(self.id),
            user_id: UserId::new(self.user_id),
            token_hash: self.token_hash,
            token_type: self.token_type,
            revoked: self.revoked != 0,
            expired: self.expired != 0,
            created_at: timestamp_to_datetime(self.created_at)?,
        })
    }
}

/// Repository for token database operations.
pub struct TokenRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a persisted token by the digest of its signed value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_hash(&self, token_hash: &str) -> Result<Option<Token>, RepositoryError> {
        let row = sqlx::query_as::<_, TokenRow>("SELECT * FROM tokens WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(self.pool)
            .await?;

        row.map(TokenRow::into_token).transpose()
    }

    /// All still-valid tokens for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_valid_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Token>, RepositoryError> {
        let rows = sqlx::query_as::<_, TokenRow>(
            "SELECT * FROM tokens WHERE user_id = ? AND revoked = 0 AND expired = 0",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TokenRow::into_token).collect()
    }

    /// Revoke every prior token for the user and persist a new one, in a
    /// single transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn revoke_all_and_insert(
        &self,
        user_id: UserId,
        token_hash: &str,
    ) -> Result<(), RepositoryError> {
        let now = unix_timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE tokens SET revoked = 1, expired = 1 WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO tokens (user_id, token_hash, token_type, revoked, expired, created_at) \
             VALUES (?, ?, 'BEARER', 0, 0, ?)",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Persist a freshly issued token without touching existing ones
    /// (registration has no priors to revoke).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, user_id: UserId, token_hash: &str) -> Result<(), RepositoryError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO tokens (user_id, token_hash, token_type, revoked, expired, created_at) \
             VALUES (?, ?, 'BEARER', 0, 0, ?)",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::create_pool_in_memory;
    use crate::db::users::UserRepository;
    use blocked_supply_core::Email;

    async fn seed_user(pool: &SqlitePool) -> UserId {
        let email = Email::parse("alice@example.com").unwrap();
        UserRepository::new(pool)
            .create("Alice", &email, "hash", "enc-addr")
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let pool = create_pool_in_memory().await.unwrap();
        let user_id = seed_user(&pool).await;
        let repo = TokenRepository::new(&pool);

        repo.insert(user_id, "digest-1").await.unwrap();

        let token = repo.get_by_hash("digest-1").await.unwrap().unwrap();
        assert_eq!(token.user_id, user_id);
        assert!(token.is_valid());
        assert_eq!(token.token_type, "BEARER");

        assert!(repo.get_by_hash("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_all_and_insert_sweeps_priors() {
        let pool = create_pool_in_memory().await.unwrap();
        let user_id = seed_user(&pool).await;
        let repo = TokenRepository::new(&pool);

        repo.insert(user_id, "digest-1").await.unwrap();
        repo.revoke_all_and_insert(user_id, "digest-2").await.unwrap();

        let old = repo.get_by_hash("digest-1").await.unwrap().unwrap();
        assert!(old.revoked);
        assert!(old.expired);

        let valid = repo.list_valid_for_user(user_id).await.unwrap();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].token_hash, "digest-2");
    }
}

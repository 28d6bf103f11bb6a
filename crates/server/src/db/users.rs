//! User repository.

use sqlx::SqlitePool;

use blocked_supply_core::{Email, UserId};

use super::{RepositoryError, conflict_on_unique, timestamp_to_datetime, unix_timestamp};
use crate::models::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    blockchain_address: String,
    role: String,
    created_at: i64,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(User {
            id: UserId::new(self.id),
            name: self.name,
            email,
            password_hash: self.password_hash,
            blockchain_address: self.blockchain_address,
            role: self.role,
            created_at: timestamp_to_datetime(self.created_at)?,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Get a user by their encrypted blockchain address.
    ///
    /// Encryption is deterministic, so the encrypted form of an address is
    /// a stable lookup key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_address(
        &self,
        encrypted_address: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE blockchain_address = ?")
            .bind(encrypted_address)
            .fetch_optional(self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// All encrypted blockchain addresses currently assigned to users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_addresses(&self) -> Result<Vec<String>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT blockchain_address FROM users")
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(|(addr,)| addr).collect())
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or address is
    /// already registered, `RepositoryError::Database` for other failures.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        encrypted_address: &str,
    ) -> Result<User, RepositoryError> {
        let now = unix_timestamp();

        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (name, email, password_hash, blockchain_address, role, created_at) \
             VALUES (?, ?, ?, ?, 'USER', ?) \
             RETURNING *",
        )
        .bind(name)
        .bind(email.as_str())
        .bind(password_hash)
        .bind(encrypted_address)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email already in use"))?;

        row.into_user()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::create_pool_in_memory;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let pool = create_pool_in_memory().await.unwrap();
        let repo = UserRepository::new(&pool);

        let email = Email::parse("alice@example.com").unwrap();
        let user = repo.create("Alice", &email, "hash", "enc-addr-1").await.unwrap();
        assert_eq!(user.name, "Alice");

        let by_email = repo.get_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let by_addr = repo.get_by_address("enc-addr-1").await.unwrap().unwrap();
        assert_eq!(by_addr.id, user.id);

        assert!(repo.get_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let pool = create_pool_in_memory().await.unwrap();
        let repo = UserRepository::new(&pool);

        let email = Email::parse("alice@example.com").unwrap();
        repo.create("Alice", &email, "hash", "enc-addr-1").await.unwrap();

        let err = repo
            .create("Alice Again", &email, "hash", "enc-addr-2")
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_addresses() {
        let pool = create_pool_in_memory().await.unwrap();
        let repo = UserRepository::new(&pool);

        let a = Email::parse("a@example.com").unwrap();
        let b = Email::parse("b@example.com").unwrap();
        repo.create("A", &a, "hash", "enc-1").await.unwrap();
        repo.create("B", &b, "hash", "enc-2").await.unwrap();

        let mut addrs = repo.list_addresses().await.unwrap();
        addrs.sort();
        assert_eq!(addrs, vec!["enc-1".to_string(), "enc-2".to_string()]);
    }
}

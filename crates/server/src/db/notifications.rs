//! Notification repository.

use sqlx::SqlitePool;

use blocked_supply_core::{NotificationId, UserId};

use super::{RepositoryError, timestamp_to_datetime, unix_timestamp};
use crate::models::Notification;

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    to_user_id: i64,
    message: String,
    is_read: i64,
    created_at: i64,
}

impl NotificationRow {
    fn into_notification(self) -> Result<Notification, RepositoryError> {
        Ok(Notification {
            id: NotificationId::new(self.id),
            to_user_id: UserId::new(self.to_user_id),
            message: self.message,
            is_read: self.is_read != 0,
            created_at: timestamp_to_datetime(self.created_at)?,
        })
    }
}

/// Repository for user notifications.
pub struct NotificationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new unread notification for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        to_user_id: UserId,
        message: &str,
    ) -> Result<Notification, RepositoryError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "INSERT INTO notifications (to_user_id, message, is_read, created_at) \
             VALUES (?, ?, 0, ?) RETURNING *",
        )
        .bind(to_user_id)
        .bind(message)
        .bind(unix_timestamp())
        .fetch_one(self.pool)
        .await?;

        row.into_notification()
    }

    /// Get a notification by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, RepositoryError> {
        let row = sqlx::query_as::<_, NotificationRow>("SELECT * FROM notifications WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(NotificationRow::into_notification).transpose()
    }

    /// All unread notifications for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_unread_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE to_user_id = ? AND is_read = 0 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(NotificationRow::into_notification)
            .collect()
    }

    /// Mark one notification as read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such notification exists,
    /// `RepositoryError::Database` for other failures.
    pub async fn mark_read(&self, id: NotificationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Mark every unread notification of a user as read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE to_user_id = ? AND is_read = 0")
                .bind(user_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::create_pool_in_memory;

    #[tokio::test]
    async fn test_create_and_list_unread() {
        let pool = create_pool_in_memory().await.unwrap();
        let repo = NotificationRepository::new(&pool);

        let first = repo.create(UserId::new(1), "first").await.unwrap();
        let second = repo.create(UserId::new(1), "second").await.unwrap();
        repo.create(UserId::new(2), "other user").await.unwrap();

        assert!(!first.is_read);

        let unread = repo.list_unread_for_user(UserId::new(1)).await.unwrap();
        assert_eq!(unread.len(), 2);
        // newest first
        assert_eq!(unread[0].id, second.id);
        assert_eq!(unread[1].id, first.id);
    }

    #[tokio::test]
    async fn test_mark_read_removes_from_unread() {
        let pool = create_pool_in_memory().await.unwrap();
        let repo = NotificationRepository::new(&pool);

        let n = repo.create(UserId::new(1), "hello").await.unwrap();
        repo.mark_read(n.id).await.unwrap();

        assert!(repo
            .list_unread_for_user(UserId::new(1))
            .await
            .unwrap()
            .is_empty());
        assert!(repo.get_by_id(n.id).await.unwrap().unwrap().is_read);
    }

    #[tokio::test]
    async fn test_mark_read_missing_is_not_found() {
        let pool = create_pool_in_memory().await.unwrap();
        let repo = NotificationRepository::new(&pool);

        let err = repo.mark_read(NotificationId::new(99)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let pool = create_pool_in_memory().await.unwrap();
        let repo = NotificationRepository::new(&pool);

        repo.create(UserId::new(1), "a").await.unwrap();
        repo.create(UserId::new(1), "b").await.unwrap();
        repo.create(UserId::new(2), "c").await.unwrap();

        let updated = repo.mark_all_read(UserId::new(1)).await.unwrap();
        assert_eq!(updated, 2);
        assert!(repo
            .list_unread_for_user(UserId::new(1))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            repo.list_unread_for_user(UserId::new(2)).await.unwrap().len(),
            1
        );
    }
}

//! Notification queries and read-state transitions.

use blocked_supply_core::NotificationId;

use crate::db::notifications::NotificationRepository;
use crate::error::{AppError, Result};
use crate::models::{Notification, User};
use crate::state::AppState;

/// Notification service.
pub struct NotificationService<'a> {
    state: &'a AppState,
}

impl<'a> NotificationService<'a> {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// The user's unread notifications, newest first. Empty list when none.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn unread(&self, user: &User) -> Result<Vec<Notification>> {
        Ok(NotificationRepository::new(self.state.pool())
            .list_unread_for_user(user.id)
            .await?)
    }

    /// Mark one notification as read. Only its recipient may do so.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown id,
    /// `AppError::Forbidden` when the notification belongs to someone else.
    pub async fn mark_read(&self, user: &User, id: NotificationId) -> Result<()> {
        let repo = NotificationRepository::new(self.state.pool());
        let notification = repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification does not exist".to_string()))?;

        if notification.to_user_id != user.id {
            return Err(AppError::Forbidden(
                "The notification can only be marked as read by the owner".to_string(),
            ));
        }

        repo.mark_read(id).await?;
        Ok(())
    }

    /// Mark every unread notification of the user as read. Returns how many
    /// were flipped; zero is not an error.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the update fails.
    pub async fn mark_all_read(&self, user: &User) -> Result<u64> {
        Ok(NotificationRepository::new(self.state.pool())
            .mark_all_read(user.id)
            .await?)
    }
}

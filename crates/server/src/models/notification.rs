//! Notification model.

use chrono::{DateTime, Utc};

use blocked_supply_core::{NotificationId, UserId};

/// An in-app notification for a transfer event.
///
/// Created by the transfer workflow whenever the acting user differs from
/// the new owner. Only the `is_read` flag ever changes; rows are never
/// deleted.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub to_user_id: UserId,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

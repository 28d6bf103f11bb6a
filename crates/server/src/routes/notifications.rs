//! Notification route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use blocked_supply_core::NotificationId;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::Notification;
use crate::services::notifications::NotificationService;
use crate::state::AppState;

/// Notification as presented to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOutput {
    pub id: NotificationId,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl From<Notification> for NotificationOutput {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            message: n.message,
            created_at: n.created_at,
            is_read: n.is_read,
        }
    }
}

/// `GET /api/notification`
pub async fn unread(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<NotificationOutput>>> {
    let notifications = NotificationService::new(&state).unread(&user).await?;
    Ok(Json(
        notifications.into_iter().map(NotificationOutput::from).collect(),
    ))
}

/// `POST /api/notification/read/{id}`
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<String> {
    let id = NotificationId::new(id);
    NotificationService::new(&state).mark_read(&user, id).await?;
    Ok(format!("Notification {id} read"))
}

/// `POST /api/notification/read`
pub async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<String> {
    let updated = NotificationService::new(&state).mark_all_read(&user).await?;
    if updated == 0 {
        Ok("No unread notifications to mark as read".to_string())
    } else {
        Ok("All notifications marked as read".to_string())
    }
}

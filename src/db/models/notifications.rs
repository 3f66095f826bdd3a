//! Database-layer request/response models for the notification log.

use crate::types::{NotificationId, ResourceId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to append a notification row. `kind` is the canonical string
/// form of [`crate::api::models::notifications::NotificationKind`].
#[derive(Debug, Clone)]
pub struct NotificationCreateDBRequest {
    pub user_id: UserId,
    pub resource_id: Option<ResourceId>,
    pub kind: String,
    pub message: String,
}

/// Filter for notification list queries. Notifications are always scoped
/// to a single recipient.
#[derive(Debug, Clone)]
pub struct NotificationFilter {
    pub user_id: UserId,
    pub unread_only: bool,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationDBResponse {
    pub id: NotificationId,
    pub user_id: UserId,
    pub resource_id: Option<ResourceId>,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

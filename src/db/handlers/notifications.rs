//! Notification log repository.
//!
//! Rows are append-only apart from the read flag. The `exists_*` lookups
//! back the engine's throttle window and calendar-day dedup.

use crate::db::errors::Result;
use crate::db::handlers::repository::Repository;
use crate::db::models::notifications::{
    NotificationCreateDBRequest, NotificationDBResponse, NotificationFilter,
};
use crate::types::{NotificationId, ResourceId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::instrument;

const COLUMNS: &str = "id, user_id, resource_id, kind, message, is_read, created_at";

pub struct Notifications<'c> {
    pub db: &'c mut SqliteConnection,
}

impl<'c> Notifications<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Whether a notification of `kind` for this resource and recipient was
    /// created at or after `since`. Backs the periodic scan's throttle window.
    #[instrument(skip(self))]
    pub async fn exists_since(
        &mut self,
        resource_id: ResourceId,
        user_id: UserId,
        kind: &str,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications
             WHERE resource_id = ? AND user_id = ? AND kind = ? AND created_at >= ?",
        )
        .bind(resource_id)
        .bind(user_id)
        .bind(kind)
        .bind(since)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(row.0 > 0)
    }

    /// Whether a notification of `kind` for this resource and recipient
    /// already exists on the given UTC calendar day.
    #[instrument(skip(self))]
    pub async fn exists_on_day(
        &mut self,
        resource_id: ResourceId,
        user_id: UserId,
        kind: &str,
        day: NaiveDate,
    ) -> Result<bool> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications
             WHERE resource_id = ? AND user_id = ? AND kind = ?
               AND date(created_at) = ?",
        )
        .bind(resource_id)
        .bind(user_id)
        .bind(kind)
        .bind(day)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(row.0 > 0)
    }

    /// Mark a single notification read, scoped to its recipient.
    #[instrument(skip(self))]
    pub async fn mark_read(
        &mut self,
        id: NotificationId,
        user_id: UserId,
    ) -> Result<Option<NotificationDBResponse>> {
        let notification = sqlx::query_as::<_, NotificationDBResponse>(&format!(
            "UPDATE notifications SET is_read = 1
             WHERE id = ? AND user_id = ?
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(notification)
    }

    /// Mark everything unread for the recipient read; returns how many rows
    /// changed.
    #[instrument(skip(self))]
    pub async fn mark_all_read(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .execute(&mut *self.db)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete a notification, scoped to its recipient.
    #[instrument(skip(self))]
    pub async fn delete_for_user(&mut self, id: NotificationId, user_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl Repository for Notifications<'_> {
    type CreateRequest = NotificationCreateDBRequest;
    // The log is append-only; the read flag has its own methods.
    type UpdateRequest = ();
    type Response = NotificationDBResponse;
    type Id = NotificationId;
    type Filter = NotificationFilter;

    #[instrument(skip(self, request), fields(user_id = request.user_id, kind = %request.kind))]
    async fn create(&mut self, request: &NotificationCreateDBRequest) -> Result<NotificationDBResponse> {
        let notification = sqlx::query_as::<_, NotificationDBResponse>(&format!(
            "INSERT INTO notifications (user_id, resource_id, kind, message, is_read, created_at)
             VALUES (?, ?, ?, ?, 0, ?)
             RETURNING {COLUMNS}"
        ))
        .bind(request.user_id)
        .bind(request.resource_id)
        .bind(&request.kind)
        .bind(&request.message)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;
        Ok(notification)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&mut self, id: NotificationId) -> Result<Option<NotificationDBResponse>> {
        let notification = sqlx::query_as::<_, NotificationDBResponse>(&format!(
            "SELECT {COLUMNS} FROM notifications WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(notification)
    }

    #[instrument(skip(self, filter), fields(user_id = filter.user_id))]
    async fn list(&mut self, filter: &NotificationFilter) -> Result<Vec<NotificationDBResponse>> {
        let notifications = sqlx::query_as::<_, NotificationDBResponse>(&format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE user_id = ? AND (? = 0 OR is_read = 0)
             ORDER BY created_at DESC, id DESC
             LIMIT ? OFFSET ?"
        ))
        .bind(filter.user_id)
        .bind(filter.unread_only)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(notifications)
    }

    #[instrument(skip(self))]
    async fn delete(&mut self, id: NotificationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update(&mut self, _id: NotificationId, _request: &()) -> Result<NotificationDBResponse> {
        Err(crate::db::errors::DbError::NotFound)
    }
}

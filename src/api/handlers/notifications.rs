//! Notification handlers. Everything here is scoped to the caller; there is
//! no cross-user access, admin or not.

use crate::AppState;
use crate::api::models::notifications::{NotificationListParams, NotificationResponse};
use crate::api::models::pagination::Pagination;
use crate::auth::CurrentUser;
use crate::db::handlers::{Notifications, Repository};
use crate::db::models::notifications::NotificationFilter;
use crate::errors::{Error, Result};
use crate::types::NotificationId;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    summary = "List own notifications, newest first",
    params(Pagination, NotificationListParams),
    responses(
        (status = 200, description = "List of notifications", body = Vec<NotificationResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_notifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
    Query(params): Query<NotificationListParams>,
) -> Result<Json<Vec<NotificationResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let notifications = Notifications::new(&mut conn)
        .list(&NotificationFilter {
            user_id: current_user.user.id,
            unread_only: params.unread_only,
            limit: pagination.limit(),
            offset: pagination.offset(),
        })
        .await?;

    Ok(Json(
        notifications.into_iter().map(NotificationResponse::from).collect(),
    ))
}

#[utoipa::path(
    patch,
    path = "/notifications/{id}/read",
    tag = "notifications",
    summary = "Mark a notification read",
    params(("id" = NotificationId, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Updated notification", body = NotificationResponse),
        (status = 404, description = "No such notification for this user")
    )
)]
#[tracing::instrument(skip_all, fields(notification_id = id))]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<NotificationResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let notification = Notifications::new(&mut conn)
        .mark_read(id, current_user.user.id)
        .await?
        .ok_or(Error::NotFound("Notification"))?;

    Ok(Json(NotificationResponse::from(notification)))
}

#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "notifications",
    summary = "Mark all own notifications read",
    responses(
        (status = 200, description = "Number of notifications marked read")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<serde_json::Value>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let marked = Notifications::new(&mut conn)
        .mark_all_read(current_user.user.id)
        .await?;

    Ok(Json(json!({ "marked_read": marked })))
}

#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    tag = "notifications",
    summary = "Delete a notification",
    params(("id" = NotificationId, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "No such notification for this user")
    )
)]
#[tracing::instrument(skip_all, fields(notification_id = id))]
pub async fn delete_notification(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Notifications::new(&mut conn)
        .delete_for_user(id, current_user.user.id)
        .await?
    {
        return Err(Error::NotFound("Notification"));
    }

    Ok(StatusCode::NO_CONTENT)
}

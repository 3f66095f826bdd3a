//! User handlers: `/users/current` for everyone, the rest admin-only.

use crate::AppState;
use crate::api::models::pagination::Pagination;
use crate::api::models::users::{UserResponse, UserUpdateRequest};
use crate::auth::CurrentUser;
use crate::auth::password::hash_password;
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::{UserFilter, UserUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::UserId;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

#[utoipa::path(
    get,
    path = "/users/current",
    tag = "users",
    summary = "Get the authenticated user",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_current_user(current_user: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(current_user.user))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    params(Pagination),
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>),
        (status = 403, description = "Admin required")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<UserResponse>>> {
    current_user.require_admin()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let users = Users::new(&mut conn)
        .list(&UserFilter {
            group_id: None,
            limit: pagination.limit(),
            offset: pagination.offset(),
        })
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get a user",
    params(("id" = UserId, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 403, description = "Admin required"),
        (status = 404, description = "No such user")
    )
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn get_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>> {
    current_user.require_admin()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or(Error::NotFound("User"))?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    summary = "Update a user's role, password, or group",
    params(("id" = UserId, Path, description = "User id")),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Unknown group"),
        (status = 403, description = "Admin required"),
        (status = 404, description = "No such user")
    )
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn update_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<UserId>,
    Json(request): Json<UserUpdateRequest>,
) -> Result<Json<UserResponse>> {
    current_user.require_admin()?;

    let password_hash = match request.password {
        Some(password) => Some(hash_password(password).await?),
        None => None,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let mut user = users
        .update(
            id,
            &UserUpdateDBRequest {
                role: request.role,
                password_hash,
            },
        )
        .await
        .map_err(|e| match e {
            crate::db::errors::DbError::NotFound => Error::NotFound("User"),
            other => Error::Database(other),
        })?;

    if let Some(group_id) = request.group_id {
        user = users.set_group(id, group_id).await?;
    }

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete a user",
    params(("id" = UserId, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Admin required"),
        (status = 404, description = "No such user")
    )
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn delete_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    current_user.require_admin()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Users::new(&mut conn).delete(id).await? {
        return Err(Error::NotFound("User"));
    }

    // Their live sessions die with the account.
    state.sessions.revoke_user(id);

    Ok(StatusCode::NO_CONTENT)
}

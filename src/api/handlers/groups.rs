//! Group handlers. Creation and deletion are admin-only; any user may
//! list groups and manage their own membership.

use crate::AppState;
use crate::api::models::groups::{GroupCreateRequest, GroupResponse};
use crate::api::models::pagination::Pagination;
use crate::api::models::users::UserResponse;
use crate::auth::CurrentUser;
use crate::db::handlers::{Groups, Repository, Users};
use crate::db::models::groups::{GroupCreateDBRequest, GroupFilter};
use crate::errors::{Error, Result};
use crate::types::GroupId;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

#[utoipa::path(
    get,
    path = "/groups",
    tag = "groups",
    summary = "List groups",
    params(Pagination),
    responses(
        (status = 200, description = "List of groups", body = Vec<GroupResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_groups(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<GroupResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let groups = Groups::new(&mut conn)
        .list(&GroupFilter {
            limit: pagination.limit(),
            offset: pagination.offset(),
        })
        .await?;

    Ok(Json(groups.into_iter().map(GroupResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/groups",
    tag = "groups",
    summary = "Create a group",
    responses(
        (status = 201, description = "Created group", body = GroupResponse),
        (status = 403, description = "Admin required"),
        (status = 409, description = "Name already taken")
    )
)]
#[tracing::instrument(skip_all, fields(name = %request.name))]
pub async fn create_group(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<GroupCreateRequest>,
) -> Result<(StatusCode, Json<GroupResponse>)> {
    current_user.require_admin()?;

    if request.name.trim().is_empty() {
        return Err(Error::BadRequest("Group name must not be empty".to_string()));
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let group = Groups::new(&mut conn)
        .create(&GroupCreateDBRequest { name: request.name })
        .await?;

    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))))
}

#[utoipa::path(
    get,
    path = "/groups/{id}",
    tag = "groups",
    summary = "Get a group",
    params(("id" = GroupId, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group", body = GroupResponse),
        (status = 404, description = "No such group")
    )
)]
#[tracing::instrument(skip_all, fields(group_id = id))]
pub async fn get_group(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<GroupId>,
) -> Result<Json<GroupResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let group = Groups::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or(Error::NotFound("Group"))?;

    Ok(Json(GroupResponse::from(group)))
}

#[utoipa::path(
    delete,
    path = "/groups/{id}",
    tag = "groups",
    summary = "Delete a group",
    params(("id" = GroupId, Path, description = "Group id")),
    responses(
        (status = 204, description = "Group deleted; members are detached"),
        (status = 403, description = "Admin required"),
        (status = 404, description = "No such group")
    )
)]
#[tracing::instrument(skip_all, fields(group_id = id))]
pub async fn delete_group(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<GroupId>,
) -> Result<StatusCode> {
    current_user.require_admin()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !Groups::new(&mut conn).delete(id).await? {
        return Err(Error::NotFound("Group"));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/groups/{id}/join",
    tag = "groups",
    summary = "Join a group",
    params(("id" = GroupId, Path, description = "Group id")),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 404, description = "No such group; membership unchanged")
    )
)]
#[tracing::instrument(skip_all, fields(group_id = id))]
pub async fn join_group(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<GroupId>,
) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    // Check first so joining a nonexistent group leaves membership alone.
    Groups::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or(Error::NotFound("Group"))?;

    let user = Users::new(&mut conn)
        .set_group(current_user.user.id, Some(id))
        .await?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/groups/leave",
    tag = "groups",
    summary = "Leave the current group",
    responses(
        (status = 200, description = "Updated user", body = UserResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn leave_group(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .set_group(current_user.user.id, None)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

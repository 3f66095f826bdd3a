//! Resource handlers, including JSON export/import.
//!
//! Visibility: a user sees their own resources plus those owned by members
//! of their group; admins see everything. Out-of-scope resources 404 rather
//! than 403, so their existence is not leaked.

use crate::AppState;
use crate::api::models::pagination::Pagination;
use crate::api::models::resources::{
    ResourceCreateRequest, ResourceListParams, ResourceResponse, ResourceUpdateRequest,
};
use crate::api::models::transfer::{
    EXPORT_FORMAT_VERSION, ResourceExport, ResourceImportRequest, ResourceImportResponse,
    ResourceTransfer,
};
use crate::auth::CurrentUser;
use crate::db::errors::DbError;
use crate::db::handlers::{Categories, Repository, Resources, Users};
use crate::db::models::categories::CategoryFilter;
use crate::db::models::resources::{
    ResourceCreateDBRequest, ResourceDBResponse, ResourceFilter, ResourceScope,
};
use crate::db::models::users::UserDBResponse;
use crate::errors::{Error, Result};
use crate::notifier;
use crate::types::ResourceId;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use std::collections::HashMap;

fn scope_for(user: &UserDBResponse) -> ResourceScope {
    if user.role.is_admin() {
        ResourceScope::All
    } else {
        ResourceScope::Visible {
            user_id: user.id,
            group_id: user.group_id,
        }
    }
}

fn validate_amounts(quantity: i64, low_stock_threshold: i64) -> Result<()> {
    if quantity < 0 {
        return Err(Error::BadRequest("Quantity must not be negative".to_string()));
    }
    if low_stock_threshold < 0 {
        return Err(Error::BadRequest(
            "Low-stock threshold must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// Fetch a resource the caller is allowed to see, or 404.
async fn fetch_visible(
    conn: &mut sqlx::SqliteConnection,
    current: &UserDBResponse,
    id: ResourceId,
) -> Result<ResourceDBResponse> {
    let resource = Resources::new(conn)
        .get_by_id(id)
        .await?
        .ok_or(Error::NotFound("Resource"))?;

    if current.role.is_admin() || resource.owner_user_id == current.id {
        return Ok(resource);
    }

    let owner = Users::new(conn).get_by_id(resource.owner_user_id).await?;
    match (current.group_id, owner.and_then(|o| o.group_id)) {
        (Some(mine), Some(theirs)) if mine == theirs => Ok(resource),
        _ => Err(Error::NotFound("Resource")),
    }
}

#[utoipa::path(
    get,
    path = "/resources",
    tag = "resources",
    summary = "List visible resources",
    params(Pagination, ResourceListParams),
    responses(
        (status = 200, description = "List of resources", body = Vec<ResourceResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_resources(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
    Query(params): Query<ResourceListParams>,
) -> Result<Json<Vec<ResourceResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let resources = Resources::new(&mut conn)
        .list(&ResourceFilter {
            scope: scope_for(&current_user.user),
            category_id: params.category_id,
            limit: pagination.limit(),
            offset: pagination.offset(),
        })
        .await?;

    Ok(Json(resources.into_iter().map(ResourceResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/resources",
    tag = "resources",
    summary = "Create a resource",
    responses(
        (status = 201, description = "Created resource", body = ResourceResponse),
        (status = 400, description = "Negative amounts or unknown category")
    )
)]
#[tracing::instrument(skip_all, fields(name = %request.name))]
pub async fn create_resource(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ResourceCreateRequest>,
) -> Result<(StatusCode, Json<ResourceResponse>)> {
    validate_amounts(request.quantity, request.low_stock_threshold)?;

    let resource = {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Resources::new(&mut conn)
            .create(&ResourceCreateDBRequest {
                name: request.name,
                category_id: request.category_id,
                quantity: request.quantity,
                low_stock_threshold: request.low_stock_threshold,
                description: request.description,
                expiration_date: request.expiration_date,
                owner_user_id: current_user.user.id,
            })
            .await?
    };

    notifier::check_low_stock_on_write(&state, &resource).await;

    Ok((StatusCode::CREATED, Json(ResourceResponse::from(resource))))
}

#[utoipa::path(
    get,
    path = "/resources/{id}",
    tag = "resources",
    summary = "Get a resource",
    params(("id" = ResourceId, Path, description = "Resource id")),
    responses(
        (status = 200, description = "Resource", body = ResourceResponse),
        (status = 404, description = "No such resource (or not visible)")
    )
)]
#[tracing::instrument(skip_all, fields(resource_id = id))]
pub async fn get_resource(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ResourceId>,
) -> Result<Json<ResourceResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let resource = fetch_visible(&mut conn, &current_user.user, id).await?;

    Ok(Json(ResourceResponse::from(resource)))
}

#[utoipa::path(
    patch,
    path = "/resources/{id}",
    tag = "resources",
    summary = "Update a resource",
    params(("id" = ResourceId, Path, description = "Resource id")),
    responses(
        (status = 200, description = "Updated resource", body = ResourceResponse),
        (status = 400, description = "Negative amounts or unknown category"),
        (status = 404, description = "No such resource (or not visible)")
    )
)]
#[tracing::instrument(skip_all, fields(resource_id = id))]
pub async fn update_resource(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ResourceId>,
    Json(request): Json<ResourceUpdateRequest>,
) -> Result<Json<ResourceResponse>> {
    validate_amounts(
        request.quantity.unwrap_or(0),
        request.low_stock_threshold.unwrap_or(0),
    )?;

    let resource = {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        fetch_visible(&mut conn, &current_user.user, id).await?;
        Resources::new(&mut conn).update(id, &request.into()).await?
    };

    notifier::check_low_stock_on_write(&state, &resource).await;

    Ok(Json(ResourceResponse::from(resource)))
}

#[utoipa::path(
    delete,
    path = "/resources/{id}",
    tag = "resources",
    summary = "Delete a resource",
    params(("id" = ResourceId, Path, description = "Resource id")),
    responses(
        (status = 204, description = "Resource deleted"),
        (status = 404, description = "No such resource (or not visible)")
    )
)]
#[tracing::instrument(skip_all, fields(resource_id = id))]
pub async fn delete_resource(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ResourceId>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    fetch_visible(&mut conn, &current_user.user, id).await?;
    Resources::new(&mut conn).delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/resources/export",
    tag = "resources",
    summary = "Export visible resources as JSON",
    responses(
        (status = 200, description = "Export document", body = ResourceExport),
        (status = 401, description = "Unauthorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn export_resources(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ResourceExport>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let categories = Categories::new(&mut conn)
        .list(&CategoryFilter { limit: i64::MAX, offset: 0 })
        .await?;
    let names: HashMap<_, _> = categories.into_iter().map(|c| (c.id, c.name)).collect();

    let resources = Resources::new(&mut conn)
        .list(&ResourceFilter {
            scope: scope_for(&current_user.user),
            category_id: None,
            limit: i64::MAX,
            offset: 0,
        })
        .await?;

    let resources = resources
        .into_iter()
        .map(|resource| {
            let category = names
                .get(&resource.category_id)
                .cloned()
                .unwrap_or_default();
            ResourceTransfer::from_db(resource, category)
        })
        .collect();

    Ok(Json(ResourceExport {
        version: EXPORT_FORMAT_VERSION,
        exported_at: Utc::now(),
        resources,
    }))
}

#[utoipa::path(
    post,
    path = "/resources/import",
    tag = "resources",
    summary = "Import resources from JSON",
    responses(
        (status = 201, description = "Import result", body = ResourceImportResponse),
        (status = 400, description = "Unknown category name or negative amounts; nothing imported")
    )
)]
#[tracing::instrument(skip_all, fields(count = request.resources.len()))]
pub async fn import_resources(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ResourceImportRequest>,
) -> Result<(StatusCode, Json<ResourceImportResponse>)> {
    // All-or-nothing: validate and insert inside one transaction so a bad
    // entry halfway through leaves nothing behind.
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let categories = Categories::new(&mut *tx)
        .list(&CategoryFilter { limit: i64::MAX, offset: 0 })
        .await?;
    let ids: HashMap<_, _> = categories.into_iter().map(|c| (c.name, c.id)).collect();

    let mut created = Vec::with_capacity(request.resources.len());
    for entry in request.resources {
        validate_amounts(entry.quantity, entry.low_stock_threshold)?;
        let category_id = *ids
            .get(&entry.category)
            .ok_or_else(|| Error::BadRequest(format!("Unknown category: {}", entry.category)))?;

        let resource = Resources::new(&mut *tx)
            .create(&ResourceCreateDBRequest {
                name: entry.name,
                category_id,
                quantity: entry.quantity,
                low_stock_threshold: entry.low_stock_threshold,
                description: entry.description,
                expiration_date: entry.expiration_date,
                owner_user_id: current_user.user.id,
            })
            .await?;
        created.push(resource);
    }

    tx.commit().await.map_err(|e| Error::Database(DbError::from(e)))?;

    // Post-write checks run after commit, like any other write path.
    for resource in &created {
        notifier::check_low_stock_on_write(&state, resource).await;
    }

    Ok((
        StatusCode::CREATED,
        Json(ResourceImportResponse {
            imported: created.len() as u64,
        }),
    ))
}

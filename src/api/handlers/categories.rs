//! Category handlers. Mutation is admin-only.

use crate::AppState;
use crate::api::models::categories::{
    CategoryCreateRequest, CategoryResponse, CategoryUpdateRequest,
};
use crate::api::models::pagination::Pagination;
use crate::auth::CurrentUser;
use crate::db::errors::DbError;
use crate::db::handlers::{Categories, Repository};
use crate::db::models::categories::{CategoryCreateDBRequest, CategoryFilter};
use crate::errors::{Error, Result};
use crate::types::CategoryId;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    summary = "List categories",
    params(Pagination),
    responses(
        (status = 200, description = "List of categories", body = Vec<CategoryResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_categories(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<CategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let categories = Categories::new(&mut conn)
        .list(&CategoryFilter {
            limit: pagination.limit(),
            offset: pagination.offset(),
        })
        .await?;

    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "categories",
    summary = "Create a category",
    responses(
        (status = 201, description = "Created category", body = CategoryResponse),
        (status = 403, description = "Admin required"),
        (status = 409, description = "Name already taken")
    )
)]
#[tracing::instrument(skip_all, fields(name = %request.name))]
pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CategoryCreateRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    current_user.require_admin()?;

    if request.name.trim().is_empty() {
        return Err(Error::BadRequest("Category name must not be empty".to_string()));
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = Categories::new(&mut conn)
        .create(&CategoryCreateDBRequest {
            name: request.name,
            enable_quantity: request.enable_quantity,
            enable_low_stock_threshold: request.enable_low_stock_threshold,
            enable_expiration_date: request.enable_expiration_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = "categories",
    summary = "Get a category",
    params(("id" = CategoryId, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "No such category")
    )
)]
#[tracing::instrument(skip_all, fields(category_id = id))]
pub async fn get_category(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<CategoryId>,
) -> Result<Json<CategoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = Categories::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or(Error::NotFound("Category"))?;

    Ok(Json(CategoryResponse::from(category)))
}

#[utoipa::path(
    patch,
    path = "/categories/{id}",
    tag = "categories",
    summary = "Update a category",
    params(("id" = CategoryId, Path, description = "Category id")),
    responses(
        (status = 200, description = "Updated category", body = CategoryResponse),
        (status = 403, description = "Admin required"),
        (status = 404, description = "No such category"),
        (status = 409, description = "Name already taken")
    )
)]
#[tracing::instrument(skip_all, fields(category_id = id))]
pub async fn update_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<CategoryId>,
    Json(request): Json<CategoryUpdateRequest>,
) -> Result<Json<CategoryResponse>> {
    current_user.require_admin()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = Categories::new(&mut conn)
        .update(id, &request.into())
        .await
        .map_err(|e| match e {
            DbError::NotFound => Error::NotFound("Category"),
            other => Error::Database(other),
        })?;

    Ok(Json(CategoryResponse::from(category)))
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "categories",
    summary = "Delete a category",
    params(("id" = CategoryId, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 403, description = "Admin required"),
        (status = 404, description = "No such category"),
        (status = 409, description = "Resources still reference this category")
    )
)]
#[tracing::instrument(skip_all, fields(category_id = id))]
pub async fn delete_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    current_user.require_admin()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let deleted = Categories::new(&mut conn).delete(id).await.map_err(|e| match e {
        // RESTRICT means the row is untouched; surface as a conflict, not
        // a validation error.
        DbError::ForeignKeyViolation { .. } => {
            Error::Conflict("Category is still referenced by resources".to_string())
        }
        other => Error::Database(other),
    })?;

    if !deleted {
        return Err(Error::NotFound("Category"));
    }

    Ok(StatusCode::NO_CONTENT)
}

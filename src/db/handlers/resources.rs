//! Resource repository.
//!
//! Besides the usual CRUD this exposes the two scan queries the
//! notification engine runs: low-stock candidates and expiring candidates.
//! Both scans respect the owning category's `enable_*` flags so disabled
//! tracking fields never produce alerts.

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::resources::{
    ResourceCreateDBRequest, ResourceDBResponse, ResourceFilter, ResourceScope,
    ResourceUpdateDBRequest,
};
use crate::types::ResourceId;
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

const COLUMNS: &str = "id, name, category_id, quantity, low_stock_threshold, description, \
                       expiration_date, owner_user_id, created_at, updated_at";

pub struct Resources<'c> {
    pub db: &'c mut SqliteConnection,
}

impl<'c> Resources<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// All resources currently below their threshold, where the category
    /// tracks both quantity and threshold.
    #[instrument(skip(self))]
    pub async fn list_low_stock(&mut self) -> Result<Vec<ResourceDBResponse>> {
        let resources = sqlx::query_as::<_, ResourceDBResponse>(
            "SELECT r.id, r.name, r.category_id, r.quantity, r.low_stock_threshold,
                    r.description, r.expiration_date, r.owner_user_id, r.created_at, r.updated_at
             FROM resources r
             JOIN categories c ON c.id = r.category_id
             WHERE c.enable_quantity AND c.enable_low_stock_threshold
               AND r.quantity < r.low_stock_threshold
             ORDER BY r.id",
        )
        .fetch_all(&mut *self.db)
        .await?;
        Ok(resources)
    }

    /// All resources with an expiration date, where the category tracks
    /// expiration. The caller decides which dates are close enough to alert.
    #[instrument(skip(self))]
    pub async fn list_with_expiration(&mut self) -> Result<Vec<ResourceDBResponse>> {
        let resources = sqlx::query_as::<_, ResourceDBResponse>(
            "SELECT r.id, r.name, r.category_id, r.quantity, r.low_stock_threshold,
                    r.description, r.expiration_date, r.owner_user_id, r.created_at, r.updated_at
             FROM resources r
             JOIN categories c ON c.id = r.category_id
             WHERE c.enable_expiration_date AND r.expiration_date IS NOT NULL
             ORDER BY r.id",
        )
        .fetch_all(&mut *self.db)
        .await?;
        Ok(resources)
    }
}

#[async_trait::async_trait]
impl Repository for Resources<'_> {
    type CreateRequest = ResourceCreateDBRequest;
    type UpdateRequest = ResourceUpdateDBRequest;
    type Response = ResourceDBResponse;
    type Id = ResourceId;
    type Filter = ResourceFilter;

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create(&mut self, request: &ResourceCreateDBRequest) -> Result<ResourceDBResponse> {
        let now = Utc::now();
        let resource = sqlx::query_as::<_, ResourceDBResponse>(&format!(
            "INSERT INTO resources
                 (name, category_id, quantity, low_stock_threshold, description,
                  expiration_date, owner_user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        ))
        .bind(&request.name)
        .bind(request.category_id)
        .bind(request.quantity)
        .bind(request.low_stock_threshold)
        .bind(request.description.as_deref())
        .bind(request.expiration_date)
        .bind(request.owner_user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(resource)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&mut self, id: ResourceId) -> Result<Option<ResourceDBResponse>> {
        let resource = sqlx::query_as::<_, ResourceDBResponse>(&format!(
            "SELECT {COLUMNS} FROM resources WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(resource)
    }

    #[instrument(skip(self, filter))]
    async fn list(&mut self, filter: &ResourceFilter) -> Result<Vec<ResourceDBResponse>> {
        let resources = match &filter.scope {
            ResourceScope::All => {
                sqlx::query_as::<_, ResourceDBResponse>(&format!(
                    "SELECT {COLUMNS} FROM resources
                     WHERE (? IS NULL OR category_id = ?)
                     ORDER BY id
                     LIMIT ? OFFSET ?"
                ))
                .bind(filter.category_id)
                .bind(filter.category_id)
                .bind(filter.limit)
                .bind(filter.offset)
                .fetch_all(&mut *self.db)
                .await?
            }
            ResourceScope::Visible { user_id, group_id } => {
                // Own resources, plus everything owned by users in the same
                // group when the caller belongs to one.
                sqlx::query_as::<_, ResourceDBResponse>(&format!(
                    "SELECT {COLUMNS} FROM resources
                     WHERE (owner_user_id = ?
                            OR (? IS NOT NULL AND owner_user_id IN
                                (SELECT id FROM users WHERE group_id = ?)))
                       AND (? IS NULL OR category_id = ?)
                     ORDER BY id
                     LIMIT ? OFFSET ?"
                ))
                .bind(user_id)
                .bind(group_id)
                .bind(group_id)
                .bind(filter.category_id)
                .bind(filter.category_id)
                .bind(filter.limit)
                .bind(filter.offset)
                .fetch_all(&mut *self.db)
                .await?
            }
        };
        Ok(resources)
    }

    #[instrument(skip(self))]
    async fn delete(&mut self, id: ResourceId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request))]
    async fn update(
        &mut self,
        id: ResourceId,
        request: &ResourceUpdateDBRequest,
    ) -> Result<ResourceDBResponse> {
        let resource = sqlx::query_as::<_, ResourceDBResponse>(&format!(
            "UPDATE resources SET
                 name = COALESCE(?, name),
                 category_id = COALESCE(?, category_id),
                 quantity = COALESCE(?, quantity),
                 low_stock_threshold = COALESCE(?, low_stock_threshold),
                 description = CASE WHEN ? THEN ? ELSE description END,
                 expiration_date = CASE WHEN ? THEN ? ELSE expiration_date END,
                 updated_at = ?
             WHERE id = ?
             RETURNING {COLUMNS}"
        ))
        .bind(request.name.as_deref())
        .bind(request.category_id)
        .bind(request.quantity)
        .bind(request.low_stock_threshold)
        .bind(request.description.is_some())
        .bind(request.description.clone().flatten())
        .bind(request.expiration_date.is_some())
        .bind(request.expiration_date.flatten())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(resource)
    }
}

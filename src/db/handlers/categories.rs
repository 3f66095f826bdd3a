//! Category repository.

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::categories::{
    CategoryCreateDBRequest, CategoryDBResponse, CategoryFilter, CategoryUpdateDBRequest,
};
use crate::types::CategoryId;
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

const COLUMNS: &str =
    "id, name, enable_quantity, enable_low_stock_threshold, enable_expiration_date, created_at";

pub struct Categories<'c> {
    pub db: &'c mut SqliteConnection,
}

impl<'c> Categories<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Repository for Categories<'_> {
    type CreateRequest = CategoryCreateDBRequest;
    type UpdateRequest = CategoryUpdateDBRequest;
    type Response = CategoryDBResponse;
    type Id = CategoryId;
    type Filter = CategoryFilter;

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create(&mut self, request: &CategoryCreateDBRequest) -> Result<CategoryDBResponse> {
        let category = sqlx::query_as::<_, CategoryDBResponse>(&format!(
            "INSERT INTO categories
                 (name, enable_quantity, enable_low_stock_threshold, enable_expiration_date, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {COLUMNS}"
        ))
        .bind(&request.name)
        .bind(request.enable_quantity)
        .bind(request.enable_low_stock_threshold)
        .bind(request.enable_expiration_date)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;
        Ok(category)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&mut self, id: CategoryId) -> Result<Option<CategoryDBResponse>> {
        let category = sqlx::query_as::<_, CategoryDBResponse>(&format!(
            "SELECT {COLUMNS} FROM categories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(category)
    }

    #[instrument(skip(self, filter))]
    async fn list(&mut self, filter: &CategoryFilter) -> Result<Vec<CategoryDBResponse>> {
        let categories = sqlx::query_as::<_, CategoryDBResponse>(&format!(
            "SELECT {COLUMNS} FROM categories ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(categories)
    }

    /// Fails with a foreign key violation while resources still reference
    /// the category; the API layer maps that to a conflict.
    #[instrument(skip(self))]
    async fn delete(&mut self, id: CategoryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request))]
    async fn update(
        &mut self,
        id: CategoryId,
        request: &CategoryUpdateDBRequest,
    ) -> Result<CategoryDBResponse> {
        let category = sqlx::query_as::<_, CategoryDBResponse>(&format!(
            "UPDATE categories SET
                 name = COALESCE(?, name),
                 enable_quantity = COALESCE(?, enable_quantity),
                 enable_low_stock_threshold = COALESCE(?, enable_low_stock_threshold),
                 enable_expiration_date = COALESCE(?, enable_expiration_date)
             WHERE id = ?
             RETURNING {COLUMNS}"
        ))
        .bind(request.name.as_deref())
        .bind(request.enable_quantity)
        .bind(request.enable_low_stock_threshold)
        .bind(request.enable_expiration_date)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    fn req(name: &str) -> CategoryCreateDBRequest {
        CategoryCreateDBRequest {
            name: name.to_string(),
            enable_quantity: true,
            enable_low_stock_threshold: true,
            enable_expiration_date: false,
        }
    }

    #[sqlx::test]
    async fn create_and_update_flags(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut categories = Categories::new(&mut conn);

        let created = categories.create(&req("chemicals")).await.unwrap();
        assert!(created.enable_quantity);
        assert!(!created.enable_expiration_date);

        let updated = categories
            .update(
                created.id,
                &CategoryUpdateDBRequest {
                    enable_expiration_date: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.enable_expiration_date);
        assert_eq!(updated.name, "chemicals");
    }

    #[sqlx::test]
    async fn delete_with_resources_is_fk_violation(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();

        let category = Categories::new(&mut conn).create(&req("tools")).await.unwrap();

        sqlx::query(
            "INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
             VALUES ('gail', 'gail@example.com', 'hash', 'user', ?, ?)",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO resources
                 (name, category_id, quantity, low_stock_threshold, owner_user_id, created_at, updated_at)
             VALUES ('wrench', ?, 3, 1, 1, ?, ?)",
        )
        .bind(category.id)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .unwrap();

        let err = Categories::new(&mut conn).delete(category.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}

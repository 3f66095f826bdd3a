//! Group repository.
//!
//! Groups have no update path; they are created, joined, left, and deleted.
//! Membership itself lives on the users table.

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::groups::{GroupCreateDBRequest, GroupDBResponse, GroupFilter};
use crate::types::GroupId;
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

pub struct Groups<'c> {
    pub db: &'c mut SqliteConnection,
}

impl<'c> Groups<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Repository for Groups<'_> {
    type CreateRequest = GroupCreateDBRequest;
    // No mutable fields; update is unsupported and returns NotFound.
    type UpdateRequest = ();
    type Response = GroupDBResponse;
    type Id = GroupId;
    type Filter = GroupFilter;

    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create(&mut self, request: &GroupCreateDBRequest) -> Result<GroupDBResponse> {
        let group = sqlx::query_as::<_, GroupDBResponse>(
            "INSERT INTO groups (name, created_at) VALUES (?, ?)
             RETURNING id, name, created_at",
        )
        .bind(&request.name)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;
        Ok(group)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&mut self, id: GroupId) -> Result<Option<GroupDBResponse>> {
        let group = sqlx::query_as::<_, GroupDBResponse>(
            "SELECT id, name, created_at FROM groups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(group)
    }

    #[instrument(skip(self, filter))]
    async fn list(&mut self, filter: &GroupFilter) -> Result<Vec<GroupDBResponse>> {
        let groups = sqlx::query_as::<_, GroupDBResponse>(
            "SELECT id, name, created_at FROM groups ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(groups)
    }

    #[instrument(skip(self))]
    async fn delete(&mut self, id: GroupId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM groups WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update(&mut self, _id: GroupId, _request: &()) -> Result<GroupDBResponse> {
        Err(DbError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn create_list_delete(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut groups = Groups::new(&mut conn);

        let a = groups
            .create(&GroupCreateDBRequest { name: "warehouse".into() })
            .await
            .unwrap();
        groups
            .create(&GroupCreateDBRequest { name: "lab".into() })
            .await
            .unwrap();

        let all = groups
            .list(&GroupFilter { limit: 50, offset: 0 })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        assert!(groups.delete(a.id).await.unwrap());
        assert!(groups.get_by_id(a.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn duplicate_name_is_unique_violation(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut groups = Groups::new(&mut conn);

        groups
            .create(&GroupCreateDBRequest { name: "ops".into() })
            .await
            .unwrap();
        let err = groups
            .create(&GroupCreateDBRequest { name: "ops".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    async fn deleting_group_detaches_members(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();

        let group = Groups::new(&mut conn)
            .create(&GroupCreateDBRequest { name: "field".into() })
            .await
            .unwrap();

        sqlx::query(
            "INSERT INTO users (username, email, password_hash, role, group_id, created_at, updated_at)
             VALUES ('frank', 'frank@example.com', 'hash', 'user', ?, ?, ?)",
        )
        .bind(group.id)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .unwrap();

        assert!(Groups::new(&mut conn).delete(group.id).await.unwrap());

        let orphaned: (Option<i64>,) =
            sqlx::query_as("SELECT group_id FROM users WHERE username = 'frank'")
                .fetch_one(&mut *conn)
                .await
                .unwrap();
        assert_eq!(orphaned.0, None);
    }
}

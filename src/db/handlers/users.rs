//! User repository.

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::users::{
    UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest,
};
use crate::types::{GroupId, UserId};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

pub struct Users<'c> {
    pub db: &'c mut SqliteConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Look up a user by username, for login.
    #[instrument(skip(self))]
    pub async fn get_by_username(&mut self, username: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            "SELECT id, username, email, role, group_id, created_at, updated_at, password_hash
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(user)
    }

    /// Set or clear a user's group membership.
    #[instrument(skip(self))]
    pub async fn set_group(
        &mut self,
        id: UserId,
        group_id: Option<GroupId>,
    ) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            "UPDATE users SET group_id = ?, updated_at = ?
             WHERE id = ?
             RETURNING id, username, email, role, group_id, created_at, updated_at, password_hash",
        )
        .bind(group_id)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(user)
    }

    /// Every member of a group, used for notification fan-out.
    #[instrument(skip(self))]
    pub async fn list_by_group(&mut self, group_id: GroupId) -> Result<Vec<UserDBResponse>> {
        let users = sqlx::query_as::<_, UserDBResponse>(
            "SELECT id, username, email, role, group_id, created_at, updated_at, password_hash
             FROM users WHERE group_id = ? ORDER BY id",
        )
        .bind(group_id)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(users)
    }

}

#[async_trait::async_trait]
impl Repository for Users<'_> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(username = %request.username))]
    async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, UserDBResponse>(
            "INSERT INTO users (username, email, password_hash, role, group_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id, username, email, role, group_id, created_at, updated_at, password_hash",
        )
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(request.role)
        .bind(request.group_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            "SELECT id, username, email, role, group_id, created_at, updated_at, password_hash
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self, filter))]
    async fn list(&mut self, filter: &UserFilter) -> Result<Vec<UserDBResponse>> {
        let users = sqlx::query_as::<_, UserDBResponse>(
            "SELECT id, username, email, role, group_id, created_at, updated_at, password_hash
             FROM users
             WHERE (? IS NULL OR group_id = ?)
             ORDER BY id
             LIMIT ? OFFSET ?",
        )
        .bind(filter.group_id)
        .bind(filter.group_id)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn delete(&mut self, id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request))]
    async fn update(&mut self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            "UPDATE users SET
                 role = COALESCE(?, role),
                 password_hash = COALESCE(?, password_hash),
                 updated_at = ?
             WHERE id = ?
             RETURNING id, username, email, role, group_id, created_at, updated_at, password_hash",
        )
        .bind(request.role)
        .bind(request.password_hash.as_deref())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(user)
    }
}

//! Database-layer request/response models for users.

use crate::api::models::users::Role;
use crate::types::{GroupId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to create a user row. The password hash is produced by the
/// caller; this layer never sees plaintext credentials.
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub group_id: Option<GroupId>,
    pub password_hash: String,
}

/// Partial update; `None` fields are left unchanged. Group membership is
/// changed through `Users::set_group` because clearing it needs an explicit
/// NULL write that COALESCE-style updates cannot express.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

/// Filter for user list queries.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub group_id: Option<GroupId>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub group_id: Option<GroupId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub password_hash: String,
}

//! API request/response models for users.

use crate::db::models::users::UserDBResponse;
use crate::types::{GroupId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role. Admins may manage other users, groups, and categories;
/// regular users only operate on their own data.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Admin request to update a user. Absent fields are left unchanged;
/// `group_id: null` removes the user from their group.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    pub role: Option<Role>,
    pub password: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub group_id: Option<Option<GroupId>>,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub group_id: Option<GroupId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(user: UserDBResponse) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            group_id: user.group_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }

    #[test]
    fn update_distinguishes_absent_from_null_group() {
        let absent: UserUpdateRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.group_id, None);

        let cleared: UserUpdateRequest = serde_json::from_str(r#"{"group_id": null}"#).unwrap();
        assert_eq!(cleared.group_id, Some(None));

        let set: UserUpdateRequest = serde_json::from_str(r#"{"group_id": 4}"#).unwrap();
        assert_eq!(set.group_id, Some(Some(4)));
    }
}

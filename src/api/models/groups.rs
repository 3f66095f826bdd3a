//! API models for groups.

use crate::db::models::groups::GroupDBResponse;
use crate::types::GroupId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GroupCreateRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    pub id: GroupId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<GroupDBResponse> for GroupResponse {
    fn from(group: GroupDBResponse) -> Self {
        Self {
            id: group.id,
            name: group.name,
            created_at: group.created_at,
        }
    }
}

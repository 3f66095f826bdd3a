//! Database-layer request/response models for groups.

use crate::types::GroupId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct GroupCreateDBRequest {
    pub name: String,
}

/// Filter for group list queries.
#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GroupDBResponse {
    pub id: GroupId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

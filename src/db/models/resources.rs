//! Database-layer request/response models for resources.

use crate::types::{CategoryId, GroupId, ResourceId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ResourceCreateDBRequest {
    pub name: String,
    pub category_id: CategoryId,
    pub quantity: i64,
    pub low_stock_threshold: i64,
    pub description: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub owner_user_id: UserId,
}

/// Partial update; `None` fields are left unchanged. The nullable columns
/// use a double `Option` so `Some(None)` can clear them.
#[derive(Debug, Clone, Default)]
pub struct ResourceUpdateDBRequest {
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub quantity: Option<i64>,
    pub low_stock_threshold: Option<i64>,
    pub description: Option<Option<String>>,
    pub expiration_date: Option<Option<NaiveDate>>,
}

/// Which rows a resource query may see.
///
/// Regular users see their own resources plus those owned by members of
/// their group; admins see everything.
#[derive(Debug, Clone)]
pub enum ResourceScope {
    All,
    Visible {
        user_id: UserId,
        group_id: Option<GroupId>,
    },
}

/// Filter for resource list queries.
#[derive(Debug, Clone)]
pub struct ResourceFilter {
    pub scope: ResourceScope,
    pub category_id: Option<CategoryId>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResourceDBResponse {
    pub id: ResourceId,
    pub name: String,
    pub category_id: CategoryId,
    pub quantity: i64,
    pub low_stock_threshold: i64,
    pub description: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub owner_user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResourceDBResponse {
    /// Whether the resource currently sits below its configured threshold.
    /// Strictly below: a quantity equal to the threshold is not low stock.
    pub fn is_low_stock(&self) -> bool {
        self.quantity < self.low_stock_threshold
    }
}

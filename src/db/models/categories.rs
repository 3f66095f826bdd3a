//! Database-layer request/response models for categories.
//!
//! The three `enable_*` flags control which resource fields are meaningful
//! for resources filed under the category; the notification engine skips
//! resources whose category disables the relevant fields.

use crate::types::CategoryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct CategoryCreateDBRequest {
    pub name: String,
    pub enable_quantity: bool,
    pub enable_low_stock_threshold: bool,
    pub enable_expiration_date: bool,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdateDBRequest {
    pub name: Option<String>,
    pub enable_quantity: Option<bool>,
    pub enable_low_stock_threshold: Option<bool>,
    pub enable_expiration_date: Option<bool>,
}

/// Filter for category list queries.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryDBResponse {
    pub id: CategoryId,
    pub name: String,
    pub enable_quantity: bool,
    pub enable_low_stock_threshold: bool,
    pub enable_expiration_date: bool,
    pub created_at: DateTime<Utc>,
}

//! API models for categories.

use crate::db::models::categories::{CategoryDBResponse, CategoryUpdateDBRequest};
use crate::types::CategoryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CategoryCreateRequest {
    pub name: String,
    #[serde(default = "default_true")]
    pub enable_quantity: bool,
    #[serde(default = "default_true")]
    pub enable_low_stock_threshold: bool,
    #[serde(default)]
    pub enable_expiration_date: bool,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CategoryUpdateRequest {
    pub name: Option<String>,
    pub enable_quantity: Option<bool>,
    pub enable_low_stock_threshold: Option<bool>,
    pub enable_expiration_date: Option<bool>,
}

impl From<CategoryUpdateRequest> for CategoryUpdateDBRequest {
    fn from(request: CategoryUpdateRequest) -> Self {
        Self {
            name: request.name,
            enable_quantity: request.enable_quantity,
            enable_low_stock_threshold: request.enable_low_stock_threshold,
            enable_expiration_date: request.enable_expiration_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub enable_quantity: bool,
    pub enable_low_stock_threshold: bool,
    pub enable_expiration_date: bool,
    pub created_at: DateTime<Utc>,
}

impl From<CategoryDBResponse> for CategoryResponse {
    fn from(category: CategoryDBResponse) -> Self {
        Self {
            id: category.id,
            name: category.name,
            enable_quantity: category.enable_quantity,
            enable_low_stock_threshold: category.enable_low_stock_threshold,
            enable_expiration_date: category.enable_expiration_date,
            created_at: category.created_at,
        }
    }
}

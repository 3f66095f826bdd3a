//! API models for resources.

use crate::db::models::resources::{ResourceDBResponse, ResourceUpdateDBRequest};
use crate::types::{CategoryId, ResourceId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResourceCreateRequest {
    pub name: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub low_stock_threshold: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
}

/// Partial update. Absent fields are left unchanged; `description: null`
/// and `expiration_date: null` clear the stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ResourceUpdateRequest {
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub quantity: Option<i64>,
    pub low_stock_threshold: Option<i64>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expiration_date: Option<Option<NaiveDate>>,
}

impl From<ResourceUpdateRequest> for ResourceUpdateDBRequest {
    fn from(request: ResourceUpdateRequest) -> Self {
        Self {
            name: request.name,
            category_id: request.category_id,
            quantity: request.quantity,
            low_stock_threshold: request.low_stock_threshold,
            description: request.description,
            expiration_date: request.expiration_date,
        }
    }
}

/// Query parameters for listing resources.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ResourceListParams {
    /// Only resources in this category
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceResponse {
    pub id: ResourceId,
    pub name: String,
    pub category_id: CategoryId,
    pub quantity: i64,
    pub low_stock_threshold: i64,
    pub description: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub owner_user_id: UserId,
    pub is_low_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ResourceDBResponse> for ResourceResponse {
    fn from(resource: ResourceDBResponse) -> Self {
        let is_low_stock = resource.is_low_stock();
        Self {
            id: resource.id,
            name: resource.name,
            category_id: resource.category_id,
            quantity: resource.quantity,
            low_stock_threshold: resource.low_stock_threshold,
            description: resource.description,
            expiration_date: resource.expiration_date,
            owner_user_id: resource.owner_user_id,
            is_low_stock,
            created_at: resource.created_at,
            updated_at: resource.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_distinguishes_absent_from_null() {
        let absent: ResourceUpdateRequest = serde_json::from_str("{}").unwrap();
        assert!(absent.expiration_date.is_none());
        assert!(absent.description.is_none());

        let cleared: ResourceUpdateRequest =
            serde_json::from_str(r#"{"expiration_date": null, "description": null}"#).unwrap();
        assert_eq!(cleared.expiration_date, Some(None));
        assert_eq!(cleared.description, Some(None));

        let set: ResourceUpdateRequest =
            serde_json::from_str(r#"{"expiration_date": "2026-09-15"}"#).unwrap();
        assert_eq!(
            set.expiration_date,
            Some(Some(NaiveDate::from_ymd_opt(2026, 9, 15).unwrap()))
        );
    }
}

//! JSON import/export format for resources.
//!
//! Resources export by category *name* rather than id so a dump can be
//! loaded into another instance where ids differ. Import resolves names
//! against existing categories and rejects the whole payload if any name
//! is unknown.

use crate::db::models::resources::ResourceDBResponse;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const EXPORT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceExport {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub resources: Vec<ResourceTransfer>,
}

/// One resource in the transfer format. Ownership is not carried; imported
/// resources belong to the importer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceTransfer {
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub low_stock_threshold: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
}

impl ResourceTransfer {
    pub fn from_db(resource: ResourceDBResponse, category_name: String) -> Self {
        Self {
            name: resource.name,
            category: category_name,
            quantity: resource.quantity,
            low_stock_threshold: resource.low_stock_threshold,
            description: resource.description,
            expiration_date: resource.expiration_date,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResourceImportRequest {
    pub resources: Vec<ResourceTransfer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceImportResponse {
    pub imported: u64,
}

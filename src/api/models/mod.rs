//! API request/response models, one module per entity plus shared
//! pagination and the transfer format.

pub mod auth;
pub mod categories;
pub mod groups;
pub mod notifications;
pub mod pagination;
pub mod resources;
pub mod transfer;
pub mod users;

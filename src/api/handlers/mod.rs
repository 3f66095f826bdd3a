//! HTTP handlers, one module per entity plus authentication.

pub mod auth;
pub mod categories;
pub mod groups;
pub mod notifications;
pub mod resources;
pub mod users;

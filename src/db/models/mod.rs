//! Database entity request/response models.
//!
//! Each entity has `*CreateDBRequest` / `*UpdateDBRequest` structs consumed
//! by its repository and a `*DBResponse` struct returned from it. These are
//! internal to the service layer; the API layer has its own models and
//! conversions.

pub mod categories;
pub mod groups;
pub mod notifications;
pub mod resources;
pub mod users;

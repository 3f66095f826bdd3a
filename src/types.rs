//! Common type definitions shared across layers.
//!
//! All entity ids are `i64` rowids wrapped in type aliases:
//!
//! - [`UserId`]: user account identifier
//! - [`GroupId`]: group identifier
//! - [`CategoryId`]: category identifier
//! - [`ResourceId`]: resource identifier
//! - [`NotificationId`]: notification log entry identifier

pub type UserId = i64;
pub type GroupId = i64;
pub type CategoryId = i64;
pub type ResourceId = i64;
pub type NotificationId = i64;

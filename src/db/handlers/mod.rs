//! Repositories over the SQLite schema.
//!
//! Each repository borrows a connection for its lifetime and implements the
//! common [`repository::Repository`] trait plus entity-specific lookups.

pub mod categories;
pub mod groups;
pub mod notifications;
pub mod repository;
pub mod resources;
pub mod users;

pub use categories::Categories;
pub use groups::Groups;
pub use notifications::Notifications;
pub use repository::Repository;
pub use resources::Resources;
pub use users::Users;

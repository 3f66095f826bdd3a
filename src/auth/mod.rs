//! Authentication: password hashing, the session store, and the request
//! extractor that ties them together.

pub mod current_user;
pub mod password;
pub mod session;

pub use current_user::CurrentUser;
pub use session::{SESSION_COOKIE, SessionStore};

//! HTTP API: route handlers and their request/response models.
//!
//! Authentication endpoints sit at the root under `/authentication`; the
//! rest of the API is nested under `/api/v1` and requires a session.

pub mod handlers;
pub mod models;

use crate::AppState;
use axum::Router;
use axum::routing::{delete, get, patch, post};

/// Routes mounted at the root: registration, login, logout.
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/authentication/register", post(handlers::auth::register))
        .route("/authentication/login", post(handlers::auth::login))
        .route("/authentication/logout", post(handlers::auth::logout))
}

/// Routes nested under `/api/v1`. Every handler authenticates via the
/// session cookie extractor.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/users/current", get(handlers::users::get_current_user))
        .route("/users", get(handlers::users::list_users))
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route(
            "/groups",
            get(handlers::groups::list_groups).post(handlers::groups::create_group),
        )
        .route(
            "/groups/{id}",
            get(handlers::groups::get_group).delete(handlers::groups::delete_group),
        )
        .route("/groups/{id}/join", post(handlers::groups::join_group))
        .route("/groups/leave", post(handlers::groups::leave_group))
        .route(
            "/categories",
            get(handlers::categories::list_categories).post(handlers::categories::create_category),
        )
        .route(
            "/categories/{id}",
            get(handlers::categories::get_category)
                .patch(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .route(
            "/resources",
            get(handlers::resources::list_resources).post(handlers::resources::create_resource),
        )
        .route("/resources/export", get(handlers::resources::export_resources))
        .route("/resources/import", post(handlers::resources::import_resources))
        .route(
            "/resources/{id}",
            get(handlers::resources::get_resource)
                .patch(handlers::resources::update_resource)
                .delete(handlers::resources::delete_resource),
        )
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/notifications/read-all",
            post(handlers::notifications::mark_all_notifications_read),
        )
        .route(
            "/notifications/{id}/read",
            patch(handlers::notifications::mark_notification_read),
        )
        .route(
            "/notifications/{id}",
            delete(handlers::notifications::delete_notification),
        )
}

//! OpenAPI documentation for the HTTP API, served at `/docs`.

use crate::api::{handlers, models};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

struct CookieAuthAddon;

impl Modify for CookieAuthAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "CookieAuth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    crate::auth::SESSION_COOKIE,
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&CookieAuthAddon),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::users::get_current_user,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::groups::list_groups,
        handlers::groups::create_group,
        handlers::groups::get_group,
        handlers::groups::delete_group,
        handlers::groups::join_group,
        handlers::groups::leave_group,
        handlers::categories::list_categories,
        handlers::categories::create_category,
        handlers::categories::get_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,
        handlers::resources::list_resources,
        handlers::resources::create_resource,
        handlers::resources::get_resource,
        handlers::resources::update_resource,
        handlers::resources::delete_resource,
        handlers::resources::export_resources,
        handlers::resources::import_resources,
        handlers::notifications::list_notifications,
        handlers::notifications::mark_notification_read,
        handlers::notifications::mark_all_notifications_read,
        handlers::notifications::delete_notification,
    ),
    components(schemas(
        models::auth::RegisterRequest,
        models::auth::LoginRequest,
        models::users::Role,
        models::users::UserResponse,
        models::users::UserUpdateRequest,
        models::groups::GroupCreateRequest,
        models::groups::GroupResponse,
        models::categories::CategoryCreateRequest,
        models::categories::CategoryUpdateRequest,
        models::categories::CategoryResponse,
        models::resources::ResourceCreateRequest,
        models::resources::ResourceUpdateRequest,
        models::resources::ResourceResponse,
        models::notifications::NotificationResponse,
        models::transfer::ResourceExport,
        models::transfer::ResourceTransfer,
        models::transfer::ResourceImportRequest,
        models::transfer::ResourceImportResponse,
    )),
    tags(
        (name = "authentication", description = "Registration, login, logout"),
        (name = "users", description = "User administration"),
        (name = "groups", description = "Groups and membership"),
        (name = "categories", description = "Resource categories"),
        (name = "resources", description = "Resources and import/export"),
        (name = "notifications", description = "Notification log"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_builds_and_covers_all_tags() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        for tag in ["authentication", "users", "groups", "categories", "resources", "notifications"] {
            assert!(json.contains(tag), "missing tag {tag}");
        }
    }
}

//! Stockroom: a resource/inventory tracking service.
//!
//! Users register and log in with session cookies, file resources under
//! categories, optionally share visibility through groups, and receive
//! in-app notifications (plus best-effort email) for low-stock and
//! expiration events. See [`notifier`] for the alerting rules.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod errors;
pub mod notifier;
pub mod openapi;
pub mod telemetry;
#[cfg(test)]
pub(crate) mod test_utils;
pub mod types;

pub use config::Config;
pub use errors::Error;

use crate::api::models::users::Role;
use crate::auth::SessionStore;
use crate::auth::password::hash_password;
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::UserCreateDBRequest;
use crate::email::EmailService;
use crate::openapi::ApiDoc;
use crate::types::UserId;
use axum::Router;
use axum::routing::get;
use bon::Builder;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Shared application state handed to every handler.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub sessions: Arc<SessionStore>,
    pub email: Option<Arc<EmailService>>,
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open the SQLite pool and run migrations.
pub async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    migrator().run(&pool).await?;
    Ok(pool)
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: if a user with the configured username already exists, this
/// does nothing. Returns the id of the created user, if one was created.
/// With no admin password configured, seeding is skipped entirely.
pub async fn create_initial_admin_user(
    config: &Config,
    pool: &SqlitePool,
) -> Result<Option<UserId>, Error> {
    let Some(password) = config.admin_password.clone() else {
        tracing::debug!("No admin password configured; skipping admin seed");
        return Ok(None);
    };

    let mut conn = pool.acquire().await.map_err(|e| Error::Internal(e.into()))?;
    let mut users = Users::new(&mut conn);

    if users.get_by_username(&config.admin_username).await?.is_some() {
        return Ok(None);
    }

    let password_hash = hash_password(password).await?;
    let admin = users
        .create(&UserCreateDBRequest {
            username: config.admin_username.clone(),
            email: config.admin_email.clone(),
            role: Role::Admin,
            group_id: None,
            password_hash,
        })
        .await?;

    info!(user_id = admin.id, username = %admin.username, "Created initial admin user");
    Ok(Some(admin.id))
}

async fn healthz() -> &'static str {
    "ok"
}

/// Assemble the full application router.
pub fn build_router(state: AppState) -> Router {
    let enable_request_logging = state.config.enable_request_logging;

    let mut router = Router::new()
        .merge(api::auth_router())
        .nest("/api/v1", api::api_router())
        .route("/healthz", get(healthz))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state);

    if enable_request_logging {
        router = router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );
    }

    router
}

/// Background scan tasks and their lifecycle.
pub struct BackgroundServices {
    background_tasks: Vec<tokio::task::JoinHandle<()>>,
    shutdown_token: tokio_util::sync::CancellationToken,
}

impl BackgroundServices {
    pub fn start(state: AppState) -> Self {
        let shutdown_token = tokio_util::sync::CancellationToken::new();

        let background_tasks = vec![
            tokio::spawn(notifier::jobs::run_low_stock_job(
                state.clone(),
                shutdown_token.clone(),
            )),
            tokio::spawn(notifier::jobs::run_expiration_job(
                state,
                shutdown_token.clone(),
            )),
        ];

        Self {
            background_tasks,
            shutdown_token,
        }
    }

    /// Signal all background tasks to stop and wait for them.
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();
        for handle in self.background_tasks {
            let _ = handle.await;
        }
    }
}

pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create a new application instance with all resources initialized.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = setup_database(&config).await?;
        create_initial_admin_user(&config, &pool).await?;

        let sessions = Arc::new(SessionStore::new(chrono::Duration::from_std(
            config.session_ttl,
        )?));

        let email = match &config.email {
            Some(email_config) => Some(Arc::new(EmailService::new(email_config)?)),
            None => None,
        };

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .sessions(sessions)
            .maybe_email(email)
            .build();

        let bg_services = BackgroundServices::start(state.clone());
        let router = build_router(state);

        Ok(Self {
            router,
            config,
            pool,
            bg_services,
        })
    }

    /// Start serving the application.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Stockroom listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        self.bg_services.shutdown().await;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    fn admin_config() -> Config {
        Config {
            admin_password: Some("correct-horse-battery".to_string()),
            ..Config::default()
        }
    }

    async fn register(server: &axum_test::TestServer, username: &str) -> axum_test::TestResponse {
        server
            .post("/authentication/register")
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "hunter2hunter2",
            }))
            .await
    }

    async fn login(server: &axum_test::TestServer, username: &str, password: &str) -> axum_test::TestResponse {
        server
            .post("/authentication/login")
            .json(&json!({ "username": username, "password": password }))
            .await
    }

    #[sqlx::test]
    async fn admin_seed_is_idempotent(pool: SqlitePool) {
        let config = admin_config();

        let first = create_initial_admin_user(&config, &pool).await.unwrap();
        assert!(first.is_some());

        let second = create_initial_admin_user(&config, &pool).await.unwrap();
        assert!(second.is_none());

        let skipped = create_initial_admin_user(&Config::default(), &pool).await.unwrap();
        assert!(skipped.is_none());
    }

    #[sqlx::test]
    async fn register_login_logout_flow(pool: SqlitePool) {
        let server = test_utils::server(pool);

        let response = register(&server, "alice").await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["role"], "user");

        // Registration sets the session cookie; we are already logged in.
        let current = server.get("/api/v1/users/current").await;
        assert_eq!(current.status_code(), StatusCode::OK);

        server.post("/authentication/logout").await;
        let after = server.get("/api/v1/users/current").await;
        assert_eq!(after.status_code(), StatusCode::UNAUTHORIZED);

        // Logging back in restores access.
        let response = login(&server, "alice", "hunter2hunter2").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let current = server.get("/api/v1/users/current").await;
        assert_eq!(current.status_code(), StatusCode::OK);
    }

    #[sqlx::test]
    async fn login_failures_share_one_generic_message(pool: SqlitePool) {
        let server = test_utils::server(pool);
        register(&server, "bob").await;
        server.post("/authentication/logout").await;

        let wrong_password = login(&server, "bob", "wrong-password").await;
        let unknown_user = login(&server, "nobody", "hunter2hunter2").await;

        assert_eq!(wrong_password.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_user.status_code(), StatusCode::UNAUTHORIZED);
        // Identical bodies: no username enumeration.
        assert_eq!(wrong_password.json::<Value>(), unknown_user.json::<Value>());
    }

    #[sqlx::test]
    async fn registration_validation_and_conflicts(pool: SqlitePool) {
        let server = test_utils::server(pool);

        let short = server
            .post("/authentication/register")
            .json(&json!({ "username": "x", "email": "x@example.com", "password": "short" }))
            .await;
        assert_eq!(short.status_code(), StatusCode::BAD_REQUEST);

        register(&server, "carol").await;
        let duplicate = register(&server, "carol").await;
        assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

        let same_email = server
            .post("/authentication/register")
            .json(&json!({
                "username": "carol2",
                "email": "carol@example.com",
                "password": "hunter2hunter2",
            }))
            .await;
        assert_eq!(same_email.status_code(), StatusCode::CONFLICT);
    }

    #[sqlx::test]
    async fn category_mutation_is_admin_only(pool: SqlitePool) {
        let config = admin_config();
        create_initial_admin_user(&config, &pool).await.unwrap();
        let server = test_utils::server_with(pool, config.clone());

        register(&server, "dave").await;
        let forbidden = server
            .post("/api/v1/categories")
            .json(&json!({ "name": "tools" }))
            .await;
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        login(&server, &config.admin_username, "correct-horse-battery").await;
        let created = server
            .post("/api/v1/categories")
            .json(&json!({ "name": "tools" }))
            .await;
        assert_eq!(created.status_code(), StatusCode::CREATED);

        // Any authenticated user can read them.
        login(&server, "dave", "hunter2hunter2").await;
        let listed = server.get("/api/v1/categories").await;
        assert_eq!(listed.status_code(), StatusCode::OK);
        assert_eq!(listed.json::<Vec<Value>>().len(), 1);
    }

    #[sqlx::test]
    async fn category_delete_conflicts_while_referenced(pool: SqlitePool) {
        let config = admin_config();
        create_initial_admin_user(&config, &pool).await.unwrap();
        let server = test_utils::server_with(pool, config.clone());
        login(&server, &config.admin_username, "correct-horse-battery").await;

        let category: Value = server
            .post("/api/v1/categories")
            .json(&json!({ "name": "chemicals" }))
            .await
            .json();
        let resource: Value = server
            .post("/api/v1/resources")
            .json(&json!({ "name": "acetone", "category_id": category["id"], "quantity": 4 }))
            .await
            .json();

        let blocked = server
            .delete(&format!("/api/v1/categories/{}", category["id"]))
            .await;
        assert_eq!(blocked.status_code(), StatusCode::CONFLICT);

        // Row untouched; still retrievable.
        let still_there = server
            .get(&format!("/api/v1/categories/{}", category["id"]))
            .await;
        assert_eq!(still_there.status_code(), StatusCode::OK);

        server
            .delete(&format!("/api/v1/resources/{}", resource["id"]))
            .await;
        let deleted = server
            .delete(&format!("/api/v1/categories/{}", category["id"]))
            .await;
        assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);
    }

    #[sqlx::test]
    async fn resource_visibility_follows_ownership_and_groups(pool: SqlitePool) {
        let config = admin_config();
        create_initial_admin_user(&config, &pool).await.unwrap();
        let server = test_utils::server_with(pool, config.clone());

        login(&server, &config.admin_username, "correct-horse-battery").await;
        let category: Value = server
            .post("/api/v1/categories")
            .json(&json!({ "name": "shared" }))
            .await
            .json();

        register(&server, "erin").await;
        let mine: Value = server
            .post("/api/v1/resources")
            .json(&json!({ "name": "mine", "category_id": category["id"], "quantity": 1 }))
            .await
            .json();

        register(&server, "frank").await;
        let hidden = server.get(&format!("/api/v1/resources/{}", mine["id"])).await;
        assert_eq!(hidden.status_code(), StatusCode::NOT_FOUND);
        assert!(server.get("/api/v1/resources").await.json::<Vec<Value>>().is_empty());

        // Admin sees everything.
        login(&server, &config.admin_username, "correct-horse-battery").await;
        let visible = server.get(&format!("/api/v1/resources/{}", mine["id"])).await;
        assert_eq!(visible.status_code(), StatusCode::OK);
    }

    #[sqlx::test]
    async fn low_stock_write_emits_notification(pool: SqlitePool) {
        let config = admin_config();
        create_initial_admin_user(&config, &pool).await.unwrap();
        let server = test_utils::server_with(pool, config.clone());
        login(&server, &config.admin_username, "correct-horse-battery").await;

        let category: Value = server
            .post("/api/v1/categories")
            .json(&json!({ "name": "consumables" }))
            .await
            .json();
        let resource: Value = server
            .post("/api/v1/resources")
            .json(&json!({
                "name": "gloves",
                "category_id": category["id"],
                "quantity": 10,
                "low_stock_threshold": 5,
            }))
            .await
            .json();

        // Above threshold: nothing yet.
        assert!(server.get("/api/v1/notifications").await.json::<Vec<Value>>().is_empty());

        let updated = server
            .patch(&format!("/api/v1/resources/{}", resource["id"]))
            .json(&json!({ "quantity": 3 }))
            .await;
        assert_eq!(updated.status_code(), StatusCode::OK);
        assert_eq!(updated.json::<Value>()["is_low_stock"], true);

        let notifications: Vec<Value> = server.get("/api/v1/notifications").await.json();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0]["kind"], "low_stock");
        assert_eq!(notifications[0]["is_read"], false);

        // Read lifecycle.
        let marked = server
            .patch(&format!("/api/v1/notifications/{}/read", notifications[0]["id"]))
            .await;
        assert_eq!(marked.json::<Value>()["is_read"], true);
        let unread: Vec<Value> = server
            .get("/api/v1/notifications?unread_only=true")
            .await
            .json();
        assert!(unread.is_empty());
    }

    #[sqlx::test]
    async fn negative_amounts_are_rejected(pool: SqlitePool) {
        let config = admin_config();
        create_initial_admin_user(&config, &pool).await.unwrap();
        let server = test_utils::server_with(pool, config.clone());
        login(&server, &config.admin_username, "correct-horse-battery").await;

        let category: Value = server
            .post("/api/v1/categories")
            .json(&json!({ "name": "c" }))
            .await
            .json();

        let negative = server
            .post("/api/v1/resources")
            .json(&json!({ "name": "bad", "category_id": category["id"], "quantity": -1 }))
            .await;
        assert_eq!(negative.status_code(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn group_join_missing_group_leaves_membership_alone(pool: SqlitePool) {
        let config = admin_config();
        create_initial_admin_user(&config, &pool).await.unwrap();
        let server = test_utils::server_with(pool, config.clone());

        login(&server, &config.admin_username, "correct-horse-battery").await;
        let group: Value = server
            .post("/api/v1/groups")
            .json(&json!({ "name": "ops" }))
            .await
            .json();

        register(&server, "gail").await;
        let joined: Value = server
            .post(&format!("/api/v1/groups/{}/join", group["id"]))
            .await
            .json();
        assert_eq!(joined["group_id"], group["id"]);

        let missing = server.post("/api/v1/groups/9999/join").await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        let current: Value = server.get("/api/v1/users/current").await.json();
        assert_eq!(current["group_id"], group["id"]);

        let left: Value = server.post("/api/v1/groups/leave").await.json();
        assert_eq!(left["group_id"], Value::Null);
    }

    #[sqlx::test]
    async fn export_import_roundtrip(pool: SqlitePool) {
        let config = admin_config();
        create_initial_admin_user(&config, &pool).await.unwrap();
        let server = test_utils::server_with(pool, config.clone());
        login(&server, &config.admin_username, "correct-horse-battery").await;

        let category: Value = server
            .post("/api/v1/categories")
            .json(&json!({ "name": "field-kit" }))
            .await
            .json();
        for name in ["tent", "stove"] {
            server
                .post("/api/v1/resources")
                .json(&json!({ "name": name, "category_id": category["id"], "quantity": 2 }))
                .await;
        }

        let export: Value = server.get("/api/v1/resources/export").await.json();
        assert_eq!(export["resources"].as_array().unwrap().len(), 2);
        assert_eq!(export["resources"][0]["category"], "field-kit");

        let imported = server
            .post("/api/v1/resources/import")
            .json(&json!({ "resources": export["resources"] }))
            .await;
        assert_eq!(imported.status_code(), StatusCode::CREATED);
        assert_eq!(imported.json::<Value>()["imported"], 2);

        let all: Vec<Value> = server.get("/api/v1/resources").await.json();
        assert_eq!(all.len(), 4);

        let unknown_category = server
            .post("/api/v1/resources/import")
            .json(&json!({ "resources": [{
                "name": "x", "category": "no-such", "quantity": 1, "low_stock_threshold": 0
            }] }))
            .await;
        assert_eq!(unknown_category.status_code(), StatusCode::BAD_REQUEST);
        // All-or-nothing: the failed import added no rows.
        let after: Vec<Value> = server.get("/api/v1/resources").await.json();
        assert_eq!(after.len(), 4);
    }

    #[sqlx::test]
    async fn admin_can_manage_users(pool: SqlitePool) {
        let config = admin_config();
        create_initial_admin_user(&config, &pool).await.unwrap();
        let server = test_utils::server_with(pool, config.clone());

        register(&server, "hana").await;
        let hana: Value = server.get("/api/v1/users/current").await.json();

        // Non-admin cannot list users.
        let forbidden = server.get("/api/v1/users").await;
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);

        login(&server, &config.admin_username, "correct-horse-battery").await;
        let users: Vec<Value> = server.get("/api/v1/users").await.json();
        assert_eq!(users.len(), 2);

        let promoted: Value = server
            .patch(&format!("/api/v1/users/{}", hana["id"]))
            .json(&json!({ "role": "admin" }))
            .await
            .json();
        assert_eq!(promoted["role"], "admin");

        let gone = server.delete(&format!("/api/v1/users/{}", hana["id"])).await;
        assert_eq!(gone.status_code(), StatusCode::NO_CONTENT);
        let missing = server.get(&format!("/api/v1/users/{}", hana["id"])).await;
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn deleting_a_user_revokes_their_sessions(pool: SqlitePool) {
        let config = admin_config();
        create_initial_admin_user(&config, &pool).await.unwrap();

        // Two servers over one database: separate cookie jars, shared state.
        let state = test_utils::state_with(pool.clone(), config.clone());
        let server_config = axum_test::TestServerConfig {
            save_cookies: true,
            ..Default::default()
        };
        let user_server =
            axum_test::TestServer::new_with_config(build_router(state.clone()), server_config.clone())
                .unwrap();
        let admin_server =
            axum_test::TestServer::new_with_config(build_router(state), server_config).unwrap();

        register(&user_server, "ivan").await;
        let ivan: Value = user_server.get("/api/v1/users/current").await.json();

        login(&admin_server, &config.admin_username, "correct-horse-battery").await;
        admin_server.delete(&format!("/api/v1/users/{}", ivan["id"])).await;

        let after = user_server.get("/api/v1/users/current").await;
        assert_eq!(after.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn healthz_and_docs_are_public(pool: SqlitePool) {
        let server = test_utils::server(pool);

        assert_eq!(server.get("/healthz").await.status_code(), StatusCode::OK);
        assert_eq!(server.get("/docs").await.status_code(), StatusCode::OK);
    }
}

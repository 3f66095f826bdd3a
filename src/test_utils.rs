//! Shared helpers for in-crate tests.

use crate::auth::SessionStore;
use crate::{AppState, Config, build_router};
use axum_test::{TestServer, TestServerConfig};
use sqlx::SqlitePool;
use std::sync::Arc;

pub fn state_with(pool: SqlitePool, config: Config) -> AppState {
    let ttl = chrono::Duration::from_std(config.session_ttl).expect("session ttl in range");
    AppState::builder()
        .db(pool)
        .config(config)
        .sessions(Arc::new(SessionStore::new(ttl)))
        .build()
}

pub fn state(pool: SqlitePool) -> AppState {
    state_with(pool, Config::default())
}

/// Test server that remembers cookies across requests, so login flows
/// behave like a browser.
pub fn server(pool: SqlitePool) -> TestServer {
    server_with(pool, Config::default())
}

pub fn server_with(pool: SqlitePool, config: Config) -> TestServer {
    let config_server = TestServerConfig {
        save_cookies: true,
        ..Default::default()
    };
    TestServer::new_with_config(build_router(state_with(pool, config)), config_server)
        .expect("test server")
}

//! Registration, login, and logout.

use crate::AppState;
use crate::api::models::auth::{LoginRequest, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, RegisterRequest};
use crate::api::models::users::{Role, UserResponse};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::SESSION_COOKIE;
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::UserCreateDBRequest;
use crate::errors::{Error, Result};
use axum::Json;
use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};

fn session_cookie(token: &str, max_age_secs: u64) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={max_age_secs}")
}

fn clearing_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0")
}

fn validate_registration(request: &RegisterRequest) -> Result<()> {
    if request.username.trim().is_empty() {
        return Err(Error::BadRequest("Username must not be empty".to_string()));
    }
    if !request.email.contains('@') {
        return Err(Error::BadRequest("Invalid email address".to_string()));
    }
    if request.password.len() < MIN_PASSWORD_LEN || request.password.len() > MAX_PASSWORD_LEN {
        return Err(Error::BadRequest(format!(
            "Password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/authentication/register",
    tag = "authentication",
    summary = "Register a new account",
    responses(
        (status = 201, description = "Account created, session cookie set", body = UserResponse),
        (status = 400, description = "Invalid username, email, or password"),
        (status = 409, description = "Username or email already taken")
    )
)]
#[tracing::instrument(skip_all, fields(username = %request.username))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    validate_registration(&request)?;

    let password_hash = hash_password(request.password).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email,
            role: Role::User,
            group_id: None,
            password_hash,
        })
        .await?;

    let token = state.sessions.create(user.id);
    let cookie = session_cookie(&token, state.config.session_ttl.as_secs());

    tracing::info!(user_id = user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(UserResponse::from(user)),
    ))
}

#[utoipa::path(
    post,
    path = "/authentication/login",
    tag = "authentication",
    summary = "Log in",
    responses(
        (status = 200, description = "Logged in, session cookie set", body = UserResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
#[tracing::instrument(skip_all, fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_username(&request.username)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    if !verify_password(request.password, user.password_hash.clone()).await? {
        return Err(Error::InvalidCredentials);
    }

    let token = state.sessions.create(user.id);
    let cookie = session_cookie(&token, state.config.session_ttl.as_secs());

    tracing::info!(user_id = user.id, "user logged in");
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(UserResponse::from(user)),
    ))
}

#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    summary = "Log out",
    responses(
        (status = 200, description = "Session revoked, cookie cleared")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    // Revoking an already-dead token is fine; logout is idempotent.
    let token = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string());

    if let Some(token) = token {
        state.sessions.revoke(&token);
    }

    AppendHeaders([(SET_COOKIE, clearing_cookie())])
}

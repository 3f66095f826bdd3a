//! Request extractor for the authenticated user.
//!
//! Walks the `Cookie` header for the session cookie, resolves the token
//! against the in-memory store, then loads the user row. Any failure along
//! the way is a 401; handlers never see a half-authenticated request.

use crate::AppState;
use crate::auth::session::SESSION_COOKIE;
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::UserDBResponse;
use crate::errors::Error;
use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: UserDBResponse,
}

impl CurrentUser {
    /// Admin gate for handlers that manage other users' data.
    pub fn require_admin(&self) -> Result<(), Error> {
        if self.user.role.is_admin() {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }
}

/// Pull the session cookie's value out of the request headers, if present.
pub fn session_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Error> {
        let token = session_token(parts).ok_or(Error::Unauthorized)?;
        let user_id = state.sessions.resolve(&token).ok_or(Error::Unauthorized)?;

        let mut conn = state
            .db
            .acquire()
            .await
            .map_err(|e| Error::Internal(e.into()))?;
        let user = Users::new(&mut conn).get_by_id(user_id).await?;

        match user {
            Some(user) => Ok(CurrentUser { user }),
            None => {
                // The account was deleted while the session was live.
                state.sessions.revoke(&token);
                Err(Error::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_cookie(header: &str) -> Parts {
        let (parts, ()) = Request::builder()
            .header(COOKIE, header)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn finds_session_among_other_cookies() {
        let parts = parts_with_cookie("theme=dark; sessionId=abc123; lang=en");
        assert_eq!(session_token(&parts), Some("abc123".to_string()));
    }

    #[test]
    fn missing_cookie_yields_none() {
        let parts = parts_with_cookie("theme=dark");
        assert_eq!(session_token(&parts), None);
    }

    #[test]
    fn admin_gate_checks_role() {
        use crate::api::models::users::Role;

        let user = |role| CurrentUser {
            user: UserDBResponse {
                id: 1,
                username: "u".into(),
                email: "u@example.com".into(),
                role,
                group_id: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
                password_hash: "x".into(),
            },
        };

        assert!(user(Role::User).require_admin().is_err());
        let admin = user(Role::Admin);
        // Pure check, stable across repeated calls.
        assert!(admin.require_admin().is_ok());
        assert!(admin.require_admin().is_ok());
    }
}

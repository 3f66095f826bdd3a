//! Application error type and its HTTP mapping.
//!
//! Handlers return [`Error`] and let the [`IntoResponse`] impl pick the
//! status code and a safe client-facing message. Internal detail only ever
//! reaches the logs.

use crate::db::errors::DbError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing, invalid, or expired session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Login failure. One generic message for unknown user and wrong
    /// password, so usernames cannot be enumerated.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated but not allowed to perform the operation.
    #[error("Forbidden")]
    Forbidden,

    /// Entity does not exist (or is hidden from the caller).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// State conflict, e.g. duplicate names or deleting a category in use.
    #[error("{0}")]
    Conflict(String),

    /// Malformed or semantically invalid request.
    #[error("{0}")]
    BadRequest(String),

    /// Database failure bubbled up from a repository.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Anything else; never shown to clients.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Database(db) => match db {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => {
                    StatusCode::BAD_REQUEST
                }
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Database and internal failures are reduced to
    /// generic text so constraint names and SQL never leak.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthorized => "Authentication required".to_string(),
            Error::InvalidCredentials => "Invalid username or password".to_string(),
            Error::Forbidden => "Insufficient permissions".to_string(),
            Error::NotFound(what) => format!("{what} not found"),
            Error::Conflict(msg) | Error::BadRequest(msg) => msg.clone(),
            Error::Database(db) => match db {
                DbError::NotFound => "Not found".to_string(),
                DbError::UniqueViolation { .. } => match db.violated_column() {
                    Some(column) => format!("Value already in use: {column}"),
                    None => "Value already in use".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Referenced entity does not exist".to_string(),
                DbError::CheckViolation { .. } => "Value out of range".to_string(),
                DbError::Other(_) => "Internal server error".to_string(),
            },
            Error::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(error = ?self, status = %status, "request rejected");
        }

        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn db_errors_map_to_expected_statuses() {
        let unique = Error::Database(DbError::UniqueViolation {
            constraint: None,
            message: "UNIQUE constraint failed: users.username".to_string(),
        });
        assert_eq!(unique.status_code(), StatusCode::CONFLICT);
        assert_eq!(unique.user_message(), "Value already in use: users.username");

        let missing = Error::Database(DbError::NotFound);
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let fk = Error::Database(DbError::ForeignKeyViolation {
            constraint: None,
            message: "FOREIGN KEY constraint failed".to_string(),
        });
        assert_eq!(fk.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test_log::test]
    fn internal_detail_never_reaches_clients() {
        let err = Error::Internal(anyhow::anyhow!("connection pool exhausted at 10.0.0.3"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Internal server error");
    }
}

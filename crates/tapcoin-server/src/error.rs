//! Error types for the HTTP layer.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Bodies
//! are always `{"error": "...", "status": <code>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tapcoin_core::session::SessionError;
use tapcoin_db::{AuthError, PersistenceError};

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested view does not exist (never opened or dismantled).
    #[error("not found: {0}")]
    NotFound(String),

    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// The authentication collaborator refused or failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The record store failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Auth(e) => Self::Auth(e),
            SessionError::Persistence(e) => Self::Persistence(e),
        }
    }
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidUuid(_) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthError::EmailExists { .. }) => StatusCode::CONFLICT,
            Self::Auth(AuthError::InvalidCredentials | AuthError::Provider(_)) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Auth(AuthError::Postgres(_) | AuthError::Transport(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Auth(AuthError::Hashing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request refused");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_client_statuses() {
        let dup = ApiError::from(AuthError::EmailExists {
            email: "a@b.c".to_owned(),
        });
        assert_eq!(dup.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Hashing("out of memory".to_owned())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn session_errors_unwrap_into_api_errors() {
        let err = ApiError::from(SessionError::Persistence(PersistenceError::Unavailable(
            "down".to_owned(),
        )));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

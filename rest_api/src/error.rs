// rest_api/src/error.rs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use lib::TriageError;
use models::errors::FieldErrors;
use security::AuthError;

#[derive(Debug, Error)]
pub enum RestApiError {
    #[error("{0}")]
    Validation(FieldErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("Unauthenticated.")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("CSRF token mismatch.")]
    CsrfMismatch,
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, RestApiError>;

impl RestApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RestApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RestApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            RestApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            RestApiError::NotFound(_) => StatusCode::NOT_FOUND,
            RestApiError::Conflict(_) => StatusCode::CONFLICT,
            // 419: CSRF token missing or stale
            RestApiError::CsrfMismatch => {
                StatusCode::from_u16(419).unwrap_or(StatusCode::FORBIDDEN)
            }
            RestApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            RestApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TriageError> for RestApiError {
    fn from(err: TriageError) -> Self {
        match err {
            TriageError::Validation(errors) => RestApiError::Validation(errors),
            TriageError::NotFound { .. } => RestApiError::NotFound(err.to_string()),
            TriageError::Conflict(message) => RestApiError::Conflict(message),
            TriageError::InvalidTransition(transition) => RestApiError::Conflict(transition.to_string()),
            TriageError::PermissionDenied(message) => RestApiError::Forbidden(message),
            TriageError::Upstream(message) => RestApiError::Upstream(message),
            other => RestApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for RestApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                RestApiError::Validation(FieldErrors::single_message("email", &err.to_string()))
            }
            AuthError::Unauthenticated => RestApiError::Unauthenticated,
            AuthError::CsrfMismatch => RestApiError::CsrfMismatch,
            AuthError::Forbidden(message) => RestApiError::Forbidden(message),
            AuthError::JwtError(message) => RestApiError::Internal(message),
            AuthError::Storage(err) => err.into(),
        }
    }
}

impl IntoResponse for RestApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            RestApiError::Validation(errors) => json!({
                "status": "error",
                "message": errors.to_string(),
                "errors": errors,
            }),
            RestApiError::Internal(detail) => {
                tracing::error!(%detail, "request failed");
                json!({ "status": "error", "message": "Server Error" })
            }
            other => json!({ "status": "error", "message": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

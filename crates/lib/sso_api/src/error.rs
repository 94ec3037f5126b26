//! Transport-level errors.
//!
//! Every externally visible failure is exactly one [`ApiError`] kind. Bodies
//! carry a fixed message; details stay in the logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sso_core::auth::AuthError;
use thiserror::Error;
use tracing::error;

/// Convenience alias for handler return types.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("unimplemented: {0}")]
    Unimplemented(String),

    /// The transport deadline expired before the call completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists(_) => StatusCode::CONFLICT,
            ApiError::Unimplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::DeadlineExceeded => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable snake_case kind used as the `code` field of the body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidArgument(_) => "invalid_argument",
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::PermissionDenied(_) => "permission_denied",
            ApiError::NotFound(_) => "not_found",
            ApiError::AlreadyExists(_) => "already_exists",
            ApiError::Unimplemented(_) => "unimplemented",
            ApiError::DeadlineExceeded => "deadline_exceeded",
            ApiError::Internal(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::InvalidArgument(m)
            | ApiError::Unauthenticated(m)
            | ApiError::PermissionDenied(m)
            | ApiError::NotFound(m)
            | ApiError::AlreadyExists(m)
            | ApiError::Unimplemented(m) => m.as_str(),
            ApiError::DeadlineExceeded => "deadline exceeded",
            ApiError::Internal(detail) => {
                error!(detail = %detail, "internal error");
                "internal error"
            }
        };
        let body = Json(ErrorBody {
            code: self.code(),
            message,
        });
        (self.status(), body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => ApiError::Unauthenticated("invalid credentials".into()),
            AuthError::UserAlreadyExists => ApiError::AlreadyExists("user already exists".into()),
            AuthError::AppAlreadyExists => ApiError::AlreadyExists("app already exists".into()),
            AuthError::AdminAlreadyExists => ApiError::AlreadyExists("admin already exists".into()),
            AuthError::UserNotFound => ApiError::NotFound("user not found".into()),
            AuthError::AdminNotFound => ApiError::NotFound("admin not found".into()),
            AuthError::Entropy(_)
            | AuthError::Token(_)
            | AuthError::Storage(_)
            | AuthError::Internal(_) => ApiError::Internal(e.to_string()),
        }
    }
}

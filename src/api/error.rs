use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::auth::TokenError;
use crate::services::{AuthError, EnrollmentError, StudentError};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),

    Unauthorized(String),

    NotFound(String),

    InternalError(String),

    ServiceUnavailable(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            Self::ServiceUnavailable(msg) => write!(f, "Service unavailable: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            Self::ServiceUnavailable(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Storage is unavailable".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MissingSigningKey => Self::InternalError(err.to_string()),
            TokenError::IncompleteSubject => Self::BadRequest(err.to_string()),
            TokenError::InvalidCredentials | TokenError::Expired => {
                Self::Unauthorized(err.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::NotVerified
            | AuthError::NotActive
            | AuthError::RoleNotAllowed(_) => Self::Unauthorized(err.to_string()),
            AuthError::NotFound => Self::NotFound(err.to_string()),
            AuthError::Token(inner) => inner.into(),
            AuthError::Persistence(msg) => Self::ServiceUnavailable(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<StudentError> for ApiError {
    fn from(err: StudentError) -> Self {
        match err {
            StudentError::NoCodeFound
            | StudentError::RateLimited
            | StudentError::IncorrectCode
            | StudentError::CodeExpired => Self::BadRequest(err.to_string()),
            StudentError::NotVerified => Self::Unauthorized(err.to_string()),
            StudentError::NotFound => Self::NotFound(err.to_string()),
            StudentError::Token(inner) => inner.into(),
            StudentError::Persistence(msg) => Self::ServiceUnavailable(msg),
        }
    }
}

impl From<EnrollmentError> for ApiError {
    fn from(err: EnrollmentError) -> Self {
        match err {
            EnrollmentError::TooManyAttempts
            | EnrollmentError::IncorrectActivationCode
            | EnrollmentError::BatchOutsideOrganization => Self::BadRequest(err.to_string()),
            EnrollmentError::NotFound => Self::NotFound(err.to_string()),
            EnrollmentError::Persistence(msg) => Self::ServiceUnavailable(msg),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
}

//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use chiroctl_core::domain::ValidationError;
use chiroctl_core::{CoreError, RepoError};

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Body or query string could not be decoded (400)
    BadRequest { message: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Duplicate or still-referenced data (409)
    Conflict { kind: &'static str, message: String },

    /// Request is well-formed but the chapter data cannot satisfy it (422)
    Unprocessable { kind: &'static str, message: String },

    /// Storage or other internal error (500, logged)
    Internal { message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": e.to_string()
                }),
            ),
            Self::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": message
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Conflict { kind, message } => (
                StatusCode::CONFLICT,
                json!({
                    "error": kind,
                    "message": message
                }),
            ),
            Self::Unprocessable { kind, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": kind,
                    "message": message
                }),
            ),
            Self::Internal { message } => {
                // Log the actual error, return generic message
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        let kind = e.kind();
        match e {
            CoreError::Validation(e) => Self::Validation(e),
            CoreError::NotFound { resource, id } => Self::NotFound { resource, id },
            CoreError::Conflict { .. } | CoreError::InUse { .. } => Self::Conflict {
                kind,
                message: e.to_string(),
            },
            CoreError::NoCurrentWorkYear { .. }
            | CoreError::NoWorkYearForDate { .. }
            | CoreError::NoMatchingGroup { .. } => Self::Unprocessable {
                kind,
                message: e.to_string(),
            },
            CoreError::Repo(e) => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        CoreError::from(e).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest {
            message: rejection.body_text(),
        }
    }
}

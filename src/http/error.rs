//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::RepositoryError;

/// A single field-level validation failure, e.g.
/// `{"loc": ["body", "isbn"], "msg": "ISBN must be exactly 10 digits."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Location of the offending field, outermost first
    pub loc: Vec<String>,
    /// Human-readable message
    pub msg: String,
}

impl FieldError {
    pub fn body(field: &str, msg: impl Into<String>) -> Self {
        Self {
            loc: vec!["body".to_string(), field.to_string()],
            msg: msg.into(),
        }
    }

    pub fn query(param: &str, msg: impl Into<String>) -> Self {
        Self {
            loc: vec!["query".to_string(), param.to_string()],
            msg: msg.into(),
        }
    }
}

/// Error response body. All errors take the shape `{"error": "<message>"}`;
/// validation failures additionally carry field-level details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or out-of-range input (400)
    BadRequest(String),
    /// Field-level validation failures (400 with details)
    Validation(Vec<FieldError>),
    /// Referenced entity absent (404)
    NotFound(String),
    /// Uniqueness violation (409)
    Conflict(String),
    /// Unexpected store failure (500)
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: msg,
                    details: None,
                },
            ),
            AppError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Validation failed.".to_string(),
                    details: Some(details),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: msg,
                    details: None,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: msg,
                    details: None,
                },
            ),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: msg,
                        details: None,
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { message, .. } => AppError::NotFound(message),
            RepositoryError::Conflict { message, .. } => AppError::Conflict(message),
            RepositoryError::ValidationError { message, .. } => AppError::BadRequest(message),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Error types for Gallery Service
///
/// Every fallible core operation returns `AppError`. Presentation (flash
/// messages, redirects, status pages) is left to the caller; the HTTP layer
/// maps each variant to a status code and a JSON body.
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which kind of lookup came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundKind {
    City,
    Tag,
    Post,
}

impl fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundKind::City => write!(f, "city"),
            NotFoundKind::Tag => write!(f, "tag"),
            NotFoundKind::Post => write!(f, "post"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing required input (empty city, empty tag, bad sort mode)
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: no such {kind} '{value}'")]
    NotFound { kind: NotFoundKind, value: String },

    /// Storage unreachable or timed out
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A write collided with an existing record (duplicate post id)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: NotFoundKind, value: impl Into<String>) -> Self {
        AppError::NotFound {
            kind,
            value: value.into(),
        }
    }

    pub fn post_not_found(post_id: i64) -> Self {
        Self::not_found(NotFoundKind::Post, post_id.to_string())
    }
}

/// Connectivity failures surface as `Unavailable` and unique violations as
/// `Conflict`; anything else the database reports is an internal error.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => AppError::Unavailable(err.to_string()),
            other => AppError::Internal(format!("Database error: {}", other)),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        if let AppError::NotFound { kind, value } = self {
            body["kind"] = serde_json::json!(kind);
            body["value"] = serde_json::json!(value);
        }

        HttpResponse::build(status).json(body)
    }
}

/// Result type alias for service operations
pub type AppResult<T> = Result<T, AppError>;

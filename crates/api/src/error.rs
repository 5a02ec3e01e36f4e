//! API error taxonomy and its HTTP mapping.
//!
//! Every failure a handler can produce is one of these kinds; nothing else
//! crosses the handler boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use engine::EngineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No credential, or one the verifier rejected.
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated, but missing a required permission.
    #[error("{0}")]
    Forbidden(String),

    /// An identifier that is not a well-formed UUID.
    #[error("{0}")]
    InvalidIdentifier(String),

    /// Well-formed identifier with no matching entity (or the wrong parent).
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),

    /// Missing field, malformed body, or an invalid graph element.
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable kind, e.g. `not_found`.
    pub kind: String,
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidIdentifier(_) => StatusCode::NOT_FOUND,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::InvalidIdentifier(_) => "invalid_identifier",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            kind: self.kind().to_string(),
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound { kind, .. } => {
                ApiError::NotFound(format!("{} does not exist.", capitalize(kind.as_str())))
            }
            EngineError::InvalidIdentifier { kind, raw } => {
                ApiError::InvalidIdentifier(format!("Invalid ID for {kind}: '{raw}'"))
            }
            EngineError::Conflict(_) => ApiError::Conflict("Unique constraint failed.".to_string()),
            EngineError::Busy(_) => ApiError::Conflict("Resource is busy, retry the request.".to_string()),
            EngineError::Database(err) => {
                error!(error = %err, "database failure");
                ApiError::Internal("Internal database error.".to_string())
            }
            err => ApiError::InvalidInput(err.to_string()),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

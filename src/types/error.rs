//! Error types for odindex

use hyper::StatusCode;
use serde_json::Value;

/// Message returned whenever a failure has no upstream payload to forward.
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error.";

/// Main error type for odindex operations
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Graph (or another upstream) answered with a non-success status.
    /// The status and payload are forwarded to the client as-is.
    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: Value },

    /// The request never produced an upstream response (DNS, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Token store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IndexError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Http(_) | Self::Store(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Value placed under `"error"` in the JSON response body.
    ///
    /// Upstream payloads pass through untouched; client errors carry their
    /// message; everything else collapses to a generic message.
    pub fn error_body(&self) -> Value {
        match self {
            Self::Upstream { body, .. } => body.clone(),
            Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg) => Value::String(msg.clone()),
            _ => Value::String(INTERNAL_SERVER_ERROR.to_string()),
        }
    }

    /// True when an upstream service answered 404.
    pub fn is_upstream_not_found(&self) -> bool {
        matches!(self, Self::Upstream { status: 404, .. })
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, Value) {
        let status = self.status_code();
        let body = serde_json::json!({ "error": self.error_body() });
        (status, body)
    }
}

impl From<std::io::Error> for IndexError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for IndexError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// Result type alias for odindex operations
pub type Result<T> = std::result::Result<T, IndexError>;

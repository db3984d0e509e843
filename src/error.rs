//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ErrorResponse;
use thiserror::Error;

// == Proxy Error Enum ==
/// Unified error type for the caching proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The origin has no such resource
    #[error("Resource not found upstream: {0}")]
    NotFound(String),

    /// The origin could not be reached or read from
    #[error("Upstream transport failure: {0}")]
    Transport(String),

    /// A single payload exceeds the absolute cache size cap
    #[error("Payload for '{key}' is {size} bytes, above the cache limit of {max} bytes")]
    TooLarge { key: String, size: u64, max: u64 },

    /// The payload fits the cap but not the remaining budget
    #[error("Payload for '{key}' is {size} bytes, only {available} bytes available")]
    CapacityExceeded {
        key: String,
        size: u64,
        available: u64,
    },

    /// An operator command referenced a key absent from the cache
    #[error("Key not in cache: {0}")]
    UnknownKey(String),

    /// Malformed operator command or admin request
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

impl ProxyError {
    /// Returns true for the admission errors that only refuse caching.
    pub fn is_admission(&self) -> bool {
        matches!(
            self,
            ProxyError::TooLarge { .. } | ProxyError::CapacityExceeded { .. }
        )
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::NotFound(_) | ProxyError::UnknownKey(_) => StatusCode::NOT_FOUND,
            ProxyError::Transport(_) => StatusCode::BAD_GATEWAY,
            ProxyError::TooLarge { .. } | ProxyError::CapacityExceeded { .. } => {
                StatusCode::INSUFFICIENT_STORAGE
            }
            ProxyError::InvalidCommand(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;

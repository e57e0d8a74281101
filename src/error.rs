//! Error types for the cache client
//!
//! Provides unified error handling using thiserror.

use std::fmt;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Engine Error ==
/// Opaque failure reported by a storage engine.
///
/// Wraps the engine's `anyhow::Error` in an `Arc` so that a single failed
/// connect can be handed to every caller waiting on it. Display and source
/// forward to the engine's own error.
#[derive(Debug, Clone)]
pub struct EngineError(Arc<anyhow::Error>);

impl EngineError {
    /// Returns the error exactly as the engine reported it.
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        Self(Arc::new(err))
    }
}

// == Cache Error Enum ==
/// Unified error type for client and policy operations.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Key is absent or missing its id or segment
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Segment name is empty or contains reserved characters
    #[error("Invalid segment name: {0}")]
    InvalidSegment(String),

    /// Policy expiration rule is malformed
    #[error("Invalid policy rule: {0}")]
    InvalidRule(String),

    /// Client is not started, or was stopped
    #[error("Disconnected")]
    NotConnected,

    /// Failure forwarded verbatim from the storage engine
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

impl From<anyhow::Error> for CacheError {
    fn from(err: anyhow::Error) -> Self {
        CacheError::Engine(EngineError::from(err))
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

// == API Error ==
/// Error returned by the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No live item stored under the id
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Error raised by the cache client
    #[error(transparent)]
    Cache(#[from] CacheError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Cache(CacheError::InvalidKey(_))
            | ApiError::Cache(CacheError::InvalidSegment(_))
            | ApiError::Cache(CacheError::InvalidRule(_)) => StatusCode::BAD_REQUEST,
            ApiError::Cache(CacheError::NotConnected) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Cache(CacheError::Engine(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

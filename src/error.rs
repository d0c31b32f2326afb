//! Error types for the Fleetkeeper client core

use thiserror::Error;

use crate::storage::StorageError;

/// Main application error type
///
/// The variants follow the failure taxonomy of the sync layer: transport
/// failures and missing routes are retryable/fallback-eligible, application
/// errors are definitive, storage errors never surface past the cache layer.
#[derive(Error, Debug)]
pub enum AppError {
    /// No candidate endpoint produced any HTTP response at all.
    #[error("Cannot connect to server")]
    Unreachable,

    /// Every candidate answered 404 or 5xx; the backend instance does not
    /// serve this route yet.
    #[error("Route not found (HTTP {status}): {message}")]
    RouteMissing { status: u16, message: String },

    /// A definitive application-level rejection (validation, auth, ...).
    /// Never retried against further candidates, never demoted to a
    /// local-only write.
    #[error("Request rejected (HTTP {status}): {message}")]
    Application { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this failure class permits a local-only fallback write:
    /// the backend was unreachable or lacks the route, as opposed to
    /// having rejected the request.
    pub fn allows_local_fallback(&self) -> bool {
        matches!(self, AppError::Unreachable | AppError::RouteMissing { .. })
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

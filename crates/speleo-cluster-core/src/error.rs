//! Error types for speleo-cluster-core.

use thiserror::Error;

use crate::clustering::ClusterError;

/// Top-level error type for speleo-cluster-core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Clustering error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::ConfigError(err.to_string())
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by an effort provider while fetching location batches.
///
/// The engine never retries: a storage error aborts the running invocation
/// and reaches the caller unchanged (wrapped in `ClusterError::StorageError`).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The backing store cannot currently serve requests.
    #[error("Effort store unavailable: {0}")]
    Unavailable(String),

    /// The backing store failed while serving a request.
    #[error("Effort store backend failure: {0}")]
    Backend(String),
}

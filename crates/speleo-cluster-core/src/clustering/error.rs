//! Error types for clustering operations.

use thiserror::Error;

use crate::error::StorageError;
use crate::taxonomy::{LocationId, Rank};

/// Errors that can occur during seed selection and cluster assignment.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Invalid or missing configuration value, raised before any fetch.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of what's wrong with the parameter
        message: String,
    },

    /// An effort record violates the parallel-sequence invariant.
    #[error("Malformed effort for location {location_id} at rank {rank}: {message}")]
    MalformedEffort {
        /// Location whose record failed to decode
        location_id: LocationId,
        /// Rank holding the bad sequences
        rank: Rank,
        /// What was wrong
        message: String,
    },

    /// A requested seed location does not resolve in the effort store.
    #[error("Seed location {location_id} not found")]
    SeedNotFound {
        /// The unresolved seed
        location_id: LocationId,
    },

    /// Effort provider failed while fetching a batch.
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl ClusterError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a MalformedEffort error.
    pub fn malformed_effort(location_id: LocationId, rank: Rank, message: impl Into<String>) -> Self {
        Self::MalformedEffort {
            location_id,
            rank,
            message: message.into(),
        }
    }
}

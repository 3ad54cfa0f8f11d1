//! Error types for the placement operator system.
//!
//! The execution core (steps, operators, builders, influence) never fails:
//! every boundary condition resolves to a defined value. Errors only arise
//! at the edges: loading configuration, validating snapshots, registering
//! operators and replaying scenarios.

use std::path::PathBuf;
use thiserror::Error;

use crate::cluster::{PartitionId, StoreId};

/// The main error type for the placement operator system.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Partition snapshot errors.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Operator registry errors.
    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),

    /// Scenario replay errors.
    #[error("Replay error: {0}")]
    Replay(#[from] ReplayError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// An environment override could not be interpreted.
    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnvVar {
        /// Name of the variable.
        name: String,
        /// The rejected value.
        value: String,
    },

    /// Unknown operator kind flag name.
    #[error("Unknown operator kind: {name}")]
    UnknownKind {
        /// The unrecognized flag name.
        name: String,
    },
}

/// Errors found in a partition snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The leader is not one of the partition's peers.
    #[error("Partition {partition_id}: leader peer {peer_id} is not a member")]
    LeaderNotMember {
        /// Partition being validated.
        partition_id: PartitionId,
        /// The orphan leader peer.
        peer_id: u64,
    },

    /// A pending peer is not one of the partition's peers.
    #[error("Partition {partition_id}: pending peer {peer_id} is not a member")]
    PendingNotMember {
        /// Partition being validated.
        partition_id: PartitionId,
        /// The orphan pending peer.
        peer_id: u64,
    },

    /// Two peers share a store.
    #[error("Partition {partition_id}: store {store_id} hosts more than one peer")]
    DuplicateStore {
        /// Partition being validated.
        partition_id: PartitionId,
        /// The duplicated store.
        store_id: StoreId,
    },

    /// Two peers share an id.
    #[error("Partition {partition_id}: peer id {peer_id} is used twice")]
    DuplicatePeer {
        /// Partition being validated.
        partition_id: PartitionId,
        /// The duplicated peer id.
        peer_id: u64,
    },

    /// Approximate size is negative.
    #[error("Partition {partition_id}: negative approximate size {size}")]
    NegativeSize {
        /// Partition being validated.
        partition_id: PartitionId,
        /// The rejected size.
        size: i64,
    },

    /// A snapshot describes a different partition than expected.
    #[error("Snapshot for partition {found} does not match partition {expected}")]
    PartitionMismatch {
        /// Expected partition.
        expected: PartitionId,
        /// Partition found in the snapshot.
        found: PartitionId,
    },

    /// The requested store does not host a peer of the partition.
    #[error("Partition {partition_id}: store {store_id} hosts no peer")]
    NoPeerOnStore {
        /// Partition being validated.
        partition_id: PartitionId,
        /// The store without a peer.
        store_id: StoreId,
    },

    /// The requested store already hosts a peer of the partition.
    #[error("Partition {partition_id}: store {store_id} already hosts a peer")]
    StoreOccupied {
        /// Partition being validated.
        partition_id: PartitionId,
        /// The occupied store.
        store_id: StoreId,
    },
}

/// Operator registry errors.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The partition already has an operator in flight.
    #[error("Partition {partition_id} already has an operator in flight: {existing}")]
    OperatorExists {
        /// The contended partition.
        partition_id: PartitionId,
        /// Description of the operator already registered.
        existing: String,
    },

    /// The operator has no steps.
    #[error("Operator for partition {partition_id} has no steps")]
    EmptyOperator {
        /// Partition of the rejected operator.
        partition_id: PartitionId,
    },

    /// No operator is registered for the partition.
    #[error("No operator registered for partition {partition_id}")]
    NotFound {
        /// The partition looked up.
        partition_id: PartitionId,
    },
}

/// Scenario replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The snapshot source failed.
    #[error("Snapshot source failed: {message}")]
    SourceFailed {
        /// Description of the failure.
        message: String,
    },

    /// The operator request produced an operator that was rejected.
    #[error("Replay aborted: {reason}")]
    Aborted {
        /// Reason for abort.
        reason: String,
    },
}

/// Result type alias for placement operations.
pub type Result<T> = std::result::Result<T, PlacementError>;

impl PlacementError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if the caller may retry the failed operation later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Controller(ControllerError::OperatorExists { .. })
                | Self::Replay(ReplayError::SourceFailed { .. })
        )
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a parse error without a source location.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location: None,
        }
    }
}

impl ReplayError {
    /// Creates a source failure with the given message.
    #[must_use]
    pub fn source_failed(message: impl Into<String>) -> Self {
        Self::SourceFailed {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_nests_domain() {
        let err = PlacementError::from(ControllerError::NotFound { partition_id: 7 });
        assert_eq!(
            err.to_string(),
            "Controller error: No operator registered for partition 7"
        );
    }

    #[test]
    fn test_retryable() {
        let busy = PlacementError::from(ControllerError::OperatorExists {
            partition_id: 1,
            existing: String::from("balance"),
        });
        assert!(busy.is_retryable());
        assert!(!PlacementError::internal("boom").is_retryable());
    }
}

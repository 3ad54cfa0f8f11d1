//! Validation of controller settings, partition snapshots and scenarios.
//!
//! Snapshots come from outside the crate and the operator core trusts them,
//! so anything loaded from a file goes through here first.

use crate::cluster::PartitionSnapshot;
use crate::error::{ConfigError, PlacementError, Result, SnapshotError};
use std::collections::HashSet;
use tracing::debug;

use super::spec::{ControllerConfig, OperatorAction, Scenario};

/// Timeouts above this many seconds draw a warning.
const LONG_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Validator for configuration and scenario files.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates controller settings.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(&self, config: &ControllerConfig) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        if config.operator_timeout_secs == 0 {
            result.errors.push(ValidationError {
                field: String::from("operator_timeout_secs"),
                message: String::from("Operator timeout must be at least 1 second"),
            });
        } else if config.operator_timeout_secs > LONG_TIMEOUT_SECS {
            result.warnings.push(format!(
                "operator_timeout_secs: {}s keeps stale operators for over a day",
                config.operator_timeout_secs
            ));
        }

        if config.poll_interval_ms == 0 {
            result.errors.push(ValidationError {
                field: String::from("poll_interval_ms"),
                message: String::from("Poll interval must be at least 1 millisecond"),
            });
        }

        if config.max_history == 0 {
            result
                .warnings
                .push(String::from("max_history: 0 disables operator history"));
        }

        result.into_outcome()
    }

    /// Checks that a snapshot is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency.
    pub fn validate_snapshot(&self, snapshot: &PartitionSnapshot) -> Result<()> {
        let partition_id = snapshot.id;

        if snapshot.approximate_size < 0 {
            return Err(SnapshotError::NegativeSize {
                partition_id,
                size: snapshot.approximate_size,
            }
            .into());
        }

        let mut stores = HashSet::new();
        let mut peer_ids = HashSet::new();
        for peer in &snapshot.peers {
            if !stores.insert(peer.store_id) {
                return Err(SnapshotError::DuplicateStore {
                    partition_id,
                    store_id: peer.store_id,
                }
                .into());
            }
            if !peer_ids.insert(peer.id) {
                return Err(SnapshotError::DuplicatePeer {
                    partition_id,
                    peer_id: peer.id,
                }
                .into());
            }
        }

        if let Some(leader) = snapshot.leader.filter(|l| !snapshot.peers.contains(l)) {
            return Err(SnapshotError::LeaderNotMember {
                partition_id,
                peer_id: leader.id,
            }
            .into());
        }

        if let Some(orphan) = snapshot
            .pending_peers
            .iter()
            .find(|p| !snapshot.peers.contains(p))
        {
            return Err(SnapshotError::PendingNotMember {
                partition_id,
                peer_id: orphan.id,
            }
            .into());
        }

        Ok(())
    }

    /// Validates a scenario: every snapshot, and the operator request against
    /// the initial snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first snapshot or request error found.
    pub fn validate_scenario(&self, scenario: &Scenario) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();
        let partition = &scenario.partition;

        self.validate_snapshot(partition)?;
        for (i, snapshot) in scenario.timeline.iter().enumerate() {
            if snapshot.id != partition.id {
                return Err(SnapshotError::PartitionMismatch {
                    expected: partition.id,
                    found: snapshot.id,
                }
                .into());
            }
            self.validate_snapshot(snapshot)?;
            debug!("timeline[{i}] is consistent");
        }

        let source = scenario.operator.action.source_store();
        if partition.store_peer(source).is_none() {
            return Err(SnapshotError::NoPeerOnStore {
                partition_id: partition.id,
                store_id: source,
            }
            .into());
        }

        match scenario.operator.action {
            OperatorAction::MovePeer {
                old_store,
                new_store,
                new_peer_id,
            } => {
                if old_store == new_store {
                    result.errors.push(ValidationError {
                        field: String::from("operator.new_store"),
                        message: format!("Cannot move a replica onto its own store {new_store}"),
                    });
                } else if partition.store_peer(new_store).is_some() {
                    return Err(SnapshotError::StoreOccupied {
                        partition_id: partition.id,
                        store_id: new_store,
                    }
                    .into());
                }
                if partition.peers.iter().any(|p| p.id == new_peer_id) {
                    result.errors.push(ValidationError {
                        field: String::from("operator.new_peer_id"),
                        message: format!("Peer id {new_peer_id} is already in use"),
                    });
                }
            }
            OperatorAction::RemovePeer { store } => {
                if partition.peers.len() == 1 && partition.leader_store_id() == Some(store) {
                    result.warnings.push(format!(
                        "operator.store: removing the only replica on store {store} leaves the partition leaderless"
                    ));
                }
            }
        }

        if scenario.timeline.is_empty() {
            result
                .warnings
                .push(String::from("timeline: no snapshots, replay will stop immediately"));
        }

        result.into_outcome()
    }
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Turns the first collected error into a [`ConfigError`].
    fn into_outcome(self) -> Result<Self> {
        match self.errors.first() {
            None => {
                debug!("Validation passed with {} warnings", self.warnings.len());
                Ok(self)
            }
            Some(first) => Err(PlacementError::Config(ConfigError::validation(
                first.message.clone(),
                first.field.clone(),
            ))),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

//! Configuration specification types.
//!
//! This module defines the structs that map to `placectl.yaml` (controller
//! settings) and to scenario files (an operator request plus the sequence of
//! partition snapshots a polling loop would observe).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cluster::{OperatorKind, PartitionSnapshot, PeerId, PriorityLevel, StoreId};

/// Controller settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Age in seconds after which an unfinished operator is stale.
    #[serde(default = "default_operator_timeout_secs")]
    pub operator_timeout_secs: u64,
    /// Number of retired operators kept in history.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// Delay between two polls of a scenario replay, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// A replayable operator scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scenario {
    /// Partition state the operator is built from.
    pub partition: PartitionSnapshot,
    /// The operator to build.
    pub operator: OperatorRequest,
    /// Snapshots observed by the polling loop, in order.
    #[serde(default)]
    pub timeline: Vec<PartitionSnapshot>,
}

/// Request for one operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperatorRequest {
    /// Description attached to the operator.
    #[serde(default = "default_description")]
    pub description: String,
    /// Extra kind flags; the builder adds `region`/`leader` itself.
    #[serde(default)]
    pub kind: OperatorKind,
    /// Priority level.
    #[serde(default)]
    pub priority: PriorityLevel,
    /// What the operator does.
    #[serde(flatten)]
    pub action: OperatorAction,
}

/// Operator shapes a scenario can request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OperatorAction {
    /// Remove the replica on a store.
    RemovePeer {
        /// Store losing its replica.
        store: StoreId,
    },
    /// Replace the replica on one store with a new one on another.
    MovePeer {
        /// Store losing its replica.
        old_store: StoreId,
        /// Store receiving the new replica.
        new_store: StoreId,
        /// Identifier of the new replica.
        new_peer_id: PeerId,
    },
}

const fn default_operator_timeout_secs() -> u64 {
    300
}

const fn default_max_history() -> usize {
    100
}

const fn default_poll_interval_ms() -> u64 {
    100
}

fn default_description() -> String {
    String::from("scenario")
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            operator_timeout_secs: default_operator_timeout_secs(),
            max_history: default_max_history(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl ControllerConfig {
    /// Operator staleness threshold.
    #[must_use]
    pub const fn operator_timeout(&self) -> Duration {
        Duration::from_secs(self.operator_timeout_secs)
    }

    /// Replay poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl OperatorAction {
    /// Store that must host a replica before the operator is built.
    #[must_use]
    pub const fn source_store(&self) -> StoreId {
        match self {
            Self::RemovePeer { store } => *store,
            Self::MovePeer { old_store, .. } => *old_store,
        }
    }
}

impl std::fmt::Display for OperatorAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemovePeer { store } => write!(f, "remove-peer store {store}"),
            Self::MovePeer {
                old_store,
                new_store,
                new_peer_id,
            } => write!(f, "move-peer store {old_store} -> store {new_store} (peer {new_peer_id})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_defaults() {
        let config: ControllerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.operator_timeout(), Duration::from_secs(300));
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_parse_move_request() {
        let yaml = r"
description: rebalance
type: move-peer
old_store: 1
new_store: 4
new_peer_id: 99
kind: [balance]
priority: high
";
        let request: OperatorRequest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            request.action,
            OperatorAction::MovePeer {
                old_store: 1,
                new_store: 4,
                new_peer_id: 99
            }
        );
        assert_eq!(request.kind, OperatorKind::BALANCE);
        assert_eq!(request.priority, PriorityLevel::High);
        assert_eq!(request.action.source_store(), 1);
    }

    #[test]
    fn test_parse_remove_request_defaults() {
        let request: OperatorRequest = serde_yaml::from_str("type: remove-peer\nstore: 3\n").unwrap();
        assert_eq!(request.action, OperatorAction::RemovePeer { store: 3 });
        assert_eq!(request.description, "scenario");
        assert!(request.kind.is_empty());
        assert_eq!(request.priority, PriorityLevel::Normal);
    }
}

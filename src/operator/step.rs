//! Indivisible cluster mutations.

use serde::Serialize;

use crate::cluster::{PartitionSnapshot, PeerId, StoreId};
use crate::influence::OpInfluence;

/// One step of an operator.
///
/// Completion checks are pure functions of the supplied snapshot and may be
/// called any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperatorStep {
    /// Moves the partition's leadership from one store to another.
    TransferLeader {
        /// Store currently holding the leader.
        from_store: StoreId,
        /// Store that should hold the leader.
        to_store: StoreId,
    },
    /// Creates a new replica on a store.
    AddPeer {
        /// Store receiving the replica.
        to_store: StoreId,
        /// Identifier of the new replica.
        peer_id: PeerId,
    },
    /// Removes the replica hosted on a store.
    RemovePeer {
        /// Store losing its replica.
        from_store: StoreId,
    },
}

impl OperatorStep {
    /// Returns true if `partition` already reflects this step.
    #[must_use]
    pub fn is_finished(&self, partition: &PartitionSnapshot) -> bool {
        match *self {
            Self::TransferLeader { to_store, .. } => partition.leader_store_id() == Some(to_store),
            // A replica that is still catching up does not count.
            Self::AddPeer { to_store, peer_id } => partition
                .store_peer(to_store)
                .is_some_and(|p| p.id == peer_id && partition.pending_peer(p.id).is_none()),
            Self::RemovePeer { from_store } => partition.store_peer(from_store).is_none(),
        }
    }

    /// Writes the load change this step will cause into `influence`.
    ///
    /// Callers only apply unfinished steps.
    pub fn apply_influence(&self, influence: &mut OpInfluence, partition: &PartitionSnapshot) {
        let size = partition.approximate_size;
        match *self {
            Self::TransferLeader { from_store, to_store } => {
                let from = influence.store_influence_mut(from_store);
                from.leader_size -= size;
                from.leader_count -= 1;
                let to = influence.store_influence_mut(to_store);
                to.leader_size += size;
                to.leader_count += 1;
            }
            Self::AddPeer { to_store, .. } => {
                let to = influence.store_influence_mut(to_store);
                to.region_size += size;
                to.region_count += 1;
            }
            Self::RemovePeer { from_store } => {
                let from = influence.store_influence_mut(from_store);
                from.region_size -= size;
                from.region_count -= 1;
            }
        }
    }

    /// Returns the stores this step touches.
    #[must_use]
    pub fn stores(&self) -> Vec<StoreId> {
        match *self {
            Self::TransferLeader { from_store, to_store } => vec![from_store, to_store],
            Self::AddPeer { to_store, .. } => vec![to_store],
            Self::RemovePeer { from_store } => vec![from_store],
        }
    }
}

impl std::fmt::Display for OperatorStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TransferLeader { from_store, to_store } => {
                write!(f, "transfer leader from store {from_store} to store {to_store}")
            }
            Self::AddPeer { to_store, peer_id } => {
                write!(f, "add peer {peer_id} on store {to_store}")
            }
            Self::RemovePeer { from_store } => write!(f, "remove peer on store {from_store}"),
        }
    }
}

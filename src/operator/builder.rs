//! Builders for common multi-step operators.
//!
//! Both builders guarantee that the store holding the current leader is never
//! the target of a bare `RemovePeer`: leadership is moved away first. The one
//! exception is a single-replica partition, where no follower exists to take
//! over. The removal then proceeds alone and the partition is leaderless until
//! a replica is elected elsewhere; this is accepted policy and is logged.

use tracing::{debug, warn};

use crate::cluster::{OperatorKind, PartitionSnapshot, PeerId, StoreId};

use super::op::Operator;
use super::step::OperatorStep;

/// Builds an operator that removes the replica on `store_id`.
///
/// If the leader lives on `store_id` and a follower exists, leadership is
/// transferred to the follower first and the kind gains `LEADER`.
#[must_use]
pub fn create_remove_peer_operator(
    desc: &str,
    kind: OperatorKind,
    partition: &PartitionSnapshot,
    store_id: StoreId,
) -> Operator {
    if partition.leader_store_id() == Some(store_id) {
        if let Some(follower) = partition.follower() {
            debug!(
                partition = partition.id,
                from = store_id,
                to = follower.store_id,
                "leader on removed store, transferring first"
            );
            let steps = vec![
                OperatorStep::TransferLeader {
                    from_store: store_id,
                    to_store: follower.store_id,
                },
                OperatorStep::RemovePeer { from_store: store_id },
            ];
            return Operator::new(
                desc,
                partition.id,
                kind | OperatorKind::REGION | OperatorKind::LEADER,
                steps,
            );
        }
        warn!(
            partition = partition.id,
            store = store_id,
            "removing the only replica; partition will be leaderless"
        );
    }

    Operator::new(
        desc,
        partition.id,
        kind | OperatorKind::REGION,
        vec![OperatorStep::RemovePeer { from_store: store_id }],
    )
}

/// Builds an operator that replaces the replica on `old_store` with a new
/// replica `peer_id` on `new_store`.
///
/// The new replica is always added before the old one is removed. When the
/// leader lives on `old_store`, it moves to an existing follower if there is
/// one (it is already caught up), otherwise to `new_store`.
#[must_use]
pub fn create_move_peer_operator(
    desc: &str,
    partition: &PartitionSnapshot,
    kind: OperatorKind,
    old_store: StoreId,
    new_store: StoreId,
    peer_id: PeerId,
) -> Operator {
    let add = OperatorStep::AddPeer {
        to_store: new_store,
        peer_id,
    };
    let remove = OperatorStep::RemovePeer { from_store: old_store };

    if partition.leader_store_id() == Some(old_store) {
        let new_leader = partition
            .follower_excluding(&[new_store])
            .map_or(new_store, |f| f.store_id);
        debug!(
            partition = partition.id,
            from = old_store,
            to = new_leader,
            "leader on moved store, transferring before removal"
        );
        let steps = vec![
            add,
            OperatorStep::TransferLeader {
                from_store: old_store,
                to_store: new_leader,
            },
            remove,
        ];
        return Operator::new(
            desc,
            partition.id,
            kind | OperatorKind::REGION | OperatorKind::LEADER,
            steps,
        );
    }

    Operator::new(desc, partition.id, kind | OperatorKind::REGION, vec![add, remove])
}

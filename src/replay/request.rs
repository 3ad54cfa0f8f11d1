//! Turning a scenario's operator request into an operator.

use crate::cluster::PartitionSnapshot;
use crate::config::{ControllerConfig, OperatorAction, OperatorRequest};
use crate::operator::{Operator, create_move_peer_operator, create_remove_peer_operator};

/// Builds the operator described by `request` against `partition`.
///
/// The operator gets the configured timeout and the requested priority.
#[must_use]
pub fn build_operator(
    request: &OperatorRequest,
    partition: &PartitionSnapshot,
    config: &ControllerConfig,
) -> Operator {
    let op = match request.action {
        OperatorAction::RemovePeer { store } => {
            create_remove_peer_operator(&request.description, request.kind, partition, store)
        }
        OperatorAction::MovePeer {
            old_store,
            new_store,
            new_peer_id,
        } => create_move_peer_operator(
            &request.description,
            partition,
            request.kind,
            old_store,
            new_store,
            new_peer_id,
        ),
    };

    let mut op = op.with_timeout(config.operator_timeout());
    op.set_priority(request.priority);
    op
}

//! Serializable operator status for observability surfaces.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::cluster::{OperatorKind, PartitionId, PriorityLevel};

use super::op::Operator;
use super::step::OperatorStep;

/// Point-in-time view of an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorStatus {
    /// Operator identifier.
    pub id: Uuid,
    /// Scheduler-provided description.
    pub desc: String,
    /// Target partition.
    pub partition_id: PartitionId,
    /// Kind flags.
    pub kind: OperatorKind,
    /// Priority level.
    pub priority: PriorityLevel,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Milliseconds since creation.
    pub elapsed_ms: u64,
    /// Index of the first unfinished step.
    pub current_step: usize,
    /// All steps in execution order.
    pub steps: Vec<OperatorStep>,
    /// Whether every step is done.
    pub finished: bool,
    /// Whether the operator is stale.
    pub timed_out: bool,
}

impl From<&Operator> for OperatorStatus {
    fn from(op: &Operator) -> Self {
        Self {
            id: op.id(),
            desc: op.desc().to_string(),
            partition_id: op.partition_id(),
            kind: op.kind(),
            priority: op.priority(),
            created_at: op.created_at(),
            elapsed_ms: u64::try_from(op.elapsed().as_millis()).unwrap_or(u64::MAX),
            current_step: op.current_step(),
            steps: op.steps().to_vec(),
            finished: op.is_finished(),
            timed_out: op.is_timed_out(),
        }
    }
}

impl OperatorStatus {
    /// Returns the step the operator is waiting on, if any.
    #[must_use]
    pub fn next_step(&self) -> Option<&OperatorStep> {
        self.steps.get(self.current_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_json_is_structured() {
        let op = Operator::new(
            "balance-region",
            42,
            OperatorKind::BALANCE | OperatorKind::REGION,
            vec![
                OperatorStep::AddPeer { to_store: 4, peer_id: 99 },
                OperatorStep::RemovePeer { from_store: 1 },
            ],
        );

        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["desc"], "balance-region");
        assert_eq!(json["partition_id"], 42);
        assert_eq!(json["kind"], serde_json::json!(["region", "balance"]));
        assert_eq!(json["priority"], "normal");
        assert_eq!(json["current_step"], 0);
        assert_eq!(json["finished"], false);
        assert_eq!(json["steps"][0]["type"], "add_peer");
        assert_eq!(json["steps"][0]["peer_id"], 99);
        assert_eq!(json["steps"][1]["type"], "remove_peer");
    }

    #[test]
    fn test_next_step() {
        let op = Operator::new(
            "remove",
            1,
            OperatorKind::REGION,
            vec![OperatorStep::RemovePeer { from_store: 1 }],
        );
        let status = op.status();
        assert_eq!(status.next_step(), Some(&OperatorStep::RemovePeer { from_store: 1 }));
        assert_eq!(status.id, op.id());
    }
}

//! Operator registry for the polling loop.
//!
//! The controller owns the operators currently in flight, at most one per
//! partition. Each time the polling loop observes a fresh snapshot it calls
//! [`OperatorController::dispatch`], which advances the matching operator and
//! reports what the loop should do next. Finished, timed-out and cancelled
//! operators are moved into a bounded history.
//!
//! The controller never talks to the cluster and never retries: executing
//! the returned step and regenerating stale operators is the caller's job.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cluster::{PartitionId, PartitionSnapshot};
use crate::config::ControllerConfig;
use crate::error::{ControllerError, Result};
use crate::influence::OpInfluence;
use crate::operator::{Operator, OperatorStatus, OperatorStep};

/// Registry of in-flight operators.
#[derive(Debug)]
pub struct OperatorController {
    /// Operators keyed by partition.
    operators: BTreeMap<PartitionId, Arc<Operator>>,
    /// Recently retired operators, oldest first.
    history: VecDeque<OperatorHistoryEntry>,
    /// Maximum history length.
    max_history: usize,
}

/// What the polling loop should do for a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No operator targets the partition.
    NoOperator,
    /// Execute this step against the cluster.
    Pending(OperatorStep),
    /// The operator completed and was retired.
    Finished,
    /// The operator went stale and was retired; regenerate if still needed.
    TimedOut,
}

/// How an operator left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorOutcome {
    /// All steps completed.
    Finished,
    /// Abandoned after exceeding its timeout.
    TimedOut,
    /// Removed by the caller.
    Cancelled,
}

/// A retired operator.
#[derive(Debug, Clone, Serialize)]
pub struct OperatorHistoryEntry {
    /// Operator state when it was retired.
    pub status: OperatorStatus,
    /// Why it was retired.
    pub outcome: OperatorOutcome,
    /// When it was retired.
    pub recorded_at: DateTime<Utc>,
}

impl OperatorController {
    /// Creates an empty controller.
    #[must_use]
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            operators: BTreeMap::new(),
            history: VecDeque::new(),
            max_history: config.max_history,
        }
    }

    /// Registers an operator.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator has no steps or its partition already
    /// has an operator in flight.
    pub fn add_operator(&mut self, op: Operator) -> Result<Arc<Operator>> {
        if op.is_empty() {
            return Err(ControllerError::EmptyOperator {
                partition_id: op.partition_id(),
            }
            .into());
        }

        if let Some(existing) = self.operators.get(&op.partition_id()) {
            warn!(
                partition = op.partition_id(),
                "rejecting operator '{}': '{}' already in flight",
                op.desc(),
                existing.desc()
            );
            return Err(ControllerError::OperatorExists {
                partition_id: op.partition_id(),
                existing: existing.desc().to_string(),
            }
            .into());
        }

        info!(
            partition = op.partition_id(),
            kind = %op.kind(),
            priority = %op.priority(),
            "added operator: {op}"
        );
        let op = Arc::new(op);
        self.operators.insert(op.partition_id(), Arc::clone(&op));
        Ok(op)
    }

    /// Returns the operator in flight for `partition_id`.
    #[must_use]
    pub fn operator(&self, partition_id: PartitionId) -> Option<Arc<Operator>> {
        self.operators.get(&partition_id).cloned()
    }

    /// Iterates over operators in flight, ordered by partition.
    pub fn operators(&self) -> impl Iterator<Item = &Arc<Operator>> {
        self.operators.values()
    }

    /// Number of operators in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Returns true if no operator is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Advances the operator for `partition` and reports the next action.
    pub fn dispatch(&mut self, partition: &PartitionSnapshot) -> DispatchOutcome {
        let Some(op) = self.operators.get(&partition.id).cloned() else {
            return DispatchOutcome::NoOperator;
        };

        match op.check(partition) {
            None => {
                info!(partition = partition.id, "operator finished: {op}");
                self.retire(partition.id, OperatorOutcome::Finished);
                DispatchOutcome::Finished
            }
            Some(_) if op.is_timed_out() => {
                warn!(
                    partition = partition.id,
                    elapsed_ms = u64::try_from(op.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "operator timed out: {op}"
                );
                self.retire(partition.id, OperatorOutcome::TimedOut);
                DispatchOutcome::TimedOut
            }
            Some(step) => {
                debug!(partition = partition.id, "next step: {step}");
                DispatchOutcome::Pending(*step)
            }
        }
    }

    /// Removes the operator for `partition_id` without finishing it.
    ///
    /// # Errors
    ///
    /// Returns an error if no operator is registered for the partition.
    pub fn remove_operator(&mut self, partition_id: PartitionId) -> Result<Arc<Operator>> {
        let op = self
            .retire(partition_id, OperatorOutcome::Cancelled)
            .ok_or(ControllerError::NotFound { partition_id })?;
        info!(partition = partition_id, "operator cancelled: {op}");
        Ok(op)
    }

    /// Sums the residual influence of every live operator.
    pub fn influence<'s, F>(&self, lookup: F) -> OpInfluence
    where
        F: FnMut(PartitionId) -> Option<&'s PartitionSnapshot>,
    {
        OpInfluence::from_operators(self.operators.values().map(Arc::as_ref), lookup)
    }

    /// Recently retired operators, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &OperatorHistoryEntry> {
        self.history.iter()
    }

    /// Moves an operator from the registry into the history.
    fn retire(&mut self, partition_id: PartitionId, outcome: OperatorOutcome) -> Option<Arc<Operator>> {
        let op = self.operators.remove(&partition_id)?;
        if self.max_history > 0 {
            while self.history.len() >= self.max_history {
                self.history.pop_front();
            }
            self.history.push_back(OperatorHistoryEntry {
                status: op.status(),
                outcome,
                recorded_at: Utc::now(),
            });
        }
        Some(op)
    }
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoOperator => write!(f, "no operator"),
            Self::Pending(step) => write!(f, "pending: {step}"),
            Self::Finished => write!(f, "finished"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

impl std::fmt::Display for OperatorOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Finished => "finished",
            Self::TimedOut => "timed out",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{OperatorKind, Peer};
    use crate::error::PlacementError;
    use crate::operator::create_remove_peer_operator;
    use std::time::Duration;

    fn partition(id: PartitionId) -> PartitionSnapshot {
        PartitionSnapshot::new(id, 100)
            .with_leader(Peer::new(id * 10 + 1, 1))
            .with_peer(Peer::new(id * 10 + 2, 2))
    }

    fn controller(max_history: usize) -> OperatorController {
        OperatorController::new(&ControllerConfig {
            max_history,
            ..ControllerConfig::default()
        })
    }

    #[test]
    fn test_one_operator_per_partition() {
        let mut ctl = controller(10);
        let p = partition(1);
        ctl.add_operator(create_remove_peer_operator("a", OperatorKind::NONE, &p, 2))
            .unwrap();

        let err = ctl
            .add_operator(create_remove_peer_operator("b", OperatorKind::NONE, &p, 1))
            .unwrap_err();
        assert!(matches!(
            err,
            PlacementError::Controller(ControllerError::OperatorExists { partition_id: 1, .. })
        ));
        assert_eq!(ctl.len(), 1);
    }

    #[test]
    fn test_rejects_empty_operator() {
        let mut ctl = controller(10);
        let err = ctl
            .add_operator(Operator::new("empty", 3, OperatorKind::NONE, vec![]))
            .unwrap_err();
        assert!(matches!(
            err,
            PlacementError::Controller(ControllerError::EmptyOperator { partition_id: 3 })
        ));
    }

    #[test]
    fn test_dispatch_until_finished() {
        let mut ctl = controller(10);
        let mut p = partition(1);
        ctl.add_operator(create_remove_peer_operator("rm", OperatorKind::NONE, &p, 1))
            .unwrap();

        assert_eq!(
            ctl.dispatch(&p),
            DispatchOutcome::Pending(OperatorStep::TransferLeader { from_store: 1, to_store: 2 })
        );

        p.leader = Some(Peer::new(12, 2));
        p.peers.retain(|peer| peer.store_id != 1);
        assert_eq!(ctl.dispatch(&p), DispatchOutcome::Finished);
        assert!(ctl.is_empty());
        assert_eq!(ctl.dispatch(&p), DispatchOutcome::NoOperator);

        let history: Vec<_> = ctl.history().collect();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].outcome, OperatorOutcome::Finished);
        assert!(history[0].status.finished);
    }

    #[test]
    fn test_dispatch_retires_timed_out() {
        let mut ctl = controller(10);
        let p = partition(1);
        let op = create_remove_peer_operator("rm", OperatorKind::NONE, &p, 2)
            .with_timeout(Duration::from_millis(1));
        ctl.add_operator(op).unwrap();
        std::thread::sleep(Duration::from_millis(10));

        assert_eq!(ctl.dispatch(&p), DispatchOutcome::TimedOut);
        assert!(ctl.operator(1).is_none());
        assert_eq!(ctl.history().next().map(|e| e.outcome), Some(OperatorOutcome::TimedOut));
    }

    #[test]
    fn test_stale_operator_finishes_on_applied_snapshot() {
        let mut ctl = controller(10);
        let mut p = partition(1);
        let op = create_remove_peer_operator("rm", OperatorKind::NONE, &p, 2)
            .with_timeout(Duration::from_millis(1));
        ctl.add_operator(op).unwrap();
        std::thread::sleep(Duration::from_millis(10));

        p.peers.retain(|peer| peer.store_id != 2);
        assert_eq!(ctl.dispatch(&p), DispatchOutcome::Finished);

        let entry = ctl.history().next().unwrap();
        assert_eq!(entry.outcome, OperatorOutcome::Finished);
        assert!(entry.status.finished);
        assert!(!entry.status.timed_out);
    }

    #[test]
    fn test_remove_operator() {
        let mut ctl = controller(10);
        let p = partition(1);
        ctl.add_operator(create_remove_peer_operator("rm", OperatorKind::NONE, &p, 2))
            .unwrap();

        assert!(ctl.remove_operator(1).is_ok());
        assert!(ctl.remove_operator(1).is_err());
        assert_eq!(ctl.history().next().map(|e| e.outcome), Some(OperatorOutcome::Cancelled));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut ctl = controller(2);
        for id in 1..=3 {
            let p = partition(id);
            ctl.add_operator(create_remove_peer_operator("rm", OperatorKind::NONE, &p, 2))
                .unwrap();
            ctl.remove_operator(id).unwrap();
        }
        let ids: Vec<_> = ctl.history().map(|e| e.status.partition_id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_influence_across_operators() {
        let mut ctl = controller(10);
        let p1 = partition(1);
        let p2 = partition(2);
        ctl.add_operator(create_remove_peer_operator("rm1", OperatorKind::NONE, &p1, 2))
            .unwrap();
        ctl.add_operator(create_remove_peer_operator("rm2", OperatorKind::NONE, &p2, 2))
            .unwrap();

        let snapshots = BTreeMap::from([(1, p1), (2, p2)]);
        let influence = ctl.influence(|id| snapshots.get(&id));

        let store = influence.get(2).copied().unwrap_or_default();
        assert_eq!((store.region_size, store.region_count), (-200, -2));
    }
}

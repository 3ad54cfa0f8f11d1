//! Operators: ordered step lists with concurrent progress tracking.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

use crate::cluster::{OperatorKind, PartitionId, PartitionSnapshot, PriorityLevel};
use crate::influence::OpInfluence;

use super::status::OperatorStatus;
use super::step::OperatorStep;

/// Age after which an unfinished operator is considered stale.
pub const MAX_OPERATOR_WAIT_TIME: Duration = Duration::from_secs(5 * 60);

/// A scheduling decision expressed as an ordered list of steps.
///
/// Everything except the progress cursor and the priority is fixed at
/// construction. The cursor only moves forward, so an operator can be shared
/// (e.g. behind an `Arc`) and checked from several threads at once.
#[derive(Debug)]
pub struct Operator {
    id: Uuid,
    desc: String,
    partition_id: PartitionId,
    kind: OperatorKind,
    steps: Vec<OperatorStep>,
    current_step: AtomicUsize,
    created_at: DateTime<Utc>,
    started: Instant,
    timeout: Duration,
    priority: PriorityLevel,
}

impl Operator {
    /// Creates a new operator at step 0 with normal priority.
    #[must_use]
    pub fn new(
        desc: impl Into<String>,
        partition_id: PartitionId,
        kind: OperatorKind,
        steps: Vec<OperatorStep>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            desc: desc.into(),
            partition_id,
            kind,
            steps,
            current_step: AtomicUsize::new(0),
            created_at: Utc::now(),
            started: Instant::now(),
            timeout: MAX_OPERATOR_WAIT_TIME,
            priority: PriorityLevel::Normal,
        }
    }

    /// Overrides the staleness threshold.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Unique identifier of this operator instance.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Short description given by the scheduler.
    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }

    /// Partition the operator targets.
    #[must_use]
    pub const fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    /// Kind flags.
    #[must_use]
    pub const fn kind(&self) -> OperatorKind {
        self.kind
    }

    /// Priority level.
    #[must_use]
    pub const fn priority(&self) -> PriorityLevel {
        self.priority
    }

    /// Sets the priority level.
    pub const fn set_priority(&mut self, priority: PriorityLevel) {
        self.priority = priority;
    }

    /// Wall-clock creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Staleness threshold.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time since construction.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the operator has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the `i`-th step, or `None` when out of range.
    #[must_use]
    pub fn step(&self, i: usize) -> Option<&OperatorStep> {
        self.steps.get(i)
    }

    /// All steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[OperatorStep] {
        &self.steps
    }

    /// Index of the first step not yet observed as finished.
    #[must_use]
    pub fn current_step(&self) -> usize {
        self.current_step.load(Ordering::Acquire)
    }

    /// Advances past steps `partition` already satisfies and returns the next
    /// step to execute, or `None` once every step is done.
    ///
    /// Safe to call concurrently with different snapshots: progress is only
    /// ever raised, so a stale snapshot can never move the cursor back.
    pub fn check(&self, partition: &PartitionSnapshot) -> Option<&OperatorStep> {
        let start = self.current_step();
        for (idx, step) in self.steps.iter().enumerate().skip(start) {
            if !step.is_finished(partition) {
                return Some(step);
            }
            let previous = self.current_step.fetch_max(idx + 1, Ordering::AcqRel);
            if previous <= idx {
                debug!(
                    operator = %self.id,
                    partition = self.partition_id,
                    step = idx,
                    "step finished: {step}"
                );
            }
        }
        None
    }

    /// Returns true once every step has been observed as finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.current_step() >= self.steps.len()
    }

    /// Returns true if the operator is unfinished and older than its timeout.
    ///
    /// This is advisory; the operator keeps working if the caller keeps it.
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.elapsed() > self.timeout
    }

    /// Applies the influence of every remaining unfinished step.
    pub fn influence(&self, influence: &mut OpInfluence, partition: &PartitionSnapshot) {
        for step in self.steps.iter().skip(self.current_step()) {
            if !step.is_finished(partition) {
                step.apply_influence(influence, partition);
            }
        }
    }

    /// Captures a serializable view of the operator.
    #[must_use]
    pub fn status(&self) -> OperatorStatus {
        OperatorStatus::from(self)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (kind:{}, partition:{}, createAt:{}, currentStep:{}, steps:[",
            self.desc,
            self.kind,
            self.partition_id,
            self.created_at,
            self.current_step()
        )?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{step}")?;
        }
        write!(f, "])")?;
        if self.is_timed_out() {
            write!(f, " timeout")?;
        }
        if self.is_finished() {
            write!(f, " finished")?;
        }
        Ok(())
    }
}

impl Serialize for Operator {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.status().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Peer;
    use std::sync::Arc;

    fn partition() -> PartitionSnapshot {
        PartitionSnapshot::new(1, 100)
            .with_leader(Peer::new(11, 1))
            .with_peer(Peer::new(12, 2))
            .with_peer(Peer::new(13, 3))
    }

    fn move_operator() -> Operator {
        Operator::new(
            "test",
            1,
            OperatorKind::REGION | OperatorKind::LEADER,
            vec![
                OperatorStep::AddPeer { to_store: 4, peer_id: 14 },
                OperatorStep::TransferLeader { from_store: 1, to_store: 2 },
                OperatorStep::RemovePeer { from_store: 1 },
            ],
        )
    }

    #[test]
    fn test_new_operator_defaults() {
        let op = move_operator();
        assert_eq!(op.len(), 3);
        assert_eq!(op.current_step(), 0);
        assert_eq!(op.priority(), PriorityLevel::Normal);
        assert_eq!(op.timeout(), MAX_OPERATOR_WAIT_TIME);
        assert!(!op.is_finished());
        assert!(!op.is_timed_out());
        assert_eq!(op.desc(), "test");
        assert_eq!(op.partition_id(), 1);
    }

    #[test]
    fn test_step_out_of_range() {
        let op = move_operator();
        assert_eq!(op.step(0), Some(&OperatorStep::AddPeer { to_store: 4, peer_id: 14 }));
        assert!(op.step(3).is_none());
        assert!(op.step(usize::MAX).is_none());
    }

    #[test]
    fn test_set_priority() {
        let mut op = move_operator();
        op.set_priority(PriorityLevel::High);
        assert_eq!(op.priority(), PriorityLevel::High);
    }

    #[test]
    fn test_check_advances_step_by_step() {
        let op = move_operator();
        let mut snapshot = partition();

        assert_eq!(op.check(&snapshot), op.step(0));
        assert_eq!(op.current_step(), 0);

        snapshot = snapshot.with_peer(Peer::new(14, 4));
        assert_eq!(op.check(&snapshot), op.step(1));
        assert_eq!(op.current_step(), 1);

        snapshot.leader = Some(Peer::new(12, 2));
        assert_eq!(op.check(&snapshot), op.step(2));
        assert_eq!(op.current_step(), 2);

        snapshot.peers.retain(|p| p.store_id != 1);
        assert!(op.check(&snapshot).is_none());
        assert!(op.is_finished());
    }

    #[test]
    fn test_check_skips_already_satisfied_steps() {
        let op = move_operator();
        let mut done = partition().with_peer(Peer::new(14, 4));
        done.leader = Some(Peer::new(12, 2));
        done.peers.retain(|p| p.store_id != 1);

        assert!(op.check(&done).is_none());
        assert_eq!(op.current_step(), 3);
    }

    #[test]
    fn test_stale_snapshot_never_regresses() {
        let op = move_operator();
        let mut fresh = partition().with_peer(Peer::new(14, 4));
        fresh.leader = Some(Peer::new(12, 2));
        assert_eq!(op.check(&fresh), op.step(2));
        assert_eq!(op.current_step(), 2);

        // The old snapshot no longer satisfies anything, yet progress stays.
        assert_eq!(op.check(&partition()), op.step(2));
        assert_eq!(op.current_step(), 2);
    }

    #[test]
    fn test_concurrent_checks_are_monotonic() {
        let op = Arc::new(move_operator());
        let stage0 = partition();
        let stage1 = partition().with_peer(Peer::new(14, 4));
        let mut stage2 = stage1.clone();
        stage2.leader = Some(Peer::new(12, 2));
        let mut stage3 = stage2.clone();
        stage3.peers.retain(|p| p.store_id != 1);
        let stages = Arc::new([stage0, stage1, stage2, stage3]);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let op = Arc::clone(&op);
                let stages = Arc::clone(&stages);
                std::thread::spawn(move || {
                    let mut last = 0;
                    for i in 0..200 {
                        op.check(&stages[(i + t) % stages.len()]);
                        let now = op.current_step();
                        assert!(now >= last, "cursor moved back from {last} to {now}");
                        last = now;
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(op.is_finished());
        assert!(op.check(&stages[0]).is_none());
    }

    #[test]
    fn test_timeout_with_short_threshold() {
        let op = move_operator().with_timeout(Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(20));
        assert!(op.elapsed() >= Duration::from_millis(20));
        assert!(op.is_timed_out());
        assert!(op.to_string().ends_with(" timeout"));
    }

    #[test]
    fn test_finished_operator_never_times_out() {
        let op = Operator::new(
            "noop",
            1,
            OperatorKind::REGION,
            vec![OperatorStep::RemovePeer { from_store: 9 }],
        )
        .with_timeout(Duration::ZERO);
        assert!(op.check(&partition()).is_none());
        std::thread::sleep(Duration::from_millis(5));
        assert!(op.is_finished());
        assert!(!op.is_timed_out());
        assert!(op.to_string().ends_with(" finished"));
    }

    #[test]
    fn test_influence_covers_only_remaining_steps() {
        let op = move_operator();
        let snapshot = partition().with_peer(Peer::new(14, 4));

        // AddPeer is satisfied but the cursor has not moved yet: still excluded.
        let mut influence = OpInfluence::new();
        op.influence(&mut influence, &snapshot);
        assert!(influence.get(4).is_none());
        assert_eq!(influence.get(1).map(|s| (s.leader_count, s.region_count)), Some((-1, -1)));
        assert_eq!(influence.get(2).map(|s| s.leader_size), Some(100));
    }

    #[test]
    fn test_finished_operator_has_no_influence() {
        let op = move_operator();
        let mut done = partition().with_peer(Peer::new(14, 4));
        done.leader = Some(Peer::new(12, 2));
        done.peers.retain(|p| p.store_id != 1);
        assert!(op.check(&done).is_none());

        let mut influence = OpInfluence::new();
        op.influence(&mut influence, &partition());
        assert!(influence.is_empty());
        assert_eq!(influence.iter().count(), 0);
    }

    #[test]
    fn test_display() {
        let op = move_operator();
        let text = op.to_string();
        assert!(text.starts_with("test (kind:leader,region, partition:1, createAt:"));
        assert!(text.contains("currentStep:0"));
        assert!(text.ends_with(
            "steps:[add peer 14 on store 4, transfer leader from store 1 to store 2, remove peer on store 1])"
        ));
    }
}

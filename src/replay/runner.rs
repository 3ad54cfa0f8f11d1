//! Replay runner.
//!
//! Drives one operator through a stream of snapshots the way the placement
//! driver's polling loop would: on every tick it projects the residual
//! influence, dispatches against the fresh snapshot, and records what
//! happened. The runner never mutates the cluster; the snapshots are the
//! only evidence of progress.

use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cluster::{PartitionSnapshot, StoreId};
use crate::config::ControllerConfig;
use crate::controller::{DispatchOutcome, OperatorController, OperatorHistoryEntry};
use crate::error::{ConfigError, PlacementError, ReplayError, Result, SnapshotError};
use crate::influence::OpInfluence;
use crate::operator::{Operator, OperatorStatus, OperatorStep};

use super::source::SnapshotSource;

/// Runs an operator against a snapshot source.
#[derive(Debug)]
pub struct ReplayRunner<S> {
    /// Where snapshots come from.
    source: S,
    /// Registry holding the replayed operator.
    controller: OperatorController,
    /// Delay between two polls.
    poll_interval: Duration,
}

/// How a replay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayOutcome {
    /// Every step was observed as finished.
    Finished,
    /// The operator exceeded its timeout.
    TimedOut,
    /// The source ran out of snapshots first.
    Exhausted,
}

/// One poll of the replay loop.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayTick {
    /// Zero-based poll number.
    pub index: usize,
    /// Leader store in the observed snapshot.
    pub leader_store: Option<StoreId>,
    /// Cursor after dispatch.
    pub current_step: usize,
    /// Step the cluster should execute next, if any.
    pub next_step: Option<OperatorStep>,
    /// Dispatch result as text.
    pub outcome: String,
    /// Residual influence projected before dispatch.
    pub influence: OpInfluence,
}

/// Result of a full replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// How the replay ended.
    pub outcome: ReplayOutcome,
    /// Operator state at the end of the replay.
    pub operator: OperatorStatus,
    /// Every poll, in order.
    pub ticks: Vec<ReplayTick>,
    /// Registry history at the end of the replay.
    pub history: Vec<OperatorHistoryEntry>,
}

impl<S: SnapshotSource> ReplayRunner<S> {
    /// Creates a runner polling `source` at the configured interval.
    #[must_use]
    pub fn new(source: S, config: &ControllerConfig) -> Self {
        Self {
            source,
            controller: OperatorController::new(config),
            poll_interval: config.poll_interval(),
        }
    }

    /// Registers `operator` and polls until it finishes, times out, or the
    /// source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the poll interval is zero, the operator is
    /// rejected, the source fails, or a snapshot belongs to another partition.
    pub async fn run(mut self, operator: Operator) -> Result<ReplayReport> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::validation(
                "Poll interval must be at least 1 millisecond",
                "poll_interval_ms",
            )
            .into());
        }

        let partition_id = operator.partition_id();
        let op = self.controller.add_operator(operator).map_err(|e| {
            PlacementError::Replay(ReplayError::Aborted {
                reason: e.to_string(),
            })
        })?;

        info!(
            partition = partition_id,
            steps = op.len(),
            interval_ms = u64::try_from(self.poll_interval.as_millis()).unwrap_or(u64::MAX),
            "Starting replay"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = Vec::new();

        let outcome = loop {
            interval.tick().await;

            let Some(snapshot) = self.source.next_snapshot().await? else {
                warn!(partition = partition_id, "snapshot source exhausted before the operator finished");
                break ReplayOutcome::Exhausted;
            };
            if snapshot.id != partition_id {
                return Err(SnapshotError::PartitionMismatch {
                    expected: partition_id,
                    found: snapshot.id,
                }
                .into());
            }

            let tick = self.poll(ticks.len(), &snapshot);
            let done = match self.controller.dispatch(&snapshot) {
                DispatchOutcome::Pending(_) => None,
                DispatchOutcome::Finished => Some(ReplayOutcome::Finished),
                DispatchOutcome::TimedOut => Some(ReplayOutcome::TimedOut),
                DispatchOutcome::NoOperator => {
                    return Err(PlacementError::internal(format!(
                        "operator for partition {partition_id} vanished during replay"
                    )));
                }
            };
            let tick = Self::finish_tick(tick, &op, done);
            debug!(tick = tick.index, "{}", tick.outcome);
            ticks.push(tick);

            if let Some(outcome) = done {
                break outcome;
            }
        };

        info!(partition = partition_id, ticks = ticks.len(), ?outcome, "Replay complete");

        Ok(ReplayReport {
            outcome,
            operator: op.status(),
            ticks,
            history: self.controller.history().cloned().collect(),
        })
    }

    /// Starts a tick record with the influence seen before dispatch.
    fn poll(&self, index: usize, snapshot: &PartitionSnapshot) -> ReplayTick {
        let influence = self
            .controller
            .influence(|id| (id == snapshot.id).then_some(snapshot));
        ReplayTick {
            index,
            leader_store: snapshot.leader_store_id(),
            current_step: 0,
            next_step: None,
            outcome: String::new(),
            influence,
        }
    }

    /// Fills in the cursor and the dispatch result.
    fn finish_tick(mut tick: ReplayTick, op: &Operator, done: Option<ReplayOutcome>) -> ReplayTick {
        tick.current_step = op.current_step();
        tick.next_step = op.step(tick.current_step).copied();
        tick.outcome = match (done, tick.next_step) {
            (Some(outcome), _) => outcome.to_string(),
            (None, Some(step)) => format!("pending: {step}"),
            (None, None) => String::from("pending"),
        };
        tick
    }
}

impl ReplayReport {
    /// Returns true if the operator finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.outcome == ReplayOutcome::Finished
    }

    /// One-line summary for logs.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} after {} polls ({}/{} steps)",
            self.outcome,
            self.ticks.len(),
            self.operator.current_step,
            self.operator.steps.len()
        );
        if let Some(step) = self.operator.next_step() {
            let _ = write!(out, ", waiting on {step}");
        }
        out
    }
}

impl std::fmt::Display for ReplayOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Finished => "finished",
            Self::TimedOut => "timed out",
            Self::Exhausted => "exhausted",
        };
        write!(f, "{s}")
    }
}

//! Snapshot sources for the replay loop.
//!
//! A source stands in for the heartbeat stream of a live cluster: each call
//! yields the next observed state of one partition.

use async_trait::async_trait;
use std::collections::VecDeque;

use crate::cluster::PartitionSnapshot;
use crate::config::Scenario;
use crate::error::Result;

/// Trait for producers of partition snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotSource: Send {
    /// Returns the next snapshot, or `None` once the source is exhausted.
    async fn next_snapshot(&mut self) -> Result<Option<PartitionSnapshot>>;
}

/// Replays a fixed list of snapshots in order.
#[derive(Debug, Clone, Default)]
pub struct TimelineSource {
    snapshots: VecDeque<PartitionSnapshot>,
}

impl TimelineSource {
    /// Creates a source over `snapshots`.
    #[must_use]
    pub fn new(snapshots: Vec<PartitionSnapshot>) -> Self {
        Self {
            snapshots: snapshots.into(),
        }
    }

    /// Creates a source over a scenario's timeline.
    #[must_use]
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self::new(scenario.timeline.clone())
    }

    /// Number of snapshots not yet yielded.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.snapshots.len()
    }
}

#[async_trait]
impl SnapshotSource for TimelineSource {
    async fn next_snapshot(&mut self) -> Result<Option<PartitionSnapshot>> {
        Ok(self.snapshots.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeline_yields_in_order() {
        let mut source = TimelineSource::new(vec![
            PartitionSnapshot::new(1, 10),
            PartitionSnapshot::new(1, 20),
        ]);
        assert_eq!(source.remaining(), 2);

        let first = source.next_snapshot().await.unwrap().unwrap();
        let second = source.next_snapshot().await.unwrap().unwrap();
        assert_eq!((first.approximate_size, second.approximate_size), (10, 20));
        assert!(source.next_snapshot().await.unwrap().is_none());
    }
}

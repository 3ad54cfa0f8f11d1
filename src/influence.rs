//! Load influence of in-flight operators.
//!
//! An [`OpInfluence`] is created fresh by the caller for every accounting
//! pass. Steps write signed deltas into it so the scheduler's view of store
//! load reflects work that is planned but not yet visible in the cluster.
//! The model is not synchronized; callers sharing it across threads must
//! serialize access themselves.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::cluster::{OperatorKind, PartitionId, PartitionSnapshot, StoreId};
use crate::operator::Operator;

/// Projected, not yet confirmed change to one store's load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreInfluence {
    /// Leader size delta.
    pub leader_size: i64,
    /// Leader count delta.
    pub leader_count: i64,
    /// Replica size delta.
    pub region_size: i64,
    /// Replica count delta.
    pub region_count: i64,
}

/// Per-store influence accumulated during one accounting pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OpInfluence {
    stores: BTreeMap<StoreId, StoreInfluence>,
}

impl StoreInfluence {
    /// Returns the size delta relevant to operators of `kind`.
    #[must_use]
    pub const fn resource_size(&self, kind: OperatorKind) -> i64 {
        if kind.contains(OperatorKind::LEADER) {
            self.leader_size
        } else {
            self.region_size
        }
    }

    /// Returns true if every delta is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.leader_size == 0
            && self.leader_count == 0
            && self.region_size == 0
            && self.region_count == 0
    }
}

impl OpInfluence {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sums the residual influence of every live operator.
    ///
    /// Finished and timed-out operators are ignored, as are operators whose
    /// partition `lookup` cannot resolve.
    pub fn from_operators<'o, 's, I, F>(operators: I, mut lookup: F) -> Self
    where
        I: IntoIterator<Item = &'o Operator>,
        F: FnMut(PartitionId) -> Option<&'s PartitionSnapshot>,
    {
        let mut influence = Self::new();
        for op in operators {
            if op.is_finished() || op.is_timed_out() {
                continue;
            }
            match lookup(op.partition_id()) {
                Some(snapshot) => op.influence(&mut influence, snapshot),
                None => debug!(
                    partition = op.partition_id(),
                    "no snapshot for operator, influence skipped"
                ),
            }
        }
        influence
    }

    /// Returns the record for `store_id`, creating an empty one if needed.
    pub fn store_influence_mut(&mut self, store_id: StoreId) -> &mut StoreInfluence {
        self.stores.entry(store_id).or_default()
    }

    /// Returns the record for `store_id` if any step touched it.
    #[must_use]
    pub fn get(&self, store_id: StoreId) -> Option<&StoreInfluence> {
        self.stores.get(&store_id)
    }

    /// Iterates over touched stores in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (StoreId, &StoreInfluence)> {
        self.stores.iter().map(|(id, inf)| (*id, inf))
    }

    /// Returns true if no store carries a non-zero delta.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.values().all(StoreInfluence::is_zero)
    }
}

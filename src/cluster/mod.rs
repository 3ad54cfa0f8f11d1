//! Cluster model consumed by the operator core.
//!
//! This module provides the read-only view of a partition that steps are
//! checked against, plus the opaque classification values (kind flags and
//! priority levels) that operators carry for the scheduler.

mod kind;
mod partition;

pub use kind::{OperatorKind, PriorityLevel};
pub use partition::{PartitionSnapshot, Peer};

/// Identifier of a store (a node hosting replicas).
pub type StoreId = u64;

/// Identifier of a single replica.
pub type PeerId = u64;

/// Identifier of a partition.
pub type PartitionId = u64;

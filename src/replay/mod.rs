//! Scenario replay.
//!
//! This module drives an operator through a recorded or scripted sequence of
//! partition snapshots, the way the placement driver's polling loop would.

mod request;
mod runner;
mod source;

pub use request::build_operator;
pub use runner::{ReplayOutcome, ReplayReport, ReplayRunner, ReplayTick};
pub use source::{SnapshotSource, TimelineSource};

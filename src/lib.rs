// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Placement Ops
//!
//! The operator execution core of a cluster placement driver.
//!
//! ## Overview
//!
//! A scheduler decides *what* should move ("drop the replica on store 3",
//! "move this replica from store 1 to store 4"). This crate turns such a
//! decision into an [`Operator`]: an ordered list of [`OperatorStep`]s that
//! the polling loop executes one at a time, checking each against the latest
//! partition snapshot before moving on.
//!
//! While an operator is in flight, its unfinished steps are projected onto an
//! [`OpInfluence`] so the scheduler sees the load a store is about to gain or
//! lose before the cluster reports it.
//!
//! ## Architecture
//!
//! 1. **Steps**: leader transfer, peer add and peer remove, each able to tell
//!    whether a snapshot already reflects it
//! 2. **Operators**: step sequences with a forward-only cursor and a timeout
//! 3. **Builders**: remove-peer and move-peer operators that never remove the
//!    leader's replica before relocating leadership
//! 4. **Controller**: one operator per partition, with a bounded history
//!
//! ## Modules
//!
//! - [`cluster`]: Partition snapshots, peers and operator kinds
//! - [`operator`]: Steps, operators and builders
//! - [`influence`]: Per-store load deltas
//! - [`controller`]: Registry of in-flight operators
//! - [`config`]: Controller settings and scenario files
//! - [`replay`]: Driving an operator through a snapshot timeline
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! partition:
//!   id: 7
//!   leader: { id: 11, store_id: 1 }
//!   peers:
//!     - { id: 11, store_id: 1 }
//!     - { id: 12, store_id: 2 }
//!   approximate_size: 96
//! operator:
//!   type: move-peer
//!   old_store: 1
//!   new_store: 3
//!   new_peer_id: 13
//! timeline:
//!   - id: 7
//!     leader: { id: 11, store_id: 1 }
//!     peers:
//!       - { id: 11, store_id: 1 }
//!       - { id: 12, store_id: 2 }
//!       - { id: 13, store_id: 3 }
//!     approximate_size: 96
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod cluster;
pub mod config;
pub mod controller;
pub mod error;
pub mod influence;
pub mod operator;
pub mod replay;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use cluster::{OperatorKind, PartitionSnapshot, Peer, PriorityLevel};
pub use config::{ConfigParser, ConfigValidator, ControllerConfig, Scenario};
pub use controller::{DispatchOutcome, OperatorController};
pub use error::{PlacementError, Result};
pub use influence::{OpInfluence, StoreInfluence};
pub use operator::{
    MAX_OPERATOR_WAIT_TIME, Operator, OperatorStep, create_move_peer_operator,
    create_remove_peer_operator,
};
pub use replay::{ReplayReport, ReplayRunner, SnapshotSource, TimelineSource};

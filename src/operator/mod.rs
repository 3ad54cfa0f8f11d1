//! Operator execution core.
//!
//! This module turns a scheduling decision into an ordered list of steps,
//! tracks which of them the cluster already reflects, and projects the load
//! effect of the rest.

mod builder;
mod op;
mod status;
mod step;

pub use builder::{create_move_peer_operator, create_remove_peer_operator};
pub use op::{MAX_OPERATOR_WAIT_TIME, Operator};
pub use status::OperatorStatus;
pub use step::OperatorStep;

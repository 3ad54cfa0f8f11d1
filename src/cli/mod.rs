//! CLI module for the placement operator tool.
//!
//! This module provides the command-line interface for inspecting and
//! replaying operator scenarios.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;

//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// placectl - Inspect and replay placement operators.
#[derive(Parser, Debug)]
#[command(name = "placectl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the controller configuration file.
    #[arg(short, long, global = true, env = "PLACECTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the controller configuration and a scenario file.
    Validate {
        /// Scenario file to check.
        scenario: PathBuf,

        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Build the scenario's operator and show its steps.
    Plan {
        /// Scenario file.
        scenario: PathBuf,
    },

    /// Show the per-store influence of the scenario's operator.
    Influence {
        /// Scenario file.
        scenario: PathBuf,
    },

    /// Replay the scenario's timeline against its operator.
    Replay {
        /// Scenario file.
        scenario: PathBuf,

        /// Override the poll interval in milliseconds.
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! operators, influence and replays in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::cluster::{OperatorKind, StoreId};
use crate::config::Scenario;
use crate::influence::OpInfluence;
use crate::operator::{Operator, OperatorStep};
use crate::replay::{ReplayOutcome, ReplayReport};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Operator step row for table display.
#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Step")]
    step: String,
    #[tabled(rename = "Stores")]
    stores: String,
    #[tabled(rename = "State")]
    state: String,
}

/// Store influence row for table display.
#[derive(Tabled)]
struct InfluenceRow {
    #[tabled(rename = "Store")]
    store: StoreId,
    #[tabled(rename = "Leader size")]
    leader_size: i64,
    #[tabled(rename = "Leader count")]
    leader_count: i64,
    #[tabled(rename = "Region size")]
    region_size: i64,
    #[tabled(rename = "Region count")]
    region_count: i64,
    #[tabled(rename = "Scheduled size")]
    resource_size: i64,
}

/// Replay tick row for table display.
#[derive(Tabled)]
struct TickRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Leader")]
    leader: String,
    #[tabled(rename = "Cursor")]
    cursor: usize,
    #[tabled(rename = "Outcome")]
    outcome: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result of validating a scenario.
    #[must_use]
    pub fn format_validation(&self, scenario: &Scenario, warnings: &[String]) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "valid": true,
                "partition": scenario.partition.id,
                "operator": scenario.operator.action.to_string(),
                "timeline": scenario.timeline.len(),
                "warnings": warnings,
            }))
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = format!("{} Scenario is valid!\n", "✓".green());
                let _ = writeln!(output, "\n   Partition: {}", scenario.partition);
                let _ = writeln!(output, "   Operator: {}", scenario.operator.action);
                let _ = writeln!(output, "   Timeline: {} snapshots", scenario.timeline.len());
                if !warnings.is_empty() {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }
                output
            }
        }
    }

    /// Formats an operator and its steps.
    #[must_use]
    pub fn format_plan(&self, op: &Operator) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(op).unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_text(op),
        }
    }

    /// Formats an operator as text.
    fn format_plan_text(op: &Operator) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "\nOperator: {}", op.desc().bold());
        let _ = writeln!(output, "   Partition: {}", op.partition_id());
        let _ = writeln!(output, "   Kind: {}", op.kind());
        let _ = writeln!(output, "   Priority: {}", op.priority());
        let _ = writeln!(output, "   Timeout: {}s\n", op.timeout().as_secs());

        let cursor = op.current_step();
        let rows: Vec<StepRow> = op
            .steps()
            .iter()
            .enumerate()
            .map(|(i, step)| StepRow {
                index: i + 1,
                step: Self::format_step(step),
                stores: step
                    .stores()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                state: if i < cursor {
                    "done".green().to_string()
                } else if i == cursor {
                    "next".yellow().to_string()
                } else {
                    "queued".dimmed().to_string()
                },
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');
        output
    }

    /// Formats the per-store influence of an operator.
    ///
    /// The scheduled size column is the delta a scheduler balancing
    /// operators of `kind` would weigh.
    #[must_use]
    pub fn format_influence(&self, influence: &OpInfluence, kind: OperatorKind) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(influence).unwrap_or_default(),
            OutputFormat::Text => {
                if influence.is_empty() {
                    return format!("{} No pending influence.\n", "✓".green());
                }

                let mut output = format!("\nPending influence per store ({kind})\n\n");
                output.push_str(&Table::new(influence_rows(influence, kind)).to_string());
                output.push('\n');
                output
            }
        }
    }

    /// Formats a replay report.
    #[must_use]
    pub fn format_replay(&self, report: &ReplayReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => {
                let rows: Vec<TickRow> = report
                    .ticks
                    .iter()
                    .map(|t| TickRow {
                        index: t.index,
                        leader: t
                            .leader_store
                            .map_or_else(|| String::from("-"), |s| s.to_string()),
                        cursor: t.current_step,
                        outcome: t.outcome.clone(),
                    })
                    .collect();

                let mut output = format!("\nReplay of operator '{}'\n\n", report.operator.desc);
                if !rows.is_empty() {
                    output.push_str(&Table::new(rows).to_string());
                    output.push('\n');
                }

                let status = match report.outcome {
                    ReplayOutcome::Finished => format!("{} {}", "✓".green(), report.summary()),
                    ReplayOutcome::TimedOut => format!("{} {}", "✗".red(), report.summary()),
                    ReplayOutcome::Exhausted => format!("{} {}", "⚠".yellow(), report.summary()),
                };
                let _ = writeln!(output, "\n{status}");
                output
            }
        }
    }

    /// Formats a step with color.
    fn format_step(step: &OperatorStep) -> String {
        let text = step.to_string();
        match step {
            OperatorStep::TransferLeader { .. } => text.yellow().to_string(),
            OperatorStep::AddPeer { .. } => text.green().to_string(),
            OperatorStep::RemovePeer { .. } => text.red().to_string(),
        }
    }
}

/// Builds table rows for the stores an operator actually touches.
fn influence_rows(influence: &OpInfluence, kind: OperatorKind) -> Vec<InfluenceRow> {
    influence
        .iter()
        .filter(|(_, store)| !store.is_zero())
        .map(|(store, inf)| InfluenceRow {
            store,
            leader_size: inf.leader_size,
            leader_count: inf.leader_count,
            region_size: inf.region_size,
            region_count: inf.region_count,
            resource_size: inf.resource_size(kind),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{OperatorKind, PartitionSnapshot, Peer};
    use crate::operator::create_remove_peer_operator;

    fn operator() -> (Operator, PartitionSnapshot) {
        let partition = PartitionSnapshot::new(9, 64)
            .with_leader(Peer::new(91, 1))
            .with_peer(Peer::new(92, 2));
        let op = create_remove_peer_operator("drain-store", OperatorKind::ADMIN, &partition, 1);
        (op, partition)
    }

    #[test]
    fn test_plan_json_is_structured() {
        let (op, _) = operator();
        let json = OutputFormatter::new(OutputFormat::Json).format_plan(&op);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["desc"], "drain-store");
        assert_eq!(value["steps"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_plan_text_lists_steps() {
        colored::control::set_override(false);
        let (op, _) = operator();
        let text = OutputFormatter::new(OutputFormat::Text).format_plan(&op);
        assert!(text.contains("drain-store"));
        assert!(text.contains("transfer leader from store 1 to store 2"));
        assert!(text.contains("remove peer on store 1"));
    }

    #[test]
    fn test_influence_text_skips_zero_stores() {
        colored::control::set_override(false);
        let (op, partition) = operator();
        let mut influence = OpInfluence::new();
        op.influence(&mut influence, &partition);
        influence.store_influence_mut(7);

        let text = OutputFormatter::new(OutputFormat::Text).format_influence(&influence, op.kind());
        assert!(text.contains("-64"));
        assert!(text.contains("Scheduled size"));
        assert!(!text.contains("| 7 "));
    }

    #[test]
    fn test_scheduled_size_follows_operator_kind() {
        let (op, partition) = operator();
        let mut influence = OpInfluence::new();
        op.influence(&mut influence, &partition);

        let target = |kind| {
            influence_rows(&influence, kind)
                .into_iter()
                .find(|row| row.store == 2)
                .map(|row| row.resource_size)
        };
        assert_eq!(target(op.kind()), Some(64));
        assert_eq!(target(OperatorKind::REGION), Some(0));
    }

    #[test]
    fn test_empty_influence() {
        colored::control::set_override(false);
        let text = OutputFormatter::new(OutputFormat::Text).format_influence(&OpInfluence::new(), OperatorKind::NONE);
        assert!(text.contains("No pending influence"));
    }
}

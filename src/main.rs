//! placectl CLI entrypoint.
//!
//! This is the main entrypoint for the placectl command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use placement_ops::cli::{Cli, Commands, OutputFormatter};
use placement_ops::config::{
    ConfigParser, ConfigValidator, ControllerConfig, Scenario, find_config_file,
};
use placement_ops::error::Result;
use placement_ops::replay::{ReplayRunner, TimelineSource, build_operator};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_json);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Validate { scenario, warnings } => {
            cmd_validate(&config, &scenario, warnings, &formatter)
        }
        Commands::Plan { scenario } => cmd_plan(&config, &scenario, &formatter),
        Commands::Influence { scenario } => cmd_influence(&config, &scenario, &formatter),
        Commands::Replay {
            scenario,
            interval_ms,
        } => cmd_replay(config, &scenario, interval_ms, &formatter).await,
    }
}

/// Validate configuration and scenario.
fn cmd_validate(
    config: &ControllerConfig,
    scenario_path: &Path,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    info!("Validating scenario: {}", scenario_path.display());

    let validator = ConfigValidator::new();
    let mut warnings = validator.validate(config)?.warnings;
    let scenario = ConfigParser::new().load_scenario(scenario_path)?;
    warnings.extend(validator.validate_scenario(&scenario)?.warnings);

    if !show_warnings {
        warnings.clear();
    }
    eprintln!("{}", formatter.format_validation(&scenario, &warnings));
    Ok(())
}

/// Show the operator a scenario builds.
fn cmd_plan(config: &ControllerConfig, scenario_path: &Path, formatter: &OutputFormatter) -> Result<()> {
    let scenario = load_scenario(scenario_path)?;
    let op = build_operator(&scenario.operator, &scenario.partition, config);
    // Advance past anything the initial snapshot already satisfies.
    match op.check(&scenario.partition) {
        Some(step) => debug!("next step: {step}"),
        None => info!("Initial snapshot already satisfies '{}'", op.desc()),
    }

    eprintln!("{}", formatter.format_plan(&op));
    Ok(())
}

/// Show the residual influence of a scenario's operator.
fn cmd_influence(
    config: &ControllerConfig,
    scenario_path: &Path,
    formatter: &OutputFormatter,
) -> Result<()> {
    let scenario = load_scenario(scenario_path)?;
    let op = build_operator(&scenario.operator, &scenario.partition, config);

    let influence = placement_ops::influence::OpInfluence::from_operators([&op], |id| {
        (id == scenario.partition.id).then_some(&scenario.partition)
    });

    eprintln!("{}", formatter.format_influence(&influence, op.kind()));
    Ok(())
}

/// Replay a scenario's timeline.
async fn cmd_replay(
    mut config: ControllerConfig,
    scenario_path: &Path,
    interval_ms: Option<u64>,
    formatter: &OutputFormatter,
) -> Result<()> {
    if let Some(ms) = interval_ms {
        config.poll_interval_ms = ms;
        ConfigValidator::new().validate(&config)?;
    }

    let scenario = load_scenario(scenario_path)?;
    let op = build_operator(&scenario.operator, &scenario.partition, &config);
    let source = TimelineSource::from_scenario(&scenario);

    let report = ReplayRunner::new(source, &config).run(op).await?;
    info!("Replay {}", report.summary());

    eprintln!("{}", formatter.format_replay(&report));
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Loads and validates controller settings.
///
/// An explicit path must exist; otherwise the usual locations are searched
/// and defaults apply when nothing is found.
fn load_config(config_path: Option<&PathBuf>) -> Result<ControllerConfig> {
    let config_file = match config_path {
        Some(path) => Some(path.clone()),
        None => find_config_file(".").ok(),
    };

    let base = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."));
    let parser = ConfigParser::new().with_base_path(base);
    parser.load_dotenv()?;

    debug!(
        "Loading configuration from: {}",
        config_file
            .as_deref()
            .map_or_else(|| String::from("<defaults>"), |p| p.display().to_string())
    );
    let config = ConfigParser::new().load_with_env(config_file.as_deref())?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Loads a scenario and rejects it if it is inconsistent.
fn load_scenario(path: &Path) -> Result<Scenario> {
    let scenario = ConfigParser::new().load_scenario(path)?;
    ConfigValidator::new().validate_scenario(&scenario)?;
    Ok(scenario)
}

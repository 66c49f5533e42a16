//! Integrator hook runner
//!
//! Simulates the host side of the credential protocol:
//! - Establish and tear down relations
//! - Publish provider credentials into the remote bag
//! - Flip leadership and redeliver deferred events
//! - Invoke operator actions

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use integrator_cli::output::print_error;
use integrator_cli::{execute, CliResult, Commands, OutputFormat, Unit, UnitState};
use integrator_core::{IntegratorConfig, IntegratorError};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Integrator CLI application
#[derive(Parser)]
#[command(name = "integrator")]
#[command(about = "Kafka credential integrator - hook runner", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "INTEGRATOR_CONFIG")]
    config: Option<String>,

    /// Unit state file
    #[arg(short, long, env = "INTEGRATOR_STATE", default_value = "integrator-state.json")]
    state: PathBuf,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = IntegratorConfig::load(cli.config.as_deref()).map_err(IntegratorError::from)?;

    // Initialize tracing
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());
    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    let state = UnitState::load(&cli.state)?;
    debug!(path = %cli.state.display(), leader = state.leader, "state loaded");
    let mut unit = Unit::from_state(state, config);

    // Persist even when the command fails.
    let result = execute(cli.command, &mut unit, cli.output);
    unit.into_state().save(&cli.state)?;
    result
}

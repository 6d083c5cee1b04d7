//! Poutine Index Validator
//!
//! Screens raw extracted prices before aggregation:
//! 1. Loads target cities, minimum wages, and the chain blocklist
//! 2. Applies the rule chain to every raw entry
//! 3. Writes accepted entries to the validated price file
//! 4. Writes the rejection report with reasons and warning flags

mod errors;
mod processor;
mod rules;

use clap::Parser;
use errors::ValidateError;
use poutine_common::config::ObservabilityConfig;
use poutine_common::telemetry::init_tracing;
use poutine_common::{AppConfig, VERSION};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "validate")]
#[command(about = "Validate raw poutine prices against the reference data")]
#[command(version)]
struct Cli {
    /// Extra TOML configuration file layered over config/
    #[arg(long, env = "POUTINE_CONFIG")]
    config: Option<PathBuf>,

    /// Raw price file (overrides paths.prices_raw)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Restaurant list used for the cross-reference
    #[arg(long)]
    restaurants: Option<PathBuf>,

    /// Validated price file to write
    #[arg(long)]
    output: Option<PathBuf>,

    /// Rejection report to write
    #[arg(long)]
    report: Option<PathBuf>,

    /// Reject entries that carry any warning flag
    #[arg(long, default_value_t = false)]
    strict: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ValidateError>() {
            Some(e) => {
                e.report();
                ExitCode::from(e.exit_code())
            }
            None => {
                tracing::error!(error = %err, "Run aborted");
                eprintln!("validate: {:#}", err);
                ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load_with(cli.config.as_deref());
    init_tracing(
        config
            .as_ref()
            .map(|c| &c.observability)
            .unwrap_or(&ObservabilityConfig::default()),
    );
    let mut config = config.map_err(ValidateError::from)?;

    if let Some(input) = cli.input {
        config.paths.prices_raw = input;
    }
    if let Some(restaurants) = cli.restaurants {
        config.paths.restaurants = restaurants;
    }
    if let Some(output) = cli.output {
        config.paths.prices_validated = output;
    }
    if let Some(report) = cli.report {
        config.paths.rejection_report = report;
    }
    if cli.strict {
        config.validation.strict = true;
    }

    info!("Starting Poutine Index validator v{}", VERSION);

    let today = chrono::Utc::now().date_naive();
    let summary = processor::run(&config, today)?;

    println!(
        "Validated {} entries: {} accepted, {} rejected, {} flagged",
        summary.total, summary.accepted, summary.rejected, summary.flagged
    );
    Ok(())
}

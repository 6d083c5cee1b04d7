//! Poutine Index Aggregator
//!
//! Turns validated prices into the per-city document the map reads:
//! 1. Loads reference data and the validated price file
//! 2. Computes per-bucket statistics and sample sizes per city
//! 3. Computes the affordability index from provincial minimum wages
//! 4. Checks the document against its schema and writes it

mod errors;
mod processor;
mod stats;

use clap::Parser;
use errors::AggregateError;
use poutine_common::config::ObservabilityConfig;
use poutine_common::telemetry::init_tracing;
use poutine_common::{AppConfig, VERSION};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "aggregate")]
#[command(about = "Aggregate validated poutine prices into per-city summaries")]
#[command(version)]
struct Cli {
    /// Extra TOML configuration file layered over config/
    #[arg(long, env = "POUTINE_CONFIG")]
    config: Option<PathBuf>,

    /// Validated price file (overrides paths.prices_validated)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Final per-city document to write
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<AggregateError>() {
            Some(e) => {
                e.report();
                ExitCode::from(e.exit_code())
            }
            None => {
                tracing::error!(error = %err, "Run aborted");
                eprintln!("aggregate: {:#}", err);
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
    let mut config = config.map_err(AggregateError::from)?;

    if let Some(input) = cli.input {
        config.paths.prices_validated = input;
    }
    if let Some(output) = cli.output {
        config.paths.cities_final = output;
    }

    info!("Starting Poutine Index aggregator v{}", VERSION);

    let today = chrono::Utc::now().date_naive();
    let document = processor::run(&config, today)?;

    println!(
        "Aggregated {} cities into {}",
        document.cities.len(),
        config.paths.cities_final.display()
    );
    Ok(())
}

//! Command-line entry point for the sale-strategy simulation.

use anyhow::{Context, Result};
use clap::Parser;
use saleflow::cancellation::CancellationToken;
use saleflow::config::SaleflowConfig;
use saleflow::errors::{FailureSummary, SaleflowError};
use saleflow::events::LoggingEventSink;
use saleflow::observability::{init_tracing, LogFormat};
use saleflow::providers::{AzureOpenAiClient, TavilyClient};
use saleflow::schema::UserInput;
use saleflow::simulation::{Clients, Simulation};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Simulate strategies for selling a property that is stuck on the market.
#[derive(Debug, Parser)]
#[command(name = "saleflow", version, about)]
struct Args {
    /// JSON file with `scenario`, `goal` and `constraint`.
    input: PathBuf,

    /// JSON configuration file.
    #[arg(short, long, env = "SALEFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the output artifacts.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Log output format.
    #[arg(long, default_value = "pretty", value_parser = parse_format)]
    log_format: LogFormat,

    /// Abort the run after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Skip report synthesis and the memo.
    #[arg(long)]
    no_report: bool,
}

fn parse_format(raw: &str) -> Result<LogFormat, String> {
    raw.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format, "info");

    let mut config = SaleflowConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if args.timeout_secs.is_some() {
        config.run_timeout_secs = args.timeout_secs;
    }

    let credentials = config.credentials().context("resolving credentials")?;
    let completion = AzureOpenAiClient::new(
        &credentials.azure_endpoint,
        credentials.azure_api_key.clone(),
        &config.completion,
    )?;
    let report = completion
        .clone()
        .with_temperature(config.report.temperature)
        .with_api_version(&config.report.api_version);
    let search = TavilyClient::new(credentials.tavily_api_key, &config.search)?;
    let clients = Clients::new(Arc::new(completion), Arc::new(search)).with_report_client(Arc::new(report));

    let input = UserInput::from_path(&args.input)
        .await
        .with_context(|| format!("loading input from {}", args.input.display()))?;

    let mut builder = Simulation::builder(clients, config).with_events(Arc::new(LoggingEventSink::debug()));
    if args.no_report {
        builder = builder.without_report();
    }
    let simulation = builder.build()?;

    let token = Arc::new(CancellationToken::new());
    {
        let token = Arc::clone(&token);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling run");
                token.cancel("interrupted by user");
            }
        });
    }

    match simulation.run(&input, &token).await {
        Ok(result) => {
            info!(
                run_id = %result.run.run_id,
                simulation_score = result.simulation.simulation_score,
                "Simulation finished"
            );
            println!("Diagnosis: {}", result.simulation.diagnosis);
            for (i, action) in result.simulation.strategic_actions.iter().enumerate() {
                println!("{}. {action}", i + 1);
            }
            println!("Simulation score: {:.2}", result.simulation.simulation_score);
            for path in &result.artifacts {
                println!("Wrote {}", path.display());
            }
            Ok(())
        }
        Err(err) => {
            match &err {
                SaleflowError::Pipeline(failure) => {
                    let summary = FailureSummary::from(failure);
                    error!(
                        stage = summary.stage.as_deref().unwrap_or("-"),
                        aborted = summary.aborted,
                        reason = %summary.reason,
                        "Simulation failed"
                    );
                }
                other => error!(error = %other, "Simulation failed"),
            }
            Err(err).context("simulation failed")
        }
    }
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::fs;
use tourguide_runner::metrics;

use super::context::CliContext;
use super::output::{print_json, OutputFormat};
use crate::scenario::{simulate, Scenario};

#[derive(Args, Clone, Debug)]
pub struct SimulateArgs {
    /// Scenario file (YAML)
    pub scenario: PathBuf,

    /// Tour files or directories (default: `tour_paths` from the config)
    #[arg(short, long = "tours")]
    pub tours: Vec<PathBuf>,

    /// Override the poll interval in milliseconds
    #[arg(long)]
    pub poll_ms: Option<u64>,

    /// Exit with an error unless every started tour completes
    #[arg(long)]
    pub expect_complete: bool,
}

pub async fn cmd_simulate(args: SimulateArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let source = fs::read_to_string(&args.scenario)
        .await
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let scenario = Scenario::from_yaml(&source)
        .with_context(|| format!("parsing scenario {}", args.scenario.display()))?;

    let registry = ctx.load_registry(&ctx.tour_paths(&args.tours))?;
    let mut config = ctx.config().runner_config();
    if let Some(ms) = args.poll_ms {
        config.poll_interval_ms = ms;
    }

    let report = simulate(&scenario, registry, config).await?;

    match output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Human => {
            for timed in &report.events {
                println!("{:>7}ms  {:<15} {}", timed.at_ms, timed.event.kind(), timed.event.tour());
            }
            for (tour, phase) in &report.phases {
                println!("{} finished as {:?}", tour, phase);
            }
            let totals = metrics::snapshot();
            println!(
                "hints shown: {}, steps advanced: {}, predicate errors: {}",
                totals.hints_shown, totals.steps_advanced, totals.predicate_errors
            );
        }
    }

    if args.expect_complete {
        let unfinished: Vec<&str> = report
            .tours
            .iter()
            .filter(|tour| !report.completed(tour))
            .map(String::as_str)
            .collect();
        if !unfinished.is_empty() {
            anyhow::bail!("tours did not complete: {}", unfinished.join(", "));
        }
    }
    Ok(())
}

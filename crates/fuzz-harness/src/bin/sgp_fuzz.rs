//! SGP4 property campaign CLI
//!
//! Examples:
//!   sgp-fuzz run                            # all targets, 10k cases each
//!   sgp-fuzz run --cases 500 --seed 42      # reproducible short run
//!   sgp-fuzz run --filter sweep             # targets whose name matches
//!   sgp-fuzz run --output junit > junit.xml
//!   sgp-fuzz list
//!   sgp-fuzz report results.json --output markdown

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fuzz_harness::properties::{run_targets, TARGETS};
use fuzz_harness::reports::{CampaignReport, ReportFormat};
use fuzz_harness::runner::{PropertyRunner, RunConfig, TargetResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sgp-fuzz", about = "Property-based fuzzing of the SGP4 propagator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check properties
    Run {
        /// Test cases per target
        #[arg(long, default_value_t = 10_000)]
        cases: u64,

        /// Random seed (0 = random)
        #[arg(long, default_value_t = 0, env = "SGP_FUZZ_SEED")]
        seed: u64,

        /// Only run targets whose name contains this
        #[arg(long)]
        filter: Option<String>,

        /// Output format: text, json, junit, markdown
        #[arg(long, default_value = "text")]
        output: ReportFormat,

        /// Also write the target results as JSON, for `sgp-fuzz report`
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// List the properties
    List,
    /// Re-render a JSON report or result list
    Report {
        file: PathBuf,

        #[arg(long, default_value = "text")]
        output: ReportFormat,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sgp_fuzz=info,fuzz_harness=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Run {
            cases,
            seed,
            filter,
            output,
            save,
        } => run(cases, seed, filter.as_deref(), output, save.as_deref()),
        Command::List => {
            list_targets();
            Ok(true)
        }
        Command::Report { file, output } => report(&file, output),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(
    cases: u64,
    seed: u64,
    filter: Option<&str>,
    output: ReportFormat,
    save: Option<&Path>,
) -> Result<bool> {
    info!("{}", "=".repeat(60));
    info!("SGP4 property campaign: {} cases per target, seed {}", cases, seed);
    info!("{}", "=".repeat(60));

    let mut runner = PropertyRunner::new(RunConfig::new().cases(cases).seed(seed));
    let count = run_targets(&mut runner, filter);
    if count == 0 {
        anyhow::bail!("no target matches '{}'", filter.unwrap_or_default());
    }

    if let Some(path) = save {
        fs::write(path, runner.to_json()?).with_context(|| format!("writing {:?}", path))?;
        info!("Results saved to {:?}", path);
    }

    let report = CampaignReport::new(runner.into_results()).with_seed(seed);
    println!("{}", report.render(output));
    Ok(report.summary.passed())
}

fn list_targets() {
    println!("Properties:");
    let mut group = "";
    for target in TARGETS {
        if target.group != group {
            group = target.group;
            println!();
            println!("  {}:", group);
        }
        println!("    - {:<24} {}", target.name, target.description);
    }
    println!();
    println!("Run with: sgp-fuzz run [--cases N] [--filter NAME]");
}

fn report(path: &Path, output: ReportFormat) -> Result<bool> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let report = match serde_json::from_str::<CampaignReport>(&json) {
        Ok(report) => report,
        Err(_) => {
            let results: Vec<TargetResult> = serde_json::from_str(&json)
                .with_context(|| format!("{:?} is neither a report nor a result list", path))?;
            CampaignReport::new(results)
        }
    };
    println!("{}", report.render(output));
    Ok(report.summary.passed())
}

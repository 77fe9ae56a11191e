//! Headless frontier runner.
//!
//! Runs scenarios without any presentation layer, for CI and determinism
//! verification.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in border skirmish and print the report
//! cargo run -p frontier_headless -- run
//!
//! # Run a scenario file, writing the report to disk
//! cargo run -p frontier_headless -- run --scenario scenarios/border_skirmish.ron --output results/report.json
//!
//! # Verify determinism across 8 parallel runs
//! cargo run -p frontier_headless -- verify --runs 8
//! ```
//!
//! Reports go to stdout (or `--output`); logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frontier_headless::{load_config, load_scenario, ScenarioRunner};

#[derive(Parser)]
#[command(name = "frontier_headless")]
#[command(about = "Headless territory simulation runner for CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and report the final state
    Run {
        /// Scenario file or built-in scenario name
        #[arg(short, long, default_value = "border_skirmish")]
        scenario: String,

        /// Rule config file (RON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Ticks to run; the scenario's default when omitted
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same scenario multiple times
    Verify {
        /// Scenario file or built-in scenario name
        #[arg(short, long, default_value = "border_skirmish")]
        scenario: String,

        /// Rule config file (RON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Ticks to run; the scenario's default when omitted
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for reports)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            config,
            ticks,
            output,
        } => cmd_run(&scenario, config, ticks, output),
        Commands::Verify {
            scenario,
            config,
            ticks,
            runs,
        } => cmd_verify(&scenario, config, ticks, runs),
    }
}

/// Build a runner, exiting on load errors.
fn load_runner(scenario: &str, config: Option<PathBuf>) -> ScenarioRunner {
    let scenario = match load_scenario(scenario) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load scenario: {e}");
            std::process::exit(1);
        }
    };
    let config = match load_config(config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };
    ScenarioRunner::new(scenario, config)
}

/// Run a scenario and emit its report
fn cmd_run(scenario: &str, config: Option<PathBuf>, ticks: Option<u64>, output: Option<PathBuf>) {
    let runner = load_runner(scenario, config);
    let ticks = ticks.unwrap_or(runner.scenario().ticks);

    let report = match runner.run(ticks) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Scenario failed: {e}");
            std::process::exit(1);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = report.save(&path) {
                eprintln!("Failed to write report: {e}");
                std::process::exit(1);
            }
            tracing::info!("Report written to {}", path.display());
        }
        None => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to encode report: {e}");
                std::process::exit(1);
            }
        },
    }
}

/// Verify determinism across parallel runs
fn cmd_verify(scenario: &str, config: Option<PathBuf>, ticks: Option<u64>, runs: usize) {
    let runner = load_runner(scenario, config);
    let ticks = ticks.unwrap_or(runner.scenario().ticks);

    tracing::info!(
        "Verifying determinism: {} for {} ticks ({} runs)",
        runner.scenario().name,
        ticks,
        runs
    );

    let report = match runner.verify_determinism(runs, ticks) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Verification failed to run: {e}");
            std::process::exit(1);
        }
    };

    if report.is_deterministic() {
        let hash = report.hashes.first().copied().unwrap_or_default();
        eprintln!("PASS: All {runs} runs produced identical results");
        eprintln!("  State hash: {hash:016x}");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for (run, hash) in report.hashes.iter().enumerate() {
            eprintln!("  Run {run}: {hash:016x}");
        }
        std::process::exit(1);
    }
}

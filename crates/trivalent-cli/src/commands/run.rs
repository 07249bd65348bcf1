//! The `run` command: populate databases and check them for logic bugs.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;
use trivalent_config::{ConfigLoader, TrivalentConfig};
use trivalent_oracle::{BugReport, OracleMode};

use crate::runner::{RunSummary, WorkerReport, run_workers};
use crate::style::{SemanticStyle, print_error, print_labeled, print_success};

/// Exit code for a found logic bug.
pub const EXIT_BUG: u8 = 1;
/// Exit code for an oracle defect, unexpected engine error or setup failure.
pub const EXIT_FATAL: u8 = 2;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Configuration file layered over trivalent.toml.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Master seed; random when omitted.
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Number of parallel workers.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Checks per worker.
    #[arg(short = 'n', long)]
    pub checks: Option<u64>,

    /// Oracle mode (where, distinct); repeat to cycle through several.
    #[arg(short, long = "mode", value_name = "MODE")]
    pub modes: Vec<OracleMode>,

    /// Database file; each worker gets its own copy. In-memory by default.
    #[arg(long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Stop all workers after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Directory for JSON bug reports.
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// Log filter (e.g. `debug`, `trivalent_oracle=trace`); overrides RUST_LOG.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl RunArgs {
    /// Applies command-line overrides, the highest-precedence layer.
    fn apply(&self, config: &mut TrivalentConfig) {
        if let Some(seed) = self.seed {
            config.run.seed = Some(seed);
        }
        if let Some(workers) = self.workers {
            config.run.workers = workers;
        }
        if let Some(checks) = self.checks {
            config.run.checks_per_worker = checks;
        }
        if !self.modes.is_empty() {
            config.oracle.modes.clone_from(&self.modes);
        }
        if let Some(path) = &self.database {
            config.database.path = Some(path.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config.run.timeout_secs = Some(secs);
        }
        if let Some(dir) = &self.report_dir {
            config.run.report_dir = Some(dir.clone());
        }
    }
}

pub fn run(args: &RunArgs) -> Result<ExitCode> {
    let mut loader = ConfigLoader::new();
    if let Some(file) = &args.config {
        loader = loader.with_file(file);
    }
    let mut config = loader.load().context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate()?;

    let seed = config.run.seed.unwrap_or_else(rand::random);
    info!(
        seed,
        workers = config.run.workers,
        checks_per_worker = config.run.checks_per_worker,
        "starting run"
    );
    println!(
        "Running {} worker(s) x {} checks (seed: {})...",
        config.run.workers.to_string().header(),
        config.run.checks_per_worker.to_string().header(),
        seed.to_string().code()
    );

    let summary = run_workers(&config, seed);
    print_summary(&summary);

    let mut code = ExitCode::SUCCESS;
    for (worker, report) in summary.bugs() {
        print_bug(&summary, worker, report);
        if let Some(dir) = &config.run.report_dir {
            let path = write_report(dir, summary.seed, worker, report)?;
            print_labeled("Report", &path.display().to_string());
        }
        code = ExitCode::from(EXIT_BUG);
    }
    for (worker, error) in summary.fatal_errors() {
        print_error(&format!("worker {} failed: {error:#}", worker.worker));
        code = ExitCode::from(EXIT_FATAL);
    }
    Ok(code)
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    println!();
    if stats.bugs == 0 && summary.fatal_errors().next().is_none() {
        print_success(&format!("{} checks, no logic bugs found", stats.checks));
    }
    print_labeled("Checks", &stats.checks.to_string());
    print_labeled("Passed", &stats.passed.to_string().success());
    print_labeled("Inconclusive", &stats.inconclusive.to_string());
    print_labeled("Bugs", &stats.bugs.to_string());
    print_labeled(
        "Time",
        &format!("{:.2}s", summary.elapsed.as_secs_f64()),
    );
    if summary.timed_out {
        println!("  {}", "stopped by timeout".warning());
    }
}

fn print_bug(summary: &RunSummary, worker: &WorkerReport, report: &BugReport) {
    println!();
    println!(
        "{} {}",
        "✗".error(),
        format!("Logic bug found by worker {}", worker.worker).error()
    );
    println!("{report}");
    println!();
    println!("{}", "Reproduce with:".warning());
    println!(
        "  {}",
        format!(
            "trivalent run --seed {} --workers {}",
            summary.seed,
            summary.workers.len()
        )
        .code()
    );
}

/// Writes `bug-<seed>-w<worker>.json` and returns its path.
fn write_report(
    dir: &Path,
    seed: u64,
    worker: &WorkerReport,
    report: &BugReport,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory {}", dir.display()))?;
    let path = dir.join(format!("bug-{seed}-w{}.json", worker.worker));
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

//! Parallel check workers.
//!
//! Each worker owns its database, oracle and random stream. Workers share
//! only the stop flag and hand back their statistics when they finish.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use tracing::{debug, info, warn};
use trivalent_config::TrivalentConfig;
use trivalent_oracle::duckdb::errors;
use trivalent_oracle::{
    BugReport, CheckOutcome, DatabaseError, DuckDbClient, OracleError, OracleStats,
    PredicateCombiningOracle,
};
use trivalent_sql::{AnsiRenderer, RandomExpressionGenerator, SqlRng};

use crate::workload;

/// Why a worker stopped before exhausting its budget.
#[derive(Debug)]
pub enum Failure {
    Bug(Box<BugReport>),
    /// Defects, unexpected errors and setup failures.
    Fatal(anyhow::Error),
}

impl From<OracleError> for Failure {
    fn from(error: OracleError) -> Self {
        match error {
            OracleError::LogicBug(report) => Failure::Bug(report),
            other => Failure::Fatal(other.into()),
        }
    }
}

impl From<DatabaseError> for Failure {
    fn from(error: DatabaseError) -> Self {
        Failure::Fatal(error.into())
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        Failure::Fatal(error)
    }
}

#[derive(Debug)]
pub struct WorkerReport {
    pub worker: usize,
    /// Seed of the worker's own random stream.
    pub seed: u64,
    pub stats: OracleStats,
    pub failure: Option<Failure>,
}

/// Aggregate over all workers.
#[derive(Debug)]
pub struct RunSummary {
    pub seed: u64,
    pub stats: OracleStats,
    pub elapsed: Duration,
    pub timed_out: bool,
    pub workers: Vec<WorkerReport>,
}

impl RunSummary {
    pub fn bugs(&self) -> impl Iterator<Item = (&WorkerReport, &BugReport)> {
        self.workers.iter().filter_map(|w| match &w.failure {
            Some(Failure::Bug(report)) => Some((w, report.as_ref())),
            _ => None,
        })
    }

    pub fn fatal_errors(&self) -> impl Iterator<Item = (&WorkerReport, &anyhow::Error)> {
        self.workers.iter().filter_map(|w| match &w.failure {
            Some(Failure::Fatal(e)) => Some((w, e)),
            _ => None,
        })
    }
}

struct Shared<'a> {
    config: &'a TrivalentConfig,
    stop: &'a AtomicBool,
    deadline: Option<Instant>,
}

impl Shared<'_> {
    fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Runs `config.run.workers` workers to completion and merges their
/// statistics.
pub fn run_workers(config: &TrivalentConfig, seed: u64) -> RunSummary {
    let started = Instant::now();
    let master = SqlRng::new(seed);
    let stop = AtomicBool::new(false);
    let shared = Shared {
        config,
        stop: &stop,
        deadline: config
            .run
            .timeout_secs
            .map(|secs| started + Duration::from_secs(secs)),
    };

    let workers: Vec<WorkerReport> = thread::scope(|scope| {
        let handles: Vec<_> = (0..config.run.workers)
            .map(|index| {
                let rng = master.fork(index as u64);
                let shared = &shared;
                scope.spawn(move || run_worker(shared, index, rng))
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| {
                handle.join().unwrap_or_else(|_| WorkerReport {
                    worker: index,
                    seed: master.fork(index as u64).seed(),
                    stats: OracleStats::default(),
                    failure: Some(Failure::Fatal(anyhow!("worker {index} panicked"))),
                })
            })
            .collect()
    });

    let mut stats = OracleStats::default();
    for worker in &workers {
        stats.merge(&worker.stats);
    }
    let elapsed = started.elapsed();
    let timed_out = shared.deadline.is_some_and(|d| Instant::now() >= d);
    info!(
        checks = stats.checks,
        passed = stats.passed,
        inconclusive = stats.inconclusive,
        bugs = stats.bugs,
        elapsed_ms = elapsed.as_millis(),
        "run finished"
    );
    RunSummary {
        seed,
        stats,
        elapsed,
        timed_out,
        workers,
    }
}

fn run_worker(shared: &Shared<'_>, index: usize, mut rng: SqlRng) -> WorkerReport {
    let seed = rng.seed();
    let config = shared.config;
    let mut oracle = PredicateCombiningOracle::new(
        config.oracle.clone(),
        RandomExpressionGenerator::new(config.generator.clone()),
        AnsiRenderer,
        errors::oracle_errors(),
    );
    debug!(worker = index, seed, "worker started");

    let failure = drive(shared, index, &mut oracle, &mut rng).err();
    if failure.is_some() {
        shared.stop.store(true, Ordering::Relaxed);
    }
    let stats = oracle.stats();
    debug!(worker = index, checks = stats.checks, "worker finished");
    WorkerReport {
        worker: index,
        seed,
        stats,
        failure,
    }
}

fn drive(
    shared: &Shared<'_>,
    index: usize,
    oracle: &mut PredicateCombiningOracle,
    rng: &mut SqlRng,
) -> Result<(), Failure> {
    let config = shared.config;
    let modes = &config.oracle.modes;
    if modes.is_empty() {
        return Err(Failure::Fatal(anyhow!("no oracle modes configured")));
    }
    let mut client = open_client(config.database.path.as_deref(), index)?;
    let per_database = config.run.checks_per_database;

    for check in 0..config.run.checks_per_worker {
        if shared.should_stop() {
            debug!(worker = index, check, "stop requested");
            break;
        }
        if check == 0 || (per_database > 0 && check % per_database == 0) {
            client.reset()?;
            workload::populate(&mut client, rng, &config.workload, &config.generator)
                .with_context(|| format!("worker {index} failed to populate its database"))?;
        }

        let mode = modes[(check % modes.len() as u64) as usize];
        match oracle.check(&mut client, mode, rng) {
            Ok(CheckOutcome::Passed { .. } | CheckOutcome::Inconclusive(_)) => {}
            Err(e) => {
                if !matches!(e, OracleError::LogicBug(_)) {
                    warn!(worker = index, error = %e, "worker aborted");
                }
                return Err(e.into());
            }
        }
    }
    Ok(())
}

fn open_client(path: Option<&Path>, worker: usize) -> Result<DuckDbClient, DatabaseError> {
    match path {
        Some(path) => DuckDbClient::open(worker_database_path(path, worker)),
        None => DuckDbClient::open_in_memory(),
    }
}

/// `fuzz.duckdb` becomes `fuzz-w3.duckdb` for worker 3.
fn worker_database_path(path: &Path, worker: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map_or_else(|| "trivalent".to_string(), |s| s.to_string_lossy().into_owned());
    let name = match path.extension() {
        Some(ext) => format!("{stem}-w{worker}.{}", ext.to_string_lossy()),
        None => format!("{stem}-w{worker}"),
    };
    path.with_file_name(name)
}

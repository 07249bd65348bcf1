//! Trivalent command line.
//!
//! Finds logic bugs in SQL engines with the predicate-combining oracle.
//!
//! # Quick Start
//!
//! ```bash
//! # 1000 checks against an in-memory DuckDB
//! trivalent run --seed 42
//!
//! # Four workers, DISTINCT only, for five minutes
//! trivalent run --workers 4 --mode distinct --timeout-secs 300
//!
//! # Inspect the merged configuration
//! trivalent config show --format toml
//! ```

mod commands;
mod runner;
mod style;
mod workload;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::config::Format;
use commands::run::{EXIT_FATAL, RunArgs};

/// Trivalent - find logic bugs in SQL engines with three-valued logic.
#[derive(Parser)]
#[command(name = "trivalent")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Populate databases and check them for logic bugs.
    Run(RunArgs),

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration.
    Show {
        /// Configuration file layered over trivalent.toml.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format.
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
}

/// Logs go to stderr so `config show` output stays machine-readable.
fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn dispatch(cli: &Cli) -> Result<ExitCode> {
    let log_level = match &cli.command {
        Commands::Run(args) => args.log_level.as_deref(),
        _ => None,
    };
    init_logging(log_level)?;

    match &cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run(args) => commands::run::run(args),
        Commands::Config(ConfigCommands::Show { config, format }) => {
            commands::config::show(config.as_deref(), *format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    style::set_no_color(cli.no_color || std::env::var_os("NO_COLOR").is_some());

    match dispatch(&cli) {
        Ok(code) => code,
        Err(e) => {
            style::print_error(&format!("{e:#}"));
            ExitCode::from(EXIT_FATAL)
        }
    }
}

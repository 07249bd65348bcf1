//! Configuration management commands.

use std::path::Path;

use anyhow::{Context, Result};
use trivalent_config::{ConfigLoader, TrivalentConfig};

use crate::style::{SemanticStyle, print_labeled};

/// Output formats of `config show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Text,
    Toml,
    Json,
}

/// Shows the effective configuration after merging every source.
pub fn show(file: Option<&Path>, format: Format) -> Result<()> {
    let mut loader = ConfigLoader::new();
    if let Some(file) = file {
        loader = loader.with_file(file);
    }
    let config = loader.load().context("Failed to load configuration")?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        Format::Toml => println!("{}", toml::to_string_pretty(&config)?),
        Format::Text => print_text(&config),
    }
    Ok(())
}

fn print_text(config: &TrivalentConfig) {
    let optional = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

    println!("{}", "Trivalent Configuration".header());
    println!();

    println!("Oracle:");
    let oracle = &config.oracle;
    let modes: Vec<&str> = oracle.modes.iter().map(|m| m.as_str()).collect();
    print_labeled("Modes", &modes.join(", "));
    print_labeled("Predicates per check", &oracle.num_predicates.to_string());
    print_labeled("Max depth", &oracle.max_depth.to_string());
    print_labeled("Leaf probability", &oracle.leaf_probability.to_string());
    print_labeled("Leaf selection", &format!("{:?}", oracle.leaf_selection));
    print_labeled("Max tables", &oracle.max_tables.to_string());
    print_labeled("Join probability", &oracle.join_probability.to_string());
    print_labeled("Ordered probability", &oracle.ordered_probability.to_string());
    println!();

    println!("Generator:");
    print_labeled(
        "Max expression depth",
        &config.generator.max_expression_depth.to_string(),
    );
    print_labeled(
        "Logic in predicates",
        &config.generator.logic_in_predicates.to_string(),
    );
    print_labeled("NULL probability", &config.generator.null_probability.to_string());
    println!();

    println!("Workload:");
    let workload = &config.workload;
    print_labeled("Max tables", &workload.max_tables.to_string());
    print_labeled("Max columns", &workload.max_columns.to_string());
    print_labeled("Max inserts", &workload.max_inserts.to_string());
    print_labeled("Max views", &workload.max_views.to_string());
    print_labeled("Indexes", &workload.test_indexes.to_string());
    print_labeled("NOT NULL", &workload.test_not_null.to_string());
    println!();

    println!("Run:");
    let run = &config.run;
    print_labeled("Seed", &optional(run.seed.map(|s| s.to_string())));
    print_labeled("Workers", &run.workers.to_string());
    print_labeled("Checks per worker", &run.checks_per_worker.to_string());
    print_labeled("Checks per database", &run.checks_per_database.to_string());
    print_labeled("Timeout (s)", &optional(run.timeout_secs.map(|s| s.to_string())));
    print_labeled(
        "Report directory",
        &optional(run.report_dir.as_ref().map(|p| p.display().to_string())),
    );
    println!();

    println!("Database:");
    print_labeled(
        "Path",
        &config
            .database
            .path
            .as_ref()
            .map_or_else(|| "in-memory".to_string(), |p| p.display().to_string()),
    );
}

//! Configuration management for Trivalent
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence, applied by the CLI)
//! 2. Environment variables (TRV_* prefix, `__` between section and key)
//! 3. An explicit file passed with `--config`
//! 4. trivalent.local.toml (gitignored, local overrides)
//! 5. trivalent.toml (git-tracked, project config)
//! 6. ~/.config/trivalent/config.toml (user defaults)
//! 7. Built-in defaults (lowest precedence)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trivalent_oracle::OracleOptions;
use trivalent_sql::{GeneratorOptions, WorkloadOptions};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main Trivalent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrivalentConfig {
    pub oracle: OracleOptions,
    pub generator: GeneratorOptions,
    pub workload: WorkloadOptions,
    pub run: RunConfig,
    pub database: DatabaseConfig,
}

/// How a run is scheduled across workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Master seed; a random one is drawn when absent.
    pub seed: Option<u64>,
    pub workers: usize,
    pub checks_per_worker: u64,
    /// Checks before a worker drops and rebuilds its tables.
    pub checks_per_database: u64,
    pub timeout_secs: Option<u64>,
    /// Where bug reports are written as JSON.
    pub report_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: None,
            workers: 1,
            checks_per_worker: 1000,
            checks_per_database: 100,
            timeout_secs: None,
            report_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file; each worker appends its own suffix. In-memory when
    /// absent.
    pub path: Option<PathBuf>,
}

impl TrivalentConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Rejects settings no run could honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("oracle.leaf_probability", self.oracle.leaf_probability),
            ("oracle.join_probability", self.oracle.join_probability),
            ("oracle.ordered_probability", self.oracle.ordered_probability),
            (
                "oracle.release_statements_probability",
                self.oracle.release_statements_probability,
            ),
            ("generator.null_probability", self.generator.null_probability),
        ];
        for (key, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{key} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.oracle.num_predicates == 0 {
            return Err(ConfigError::ValidationError(
                "oracle.num_predicates must be at least 1".to_string(),
            ));
        }
        if self.oracle.modes.is_empty() {
            return Err(ConfigError::ValidationError(
                "oracle.modes must name at least one mode".to_string(),
            ));
        }
        if self.run.workers == 0 {
            return Err(ConfigError::ValidationError(
                "run.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if let Some(dir) = self.run.report_dir.as_mut().filter(|d| d.is_relative()) {
            *dir = base.join(&*dir);
        }

        if let Some(path) = self.database.path.as_mut().filter(|p| p.is_relative()) {
            *path = base.join(&*path);
        }
    }
}

//! Configuration loader with multi-source merging

use crate::{ConfigError, Paths, TrivalentConfig};
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of environment overrides (`TRV_RUN__WORKERS=4`).
const ENV_PREFIX: &str = "TRV";

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    explicit_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            explicit_file: None,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Layer a file on top of the project files. Unlike those, it must
    /// exist and parse.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<TrivalentConfig> {
        let mut builder = config::Config::builder();

        // 1. Built-in defaults
        let defaults = TrivalentConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/trivalent/config.toml)
        let paths = Paths::new();
        if let Ok(user_config_file) = paths.user_config_file() {
            if user_config_file.exists() {
                builder = builder.add_source(
                    config::File::from(user_config_file)
                        .required(false)
                        .format(config::FileFormat::Toml),
                );
            }
        }

        // 3. Project config (trivalent.toml)
        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 4. Local config (trivalent.local.toml, gitignored)
        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Explicit --config file
        if let Some(path) = &self.explicit_file {
            let contents = read_toml(path)?;
            builder =
                builder.add_source(config::File::from_str(&contents, config::FileFormat::Toml));
        }

        // 6. Environment variables (TRV_ORACLE__MAX_DEPTH=5). Keys contain
        // underscores, so sections are split on a double underscore.
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut trivalent_config: TrivalentConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        trivalent_config.resolve_paths(&self.project_dir);
        trivalent_config.validate()?;

        Ok(trivalent_config)
    }

}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a TOML file, rejecting syntax errors with the file's path.
fn read_toml(path: &Path) -> Result<String, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<toml::Table>(&contents).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use trivalent_oracle::{LeafSelection, OracleMode};

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = ConfigLoader::new()
            .with_project_dir(temp_dir.path())
            .load()
            .expect("Failed to load config");

        assert_eq!(config.oracle.num_predicates, 10);
        assert_eq!(config.run.workers, 1);
        assert_eq!(config.oracle.modes, OracleMode::ALL);
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[oracle]
num_predicates = 4
leaf_selection = "uniform"

[workload]
max_inserts = 5

[run]
workers = 3
report_dir = "reports"
"#;
        fs::write(project_dir.join("trivalent.toml"), config_content)
            .expect("Failed to write config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("Failed to load config");

        assert_eq!(config.oracle.num_predicates, 4);
        assert_eq!(config.oracle.leaf_selection, LeafSelection::Uniform);
        assert_eq!(config.workload.max_inserts, 5);
        assert_eq!(config.run.workers, 3);
        assert_eq!(config.run.report_dir, Some(project_dir.join("reports")));
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(project_dir.join("trivalent.toml"), "[oracle]\nmax_depth = 2\n")
            .expect("Failed to write project config");
        fs::write(
            project_dir.join("trivalent.local.toml"),
            "[oracle]\nmax_depth = 6\n",
        )
        .expect("Failed to write local config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("Failed to load config");

        assert_eq!(config.oracle.max_depth, 6);
    }

    #[test]
    fn test_explicit_file_overrides_project() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();
        fs::write(project_dir.join("trivalent.toml"), "[run]\nseed = 1\n")
            .expect("Failed to write project config");
        let explicit = project_dir.join("ci.toml");
        fs::write(&explicit, "[run]\nseed = 99\n").expect("Failed to write explicit config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .with_file(&explicit)
            .load()
            .expect("Failed to load config");

        assert_eq!(config.run.seed, Some(99));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let err = ConfigLoader::new()
            .with_project_dir(temp_dir.path())
            .with_file(temp_dir.path().join("absent.toml"))
            .load()
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::ReadError { .. })
        ));
    }

    #[test]
    fn test_malformed_explicit_file_is_an_error() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "[oracle\nmax_depth = ").expect("Failed to write config");

        let err = ConfigLoader::new()
            .with_project_dir(temp_dir.path())
            .with_file(&path)
            .load()
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        fs::write(
            temp_dir.path().join("trivalent.toml"),
            "[oracle]\nordered_probability = 2.0\n",
        )
        .expect("Failed to write config");

        let err = ConfigLoader::new()
            .with_project_dir(temp_dir.path())
            .load()
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::ValidationError(_))
        ));
    }

    // Environment overrides are not exercised here because the process
    // environment is shared between tests. They take the form:
    //
    // TRV_ORACLE__NUM_PREDICATES=20
    // TRV_RUN__WORKERS=4
}

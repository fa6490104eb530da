//! Run configuration.
//!
//! Values are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file: `--config FILE`, or `config.toml` in the platform config
//!    directory when that exists
//! 3. `DUPSWEEP_`-prefixed environment variables (`DUPSWEEP_WORKER_COUNT=16`)
//! 4. Command-line flags
//!
//! ```toml
//! root = "/srv/photos"
//! dry_run = false
//! worker_count = 32
//! trash = true
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::ActionMode;
use crate::cli::CliOverrides;
use crate::duplicates::DEFAULT_WORKER_COUNT;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "DUPSWEEP_";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A config file was named explicitly but does not exist.
    #[error("config file not found: {0}")]
    MissingFile(PathBuf),

    /// A layer could not be parsed or has the wrong types.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// The digest pool needs at least one worker.
    #[error("worker_count must be at least 1")]
    ZeroWorkers,
}

/// Effective configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory to scan
    pub root: PathBuf,
    /// Report only, never delete
    pub dry_run: bool,
    /// Digest worker threads
    pub worker_count: usize,
    /// Move to trash instead of unlinking in apply mode
    pub trash: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            dry_run: true,
            worker_count: DEFAULT_WORKER_COUNT,
            trash: false,
        }
    }
}

impl Config {
    /// Load configuration from every layer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicit file is missing, a layer fails
    /// to parse, or the result is invalid.
    pub fn load(file: Option<&Path>, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        let file = match file {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };

        if let Some(ref path) = file {
            log::debug!("Loading config from {}", path.display());
        }

        let config: Self = Self::figment(file.as_deref(), overrides)
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Build the layered figment without extracting it.
    #[must_use]
    pub fn figment(file: Option<&Path>, overrides: &CliOverrides) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file_exact(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
            .merge(Serialized::defaults(overrides))
    }

    /// Default config file location for this platform.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupsweep").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    /// The action mode the resolution pass runs in.
    #[must_use]
    pub fn action_mode(&self) -> ActionMode {
        ActionMode::from_flags(self.dry_run, self.trash)
    }

    /// Render as TOML, suitable for use as a config file.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a value cannot be represented.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

//! ---
//! tbus_section: "01-core-functionality"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Shared primitives and utilities for the command runtime."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_grace_period() -> Duration {
    Duration::from_millis(800)
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_directive() -> String {
    "warn".to_owned()
}

/// Upper bound accepted for the publish grace period.
pub const MAX_GRACE_PERIOD: Duration = Duration::from_secs(60);

/// Primary configuration object for the tbus command-line tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

/// Metadata describing where a [`CliConfig`] was loaded from.
///
/// `source` is `None` when no file was found and the built-in defaults apply.
#[derive(Debug, Clone)]
pub struct LoadedCliConfig {
    pub config: CliConfig,
    pub source: Option<PathBuf>,
}

impl CliConfig {
    pub const ENV_CONFIG_PATH: &str = "TBUS_CONFIG";
    pub const DEFAULT_FILE_NAME: &str = "tbus.toml";

    /// Load configuration, honouring an explicit path, then `TBUS_CONFIG`,
    /// then the default search locations.
    pub fn load(explicit: Option<&Path>) -> Result<LoadedCliConfig> {
        let env_path = std::env::var(Self::ENV_CONFIG_PATH).ok();
        Self::load_from(explicit, env_path.as_deref(), &Self::default_candidates())
    }

    /// Resolution logic behind [`CliConfig::load`] with every input supplied.
    ///
    /// An explicit or environment-provided path must exist; the default
    /// candidates are optional and the first existing one wins.
    pub fn load_from<P: AsRef<Path>>(
        explicit: Option<&Path>,
        env_path: Option<&str>,
        candidates: &[P],
    ) -> Result<LoadedCliConfig> {
        if let Some(path) = explicit {
            return Self::loaded(path.to_path_buf());
        }

        if let Some(env_path) = env_path {
            if !env_path.trim().is_empty() {
                return Self::loaded(PathBuf::from(env_path));
            }
        }

        for candidate in candidates {
            if candidate.as_ref().is_file() {
                return Self::loaded(candidate.as_ref().to_path_buf());
            }
        }

        debug!(
            inspected = %candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            "no configuration file found; using defaults"
        );
        Ok(LoadedCliConfig {
            config: CliConfig::default(),
            source: None,
        })
    }

    /// Locations searched when neither `--config` nor `TBUS_CONFIG` is given.
    pub fn default_candidates() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(Self::DEFAULT_FILE_NAME)];
        if let Some(home) = std::env::var_os("HOME") {
            candidates.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("tbus")
                    .join(Self::DEFAULT_FILE_NAME),
            );
        }
        candidates
    }

    fn loaded(path: PathBuf) -> Result<LoadedCliConfig> {
        let config = Self::from_path(&path)?;
        Ok(LoadedCliConfig {
            config,
            source: Some(path),
        })
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        contents
            .parse::<CliConfig>()
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.publish.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for CliConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: CliConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// `EnvFilter` directive used when neither `TBUS_LOG` nor `RUST_LOG` is set.
    #[serde(default = "default_log_directive")]
    pub directive: String,
    /// When set, a daily rolling JSON log file is written here as well.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            directive: default_log_directive(),
            directory: None,
            file_prefix: None,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Pause between advertising a topic and the first publish.
    #[serde(rename = "grace_period_ms", default = "default_grace_period")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub grace_period: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            grace_period: default_grace_period(),
        }
    }
}

impl PublishConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grace_period > MAX_GRACE_PERIOD {
            return Err(anyhow!(
                "publish.grace_period_ms must not exceed {} (got {})",
                MAX_GRACE_PERIOD.as_millis(),
                self.grace_period.as_millis()
            ));
        }
        Ok(())
    }
}

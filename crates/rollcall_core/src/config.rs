//! Roster configuration.
//!
//! # Responsibility
//! - Describe where daily logs live and how rollover behaves.
//! - Parse JSON configuration with defaults for omitted fields.
//!
//! # Invariants
//! - `rollover_interval_secs > 0`.
//! - `file_prefix` and `carry_over_marker` never contain path separators,
//!   commas or line breaks.

use crate::logging::{default_log_level, LogLevel};
use crate::rollover::{DEFAULT_CARRY_OVER_MARKER, DEFAULT_ROLLOVER_INTERVAL_SECS};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default prefix of daily log file names.
pub const DEFAULT_FILE_PREFIX: &str = "signout_log_";

/// Error for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Runtime settings for the roster core.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RosterConfig {
    /// Directory holding one CSV file per day.
    pub log_dir: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_rollover_interval_secs")]
    pub rollover_interval_secs: u64,
    #[serde(default = "default_carry_over_marker")]
    pub carry_over_marker: String,
    /// Absolute directory for diagnostic logs; diagnostics are off when unset.
    #[serde(default)]
    pub diagnostics_dir: Option<PathBuf>,
    #[serde(default = "default_level")]
    pub log_level: String,
}

impl RosterConfig {
    /// Creates a config with defaults for everything but `log_dir`.
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            file_prefix: default_file_prefix(),
            rollover_interval_secs: default_rollover_interval_secs(),
            carry_over_marker: default_carry_over_marker(),
            diagnostics_dir: None,
            log_level: default_level(),
        }
    }

    /// Parses and validates JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn rollover_interval(&self) -> Duration {
        Duration::from_secs(self.rollover_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("log_dir cannot be empty".to_string()));
        }
        if self.rollover_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "rollover_interval_secs must be greater than 0".to_string(),
            ));
        }
        LogLevel::parse(&self.log_level).map_err(ConfigError::Invalid)?;
        if self.file_prefix.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "file_prefix `{}` cannot contain path separators",
                self.file_prefix
            )));
        }
        for (field, value) in [
            ("file_prefix", self.file_prefix.as_str()),
            ("carry_over_marker", self.carry_over_marker.as_str()),
        ] {
            if value.contains([',', '\n', '\r']) {
                return Err(ConfigError::Invalid(format!(
                    "{field} cannot contain commas or line breaks"
                )));
            }
        }
        Ok(())
    }
}

fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.to_string()
}

fn default_rollover_interval_secs() -> u64 {
    DEFAULT_ROLLOVER_INTERVAL_SECS
}

fn default_carry_over_marker() -> String {
    DEFAULT_CARRY_OVER_MARKER.to_string()
}

fn default_level() -> String {
    default_log_level().to_string()
}

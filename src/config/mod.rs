//! Configuration management for merkle-replay
//!
//! This module handles loading, validating, and providing access to the
//! application configuration. It supports loading configuration from files,
//! environment variables, and programmatic overrides.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod validation;

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod validation_tests;

#[cfg(test)]
#[path = "tests/config_mod_tests.rs"]
mod config_mod_tests;

use std::{
    env,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use directories::ProjectDirs;

use serde::{Deserialize, Serialize};

use crate::LogLevel;

/// Re-export the error type
pub use error::ConfigError;

/// The environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "MRV_";

/// The application name used for finding config directories
const APP_NAME: &str = "merkle-replay";

/// Main configuration structure for merkle-replay.
///
/// # Example
///
/// ```no_run
/// use merkle_replay::config::Config;
///
/// // A path that does not exist falls back to defaults.
/// let config = Config::load("path/that/hopefully/does/not/exist.toml").unwrap();
/// assert_eq!(config.playback.default_interval_ms, 800);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Auto-advance timing
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where snapshot documents come from
    #[serde(default)]
    pub data: DataConfig,
}

/// Playback timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaybackConfig {
    /// Interval used when the caller gives none
    pub default_interval_ms: u64,
    /// Fastest allowed interval
    pub min_interval_ms: u64,
    /// Slowest allowed interval
    pub max_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_interval_ms: 800,
            min_interval_ms: 50,
            max_interval_ms: 5000,
        }
    }
}

impl PlaybackConfig {
    /// The default interval as a `Duration`.
    pub fn default_interval(&self) -> Duration {
        Duration::from_millis(self.default_interval_ms)
    }

    /// Bounds a requested interval to `[min_interval_ms, max_interval_ms]`.
    pub fn clamp_interval(&self, requested_ms: u64) -> Duration {
        let clamped = requested_ms.clamp(self.min_interval_ms, self.max_interval_ms.max(self.min_interval_ms));
        if clamped != requested_ms {
            log::debug!("Interval {}ms clamped to {}ms", requested_ms, clamped);
        }
        Duration::from_millis(clamped)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Whether to log to console
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: true,
        }
    }
}

/// Snapshot source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// Path of the JSON snapshot document
    pub snapshot_path: String,
    /// Scenario selected at start-up instead of the first one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scenario: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "merkle.json".to_string(),
            default_scenario: None,
        }
    }
}

impl Config {
    /// Loads the configuration from the specified path.
    ///
    /// A missing file falls back to built-in defaults. In both cases
    /// environment variables with the `MRV_` prefix are applied on top and
    /// the result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read,
    /// parsed, or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let mut config = match fs::read_to_string(path) {
            Ok(config_str) => toml::from_str::<Config>(&config_str)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Config file not found at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::error!("Failed to read config file {}: {}", path.display(), e);
                return Err(ConfigError::Io(e));
            }
        };

        config.apply_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    ///
    /// Recognised variables: `MRV_LOGGING_LEVEL`, `MRV_PLAYBACK_INTERVAL_MS`
    /// and `MRV_DATA_SNAPSHOT_PATH`. Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if any recognised variable cannot be parsed.
    pub fn apply_env_vars(&mut self) -> Result<(), ConfigError> {
        for (key, value) in env::vars() {
            let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if value.trim().is_empty() {
                continue;
            }

            match stripped.to_lowercase().as_str() {
                "logging_level" => {
                    self.logging.level = value.parse().map_err(|_| {
                        ConfigError::invalid_value("logging.level", &value, "Invalid log level")
                    })?;
                }
                "playback_interval_ms" => {
                    self.playback.default_interval_ms = value.trim().parse().map_err(|_| {
                        ConfigError::invalid_value(
                            "playback.default_interval_ms",
                            &value,
                            "Expected a whole number of milliseconds",
                        )
                    })?;
                }
                "data_snapshot_path" => {
                    self.data.snapshot_path = value;
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match validation::validate_config(self) {
            Ok(()) => Ok(()),
            Err(err) => match err {
                crate::error::ReplayError::ConfigError(config_error) => Err(config_error),
                other => Err(ConfigError::Other(other.to_string())),
            },
        }
    }

    /// Returns the path to the directory where configuration files should be stored.
    ///
    /// This is OS-specific:
    /// - Linux: `$HOME/.config/merkle-replay`
    /// - macOS: `$HOME/Library/Application Support/dev.merkle-replay.merkle-replay`
    /// - Windows: `%APPDATA%\\merkle-replay\\merkle-replay\\config`
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "merkle-replay", APP_NAME)
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
    }
}

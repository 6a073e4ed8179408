//! Configuration validation for merkle-replay
//!
//! Checks that each section holds values the playback engine can use.

use super::error::ConfigError;
use super::{Config, DataConfig, LoggingConfig, PlaybackConfig};
use crate::error::ReplayError;

/// Validates the application configuration.
///
/// # Errors
///
/// Returns the first failing check as a `ReplayError::ConfigError`.
pub fn validate_config(config: &Config) -> Result<(), ReplayError> {
    validate_playback_config(&config.playback)?;
    validate_logging_config(&config.logging)?;
    validate_data_config(&config.data)?;
    Ok(())
}

/// Validates the playback timing configuration.
fn validate_playback_config(config: &PlaybackConfig) -> Result<(), ReplayError> {
    if config.min_interval_ms == 0 {
        return Err(ConfigError::invalid_value(
            "playback.min_interval_ms",
            config.min_interval_ms,
            "min_interval_ms must be greater than 0",
        )
        .into());
    }

    if config.max_interval_ms < config.min_interval_ms {
        return Err(ConfigError::invalid_value(
            "playback.max_interval_ms",
            config.max_interval_ms,
            format!("max_interval_ms must be at least min_interval_ms ({})", config.min_interval_ms),
        )
        .into());
    }

    if !(config.min_interval_ms..=config.max_interval_ms).contains(&config.default_interval_ms) {
        return Err(ConfigError::invalid_value(
            "playback.default_interval_ms",
            config.default_interval_ms,
            format!(
                "default_interval_ms must lie within {}..={}",
                config.min_interval_ms, config.max_interval_ms
            ),
        )
        .into());
    }

    Ok(())
}

/// Validates the logging configuration.
fn validate_logging_config(config: &LoggingConfig) -> Result<(), ReplayError> {
    if !config.console {
        log::warn!("Console logging is disabled. No logs will be captured.");
    }
    Ok(())
}

/// Validates the data source configuration.
fn validate_data_config(config: &DataConfig) -> Result<(), ReplayError> {
    if config.snapshot_path.trim().is_empty() {
        return Err(ConfigError::missing_value("data.snapshot_path").into());
    }

    if let Some(key) = &config.default_scenario {
        if key.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "data.default_scenario",
                key,
                "default_scenario cannot be blank",
            )
            .into());
        }
    }

    Ok(())
}

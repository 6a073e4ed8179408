#![cfg(feature = "logging")]

use merkle_replay::config::Config;
use merkle_replay::{init, LogLevel, ReplayError};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_init_fails_when_logger_already_set() {
    // Pre-initialize logger
    let _ = env_logger::builder().is_test(true).try_init();

    let dir = tempdir().unwrap();
    let config_path = dir.path().join("cfg.toml");
    let mut cfg = Config::default();
    cfg.logging.level = LogLevel::Debug;
    fs::write(&config_path, toml::to_string(&cfg).unwrap()).unwrap();

    let result = init(Some(config_path.to_str().unwrap()));
    assert!(matches!(result, Err(ReplayError::InvalidInput(_))));
}

#[test]
fn test_init_reports_invalid_config() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("cfg.toml");
    fs::write(&config_path, "[playback]\ndefault_interval_ms = 10\nmin_interval_ms = 50\nmax_interval_ms = 100\n").unwrap();

    let result = init(Some(config_path.to_str().unwrap()));
    assert!(matches!(result, Err(ReplayError::ConfigError(_))));
}

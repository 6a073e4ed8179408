use super::*;
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_config_default_values() {
    let cfg = Config::default();
    assert_eq!(cfg.playback.default_interval_ms, 800);
    assert_eq!(cfg.logging.level, LogLevel::Info);
    assert_eq!(cfg.data.snapshot_path, "merkle.json");
    assert!(cfg.data.default_scenario.is_none());
    assert!(cfg.validate().is_ok());
}

#[test]
#[serial]
fn test_load_existing_file_and_missing_file() {
    let dir = tempdir().expect("create temp dir");
    let mut cfg = Config::default();
    cfg.logging.level = LogLevel::Debug;
    cfg.playback.default_interval_ms = 250;
    cfg.data.default_scenario = Some("ok".to_string());

    let toml_string = toml::to_string(&cfg).expect("serialize config");
    let config_path = dir.path().join("cfg.toml");
    fs::write(&config_path, toml_string).unwrap();

    let loaded = Config::load(&config_path).expect("load existing config");
    assert_eq!(loaded.logging.level, LogLevel::Debug);
    assert_eq!(loaded.playback.default_interval_ms, 250);
    assert_eq!(loaded.data.default_scenario.as_deref(), Some("ok"));

    // Nonexistent file should fall back to defaults
    let missing_path = dir.path().join("missing.toml");
    let default_loaded = Config::load(&missing_path).expect("load missing");
    assert_eq!(default_loaded.playback.default_interval_ms, 800);
}

#[test]
#[serial]
fn test_partial_file_keeps_other_sections() {
    let dir = tempdir().expect("create temp dir");
    let config_path = dir.path().join("partial.toml");
    fs::write(&config_path, "[logging]\nlevel = \"warn\"\nconsole = false\n").unwrap();

    let loaded = Config::load(&config_path).expect("load partial config");
    assert_eq!(loaded.logging.level, LogLevel::Warn);
    assert!(!loaded.logging.console);
    assert_eq!(loaded.playback.max_interval_ms, 5000);
}

#[test]
#[serial]
fn test_load_invalid_toml_fails() {
    let dir = tempdir().expect("create temp dir");
    let invalid_path = dir.path().join("bad.toml");
    fs::write(&invalid_path, "not = [valid\n").unwrap();

    let err = Config::load(&invalid_path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
    assert!(err.to_string().starts_with("Failed to parse configuration"));
}

#[test]
#[serial]
fn test_load_unreadable_path_is_io_error() {
    let dir = tempdir().expect("create temp dir");
    // A directory exists but cannot be read as a file.
    let err = Config::load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
#[serial]
fn test_load_rejects_unknown_section() {
    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("unknown.toml");
    fs::write(&path, "[storage]\nbase_path = \"./data\"\n").unwrap();
    assert!(Config::load(&path).is_err());
}

#[test]
#[serial]
fn test_apply_env_vars() {
    std::env::set_var("MRV_LOGGING_LEVEL", "debug");
    std::env::set_var("MRV_PLAYBACK_INTERVAL_MS", "120");
    std::env::set_var("MRV_DATA_SNAPSHOT_PATH", "/tmp/other.json");
    let mut cfg = Config::default();
    cfg.apply_env_vars().unwrap();
    assert_eq!(cfg.logging.level, LogLevel::Debug);
    assert_eq!(cfg.playback.default_interval_ms, 120);
    assert_eq!(cfg.data.snapshot_path, "/tmp/other.json");
    std::env::remove_var("MRV_LOGGING_LEVEL");
    std::env::remove_var("MRV_PLAYBACK_INTERVAL_MS");
    std::env::remove_var("MRV_DATA_SNAPSHOT_PATH");

    std::env::set_var("MRV_LOGGING_LEVEL", "bogus");
    let mut cfg = Config::default();
    assert!(cfg.apply_env_vars().is_err());
    std::env::remove_var("MRV_LOGGING_LEVEL");

    std::env::set_var("MRV_PLAYBACK_INTERVAL_MS", "fast");
    let mut cfg = Config::default();
    let err = cfg.apply_env_vars().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "playback.default_interval_ms"));
    std::env::remove_var("MRV_PLAYBACK_INTERVAL_MS");
}

#[test]
#[serial]
fn test_env_override_is_validated_on_load() {
    let dir = tempdir().expect("create temp dir");
    std::env::set_var("MRV_PLAYBACK_INTERVAL_MS", "1");
    let result = Config::load(dir.path().join("missing.toml"));
    std::env::remove_var("MRV_PLAYBACK_INTERVAL_MS");
    assert!(result.is_err());
}

#[test]
fn test_clamp_interval() {
    let playback = PlaybackConfig::default();
    assert_eq!(playback.clamp_interval(10), Duration::from_millis(50));
    assert_eq!(playback.clamp_interval(300), Duration::from_millis(300));
    assert_eq!(playback.clamp_interval(60_000), Duration::from_millis(5000));
    assert_eq!(playback.default_interval(), Duration::from_millis(800));
}

#[test]
fn test_config_dir_returns_valid_path() {
    if let Some(path) = Config::config_dir() {
        assert!(Path::new(&path).ends_with("merkle-replay") || path.to_string_lossy().contains("merkle-replay"));
    }
}

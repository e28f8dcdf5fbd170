use dbwait::{ConfigError, WaitConfig};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_config_loading() {
    let config = WaitConfig::from_file("tests/fixtures/dbwait.toml").unwrap();
    assert_eq!(config.database.host, "localhost");
    assert_eq!(config.database.port, 5433);
    assert_eq!(config.database.user, "postgres");
    assert_eq!(config.database.dbname, "app");
    assert_eq!(config.wait.max_attempts, 30);
    assert_eq!(config.wait.retry_delay, Duration::from_secs(1));
    assert_eq!(config.wait.connect_timeout, Duration::from_secs(3));
}

#[test]
fn test_config_missing_file() {
    let result = WaitConfig::from_file("nonexistent.toml");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_partial_file_keeps_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[database]\nhost = \"pg\"").unwrap();

    let config = WaitConfig::from_file(file.path()).unwrap();
    assert_eq!(config.database.host, "pg");
    assert_eq!(config.database.port, 5432);
    assert_eq!(config.wait.max_attempts, 60);
}

#[test]
fn test_unknown_key_is_rejected() {
    let result = WaitConfig::from_toml_str("[database]\nhots = \"typo\"\n");
    assert!(matches!(result, Err(ConfigError::Toml(_))));
}

#[test]
fn test_env_beats_file() {
    let mut config = WaitConfig::from_file("tests/fixtures/dbwait.toml").unwrap();
    config
        .apply_env(|var| match var {
            "DB_HOST" => Some("custom-host".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.database.host, "custom-host");
    // still from the file
    assert_eq!(config.database.port, 5433);
}

#[test]
fn test_empty_file_is_defaults() {
    let config = WaitConfig::from_toml_str("").unwrap();
    assert_eq!(config, WaitConfig::default());
    assert!(config.validate().is_ok());
}

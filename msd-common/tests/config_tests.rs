//! Configuration resolution tests
//!
//! Tests that manipulate MSD_INGEST_CONFIG are marked with #[serial] so they
//! never run in parallel with each other.

use msd_common::config::{ConfigOverrides, IngestConfig, CONFIG_ENV_VAR};
use msd_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_explicit_file_takes_precedence_over_env() {
    let env_file = write_config("keyspace = \"from_env\"");
    let cli_file = write_config("keyspace = \"from_cli\"");
    env::set_var(CONFIG_ENV_VAR, env_file.path());

    let config = IngestConfig::load(Some(cli_file.path()), &ConfigOverrides::default()).unwrap();
    assert_eq!(config.keyspace, "from_cli");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_file_used_without_explicit_path() {
    let env_file = write_config(
        r#"
        track_table = "tracks"

        [replication]
        datacenter = "eu_west"
        factor = 2

        [logging]
        level = "debug"
        file = "/tmp/msd-env.log"
        "#,
    );
    env::set_var(CONFIG_ENV_VAR, env_file.path());

    let config = IngestConfig::load(None, &ConfigOverrides::default()).unwrap();
    assert_eq!(config.keyspace, "music");
    assert_eq!(config.track_table, "tracks");
    assert_eq!(config.replication.datacenter, "eu_west");
    assert_eq!(config.replication.factor, 2);
    assert_eq!(config.logging.level.as_deref(), Some("debug"));
    assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/msd-env.log")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_pointing_at_missing_file_is_error() {
    env::set_var(CONFIG_ENV_VAR, "/nonexistent/msd-ingest/config.toml");

    let result = IngestConfig::load(None, &ConfigOverrides::default());
    assert!(matches!(result, Err(Error::Config(_))));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_overrides_beat_file_values() {
    let file = write_config(
        r#"
        keyspace = "from_file"

        [replication]
        factor = 5
        "#,
    );
    let overrides = ConfigOverrides {
        keyspace: Some("from_flag".to_string()),
        replication_factor: Some(1),
        log_file: None,
    };

    let config = IngestConfig::load(Some(file.path()), &overrides).unwrap();
    assert_eq!(config.keyspace, "from_flag");
    assert_eq!(config.replication.factor, 1);
}

#[test]
#[serial]
fn test_invalid_values_fail_validation() {
    let file = write_config("keyspace = \"bad-name\"");
    let result = IngestConfig::load(Some(file.path()), &ConfigOverrides::default());
    assert!(matches!(result, Err(Error::Config(_))));

    let overrides = ConfigOverrides {
        replication_factor: Some(0),
        ..ConfigOverrides::default()
    };
    let file = write_config("");
    let result = IngestConfig::load(Some(file.path()), &overrides);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_malformed_toml_is_config_error() {
    let file = write_config("keyspace = ");
    let result = IngestConfig::load(Some(file.path()), &ConfigOverrides::default());
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("Invalid TOML")),
        other => panic!("Expected config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_mixed_case_keyspace_override_rejected() {
    let file = write_config("");
    let overrides = ConfigOverrides {
        keyspace: Some("Staging".to_string()),
        ..ConfigOverrides::default()
    };

    match IngestConfig::load(Some(file.path()), &overrides) {
        Err(Error::Config(msg)) => assert!(msg.contains("keyspace 'Staging'"), "{}", msg),
        other => panic!("Expected config error, got {:?}", other),
    }
}

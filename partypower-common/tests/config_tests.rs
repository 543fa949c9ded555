//! Configuration loading tests
//!
//! Covers:
//! - Config path priority (CLI > environment > platform default)
//! - Missing explicit config files are reported, not silently ignored
//! - Invalid analysis parameters are rejected at load time
//!
//! Note: Tests that manipulate PARTYPOWER_CONFIG are marked with #[serial]
//! so they never race each other on the process environment.

use partypower_common::config::{
    load_config, load_toml_config, resolve_config_path, TomlConfig, CONFIG_ENV_VAR,
};
use partypower_common::params::UnmatchedPolicy;
use partypower_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_full_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "config.toml",
        r#"
        [logging]
        level = "debug"

        [recognizer]
        endpoint = "https://recognizer.example/identify"
        access_key = "abc123"
        timeout_secs = 10
        max_concurrency = 3

        [analysis]
        window_secs = 16.0
        unmatched_policy = "keep"
        duration_tiers = [
            { max_secs = 300.0, count = 2 },
            { max_secs = 900.0, count = 4 },
        ]
        max_target_count = 6
        "#,
    );

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.recognizer.access_key.as_deref(), Some("abc123"));
    assert_eq!(config.recognizer.max_concurrency, 3);
    assert_eq!(config.analysis.window_secs, 16.0);
    assert_eq!(config.analysis.window_stride_secs(), 4.0);
    assert_eq!(config.analysis.unmatched_policy, UnmatchedPolicy::Keep);
    assert_eq!(config.analysis.target_count(200.0), 2);
    assert_eq!(config.analysis.target_count(600.0), 4);
    assert_eq!(config.analysis.target_count(3600.0), 6);
}

#[test]
fn test_invalid_analysis_params_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "bad.toml",
        r#"
        [analysis]
        rhythm_min_bpm = 200
        rhythm_max_bpm = 100
        "#,
    );

    let result = load_toml_config(&path);
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_malformed_toml_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "broken.toml", "[analysis\nwindow_secs = ");

    let result = load_toml_config(&path);
    assert!(matches!(result, Err(Error::Toml(_))));
}

#[test]
#[serial]
fn test_env_var_used_when_no_cli_arg() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "env.toml", "[logging]\nlevel = \"warn\"\n");

    env::set_var(CONFIG_ENV_VAR, &path);
    let resolved = resolve_config_path(None, CONFIG_ENV_VAR);
    let config = load_config(None);
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(path));
    assert_eq!(config.unwrap().logging.level, "warn");
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var() {
    let dir = TempDir::new().unwrap();
    let env_path = write_config(&dir, "env.toml", "[logging]\nlevel = \"warn\"\n");
    let cli_path = write_config(&dir, "cli.toml", "[logging]\nlevel = \"trace\"\n");

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let config = load_config(Some(&cli_path));
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.unwrap().logging.level, "trace");
}

#[test]
#[serial]
fn test_missing_explicit_config_is_not_found() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let result = load_config(Some(&missing));
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_default_config_roundtrips_through_toml() {
    let config = TomlConfig::default();
    let text = toml::to_string(&config).unwrap();
    let parsed: TomlConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;
use yare::parameterized;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_listen_on_8080_with_one_second_flush() {
    let config = Config::default();
    assert_eq!(config.listen_addr.to_string(), DEFAULT_LISTEN_ADDR);
    assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
    assert_eq!(config.flush_interval, Duration::from_secs(1));
    assert!(config.validate().is_ok());
}

#[test]
fn data_dir_follows_xdg_state_home() {
    let dir = default_data_dir(env(&[("XDG_STATE_HOME", "/state"), ("HOME", "/home/u")]));
    assert_eq!(dir, PathBuf::from("/state/reclog"));

    let dir = default_data_dir(env(&[("HOME", "/home/u")]));
    assert_eq!(dir, PathBuf::from("/home/u/.local/state/reclog"));
}

#[test]
fn parses_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(
        &path,
        r#"
listen_addr = "0.0.0.0:9090"
data_dir = "/tmp/records"
flush_interval = "250ms"
buffer_capacity = 65536
"#,
    )
    .unwrap();

    let config = Config::load_with(Some(&path), env(&[])).unwrap();
    assert_eq!(config.listen_addr.to_string(), "0.0.0.0:9090");
    assert_eq!(config.data_dir, PathBuf::from("/tmp/records"));
    assert_eq!(config.flush_interval, Duration::from_millis(250));
    assert_eq!(config.buffer_capacity, 65536);
    // Unset fields keep their defaults
    assert_eq!(config.request_timeout, Duration::from_secs(5));
}

#[test]
fn picks_up_config_file_in_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE),
        format!(
            "listen_addr = \"127.0.0.1:7000\"\ndata_dir = {:?}\n",
            dir.path().display().to_string()
        ),
    )
    .unwrap();

    let data_dir = dir.path().display().to_string();
    let config = Config::load_with(None, env(&[(ENV_DATA_DIR, &data_dir)])).unwrap();
    assert_eq!(config.listen_addr.port(), 7000);
    assert_eq!(config.data_dir, dir.path());
}

#[test]
fn missing_config_file_in_data_dir_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().display().to_string();

    let config = Config::load_with(None, env(&[(ENV_DATA_DIR, &data_dir)])).unwrap();
    assert_eq!(config.data_dir, dir.path());
    assert_eq!(config.listen_addr.to_string(), DEFAULT_LISTEN_ADDR);
}

#[test]
fn env_overrides_file_values() {
    let config = Config::default()
        .apply_env(env(&[
            (ENV_LISTEN_ADDR, "127.0.0.1:1234"),
            (ENV_FLUSH_INTERVAL, "2s"),
            (ENV_REQUEST_TIMEOUT, "100ms"),
        ]))
        .unwrap();

    assert_eq!(config.listen_addr.port(), 1234);
    assert_eq!(config.flush_interval, Duration::from_secs(2));
    assert_eq!(config.request_timeout, Duration::from_millis(100));
}

#[parameterized(
    bad_addr = { ENV_LISTEN_ADDR, "localhost" },
    bad_flush = { ENV_FLUSH_INTERVAL, "soon" },
    bad_timeout = { ENV_REQUEST_TIMEOUT, "-1" },
)]
fn invalid_env_values_are_rejected(var: &str, value: &str) {
    let result = Config::default().apply_env(env(&[(var, value)]));
    assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
}

#[test]
fn zero_flush_interval_is_invalid() {
    let config = Config {
        flush_interval: Duration::ZERO,
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "segments = 4\n").unwrap();

    let result = Config::from_file(&path);
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn derived_paths_live_in_data_dir() {
    let config = Config {
        data_dir: PathBuf::from("/data"),
        ..Config::default()
    };
    assert_eq!(config.records_path(), PathBuf::from("/data/records.log"));
    assert_eq!(config.daemon_log_path(), PathBuf::from("/data/daemon.log"));
    assert_eq!(config.lock_path(), PathBuf::from("/data/daemon.pid"));
    assert_eq!(config.version_path(), PathBuf::from("/data/daemon.version"));
}

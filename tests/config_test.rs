//! Tests for config loading from the environment and TOML files
//!
//! Environment variables are process-global, so these tests run serially.

use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use uptime_monitor::config::Config;

const VARS: &[&str] = &[
    "UPTIME_SCAN_INTERVAL",
    "CHECKER_SCAN_INTERVAL",
    "UPTIME_HTTP_TIMEOUT",
    "HTTP_TIMEOUT",
    "UPTIME_MAX_CONCURRENT_PROBES",
    "UPTIME_USER_AGENT",
    "UPTIME_PERSIST_RETRIES",
    "UPTIME_DB_PATH",
    "DB_PATH",
    "UPTIME_BIND_ADDRESS",
    "PORT",
    "UPTIME_LOG_LEVEL",
    "LOG_LEVEL",
    "UPTIME_LOG_FORMAT",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    let config = Config::from_env().unwrap();

    assert_eq!(config, Config::default());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_primary_names() {
    clear_env();
    std::env::set_var("UPTIME_SCAN_INTERVAL", "2");
    std::env::set_var("UPTIME_HTTP_TIMEOUT", "3");
    std::env::set_var("UPTIME_MAX_CONCURRENT_PROBES", "8");
    std::env::set_var("UPTIME_PERSIST_RETRIES", "5");
    std::env::set_var("UPTIME_DB_PATH", "/tmp/monitor.db");
    std::env::set_var("UPTIME_BIND_ADDRESS", "127.0.0.1:9100");
    std::env::set_var("UPTIME_LOG_FORMAT", "JSON");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.scheduler.scan_interval_secs, 2);
    assert_eq!(config.scheduler.http_timeout_secs, 3);
    assert_eq!(config.scheduler.max_concurrent_probes, 8);
    assert_eq!(config.scheduler.persist_retries, 5);
    assert_eq!(config.storage.db_path, PathBuf::from("/tmp/monitor.db"));
    assert_eq!(config.server.bind_address.to_string(), "127.0.0.1:9100");
    assert_eq!(config.logging.format, "json");
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_fallback_names() {
    clear_env();
    std::env::set_var("CHECKER_SCAN_INTERVAL", "7");
    std::env::set_var("HTTP_TIMEOUT", "4");
    std::env::set_var("DB_PATH", "legacy.db");
    std::env::set_var("PORT", "8081");
    std::env::set_var("LOG_LEVEL", "DEBUG");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.scheduler.scan_interval_secs, 7);
    assert_eq!(config.scheduler.http_timeout_secs, 4);
    assert_eq!(config.storage.db_path, PathBuf::from("legacy.db"));
    assert_eq!(config.server.bind_address.port(), 8081);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_primary_name_wins_over_fallback() {
    clear_env();
    std::env::set_var("UPTIME_SCAN_INTERVAL", "9");
    std::env::set_var("CHECKER_SCAN_INTERVAL", "1");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.scheduler.scan_interval_secs, 9);
}

#[test]
#[serial]
fn test_unparseable_values_fall_back_to_defaults() {
    clear_env();
    std::env::set_var("UPTIME_SCAN_INTERVAL", "soon");
    std::env::set_var("PORT", "http");
    std::env::set_var("UPTIME_PERSIST_RETRIES", "-1");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.scheduler.scan_interval_secs, 5);
    assert_eq!(config.server.bind_address.port(), 8000);
    assert_eq!(config.scheduler.persist_retries, 2);
}

#[test]
fn test_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[scheduler]
scan_interval_secs = 1
http_timeout_secs = 2
max_concurrent_probes = 4

[storage]
db_path = "monitor.db"

[logging]
level = "warn"
format = "json"
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.scheduler.scan_interval_secs, 1);
    assert_eq!(config.scheduler.max_concurrent_probes, 4);
    assert_eq!(config.storage.db_path, PathBuf::from("monitor.db"));
    assert_eq!(config.logging.format, "json");
    assert!(config.server.enable_cors);
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_file_reports_parse_errors() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[scheduler\nscan_interval_secs = ").unwrap();

    let err = Config::from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML"));
}

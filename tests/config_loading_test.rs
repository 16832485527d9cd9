//! Layered configuration loading: defaults, TOML file, environment.

use mikrotik_guardian::config::{GuardianConfig, LogFormat};
use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;

const OVERRIDES: [&str; 3] = [
    "GUARDIAN_TELEMETRY__POLL_INTERVAL_SECS",
    "GUARDIAN_CONNECTION__RECONNECT__MAX_ATTEMPTS",
    "GUARDIAN_APPLICATION__LOG_LEVEL",
];

fn clear_env() {
    for var in OVERRIDES {
        std::env::remove_var(var);
    }
}

fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("guardian.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
#[serial]
fn test_missing_file_gives_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = GuardianConfig::load_from(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, GuardianConfig::default());
}

#[test]
#[serial]
fn test_partial_file_keeps_other_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[application]
log_format = "json"

[connection.reconnect]
max_attempts = 5

[telemetry]
mock_mode = "instant"
seed = 42
"#,
    );

    let config = GuardianConfig::load_from(&path).unwrap();
    assert_eq!(config.application.log_format, LogFormat::Json);
    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.connection.reconnect.max_attempts, 5);
    assert_eq!(config.connection.reconnect.initial_delay_ms, 1000);
    assert_eq!(config.telemetry.seed, Some(42));
    assert_eq!(config.telemetry.poll_interval_secs, 30);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[telemetry]\npoll_interval_secs = 15\n");

    std::env::set_var("GUARDIAN_TELEMETRY__POLL_INTERVAL_SECS", "5");
    std::env::set_var("GUARDIAN_CONNECTION__RECONNECT__MAX_ATTEMPTS", "3");
    let config = GuardianConfig::load_from(&path).unwrap();
    clear_env();

    assert_eq!(config.telemetry.poll_interval_secs, 5);
    assert_eq!(config.connection.reconnect.max_attempts, 3);
}

#[test]
#[serial]
fn test_bad_values_fail_validation() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "[connection.reconnect]\ninitial_delay_ms = 5000\nmax_delay_ms = 1000\n",
    );
    let config = GuardianConfig::load_from(&path).unwrap();
    assert!(config.validate().unwrap_err().contains("max_delay_ms"));

    std::env::set_var("GUARDIAN_APPLICATION__LOG_LEVEL", "loud");
    let config = GuardianConfig::load_from(dir.path().join("absent.toml")).unwrap();
    clear_env();
    assert!(config.validate().unwrap_err().contains("log_level"));
}

#[test]
#[serial]
fn test_wrong_type_is_a_load_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[telemetry]\npoll_interval_secs = \"often\"\n");
    assert!(GuardianConfig::load_from(&path).is_err());
}

#[test]
#[serial]
fn test_shipped_config_is_valid() {
    clear_env();
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/guardian.toml");
    let config = GuardianConfig::load_from(&path).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config, GuardianConfig::default());
}

#[test]
fn test_toml_roundtrip_of_effective_config() {
    let text = GuardianConfig::default().to_toml().unwrap();
    assert!(text.contains("[connection.reconnect]"));
    let parsed: GuardianConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed, GuardianConfig::default());
}

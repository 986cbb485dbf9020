use std::env;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use tempfile::TempDir;
use vmscale_monitor::{ConfigError, MonitorConfig};

const VARS: [&str; 4] = [
    "VMSCALE_LOG_FILE",
    "VMSCALE_LOG_LEVEL",
    "VMSCALE_DISK_MOUNT_POINT",
    "VMSCALE_CHECK_INTERVAL_SECS",
];

// The process environment is shared between test threads.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clean_env() -> MutexGuard<'static, ()> {
    let guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    for var in VARS {
        env::remove_var(var);
    }
    guard
}

#[test]
fn test_no_overrides_gives_defaults() {
    let _env = clean_env();

    let config = MonitorConfig::load_with_fallback(None::<PathBuf>).unwrap();
    assert_eq!(config, MonitorConfig::default());
}

#[test]
fn test_env_overrides() {
    let _env = clean_env();
    env::set_var("VMSCALE_LOG_FILE", "/var/log/vmscale/monitor.log");
    env::set_var("VMSCALE_LOG_LEVEL", "debug");
    env::set_var("VMSCALE_DISK_MOUNT_POINT", "/data");
    env::set_var("VMSCALE_CHECK_INTERVAL_SECS", "5");

    let config = MonitorConfig::from_env().unwrap();
    assert_eq!(config.logging.file, PathBuf::from("/var/log/vmscale/monitor.log"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.sampling.disk_mount_point, PathBuf::from("/data"));
    assert_eq!(config.check_interval_secs, 5);
    assert_eq!(config.threshold, 75.0);

    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_malformed_check_interval() {
    let _env = clean_env();
    env::set_var("VMSCALE_CHECK_INTERVAL_SECS", "ten");

    let err = MonitorConfig::from_env().unwrap_err();
    match err {
        ConfigError::InvalidValue { field, value } => {
            assert_eq!(field, "VMSCALE_CHECK_INTERVAL_SECS");
            assert_eq!(value, "ten");
        }
        other => panic!("unexpected error: {other}"),
    }

    env::remove_var("VMSCALE_CHECK_INTERVAL_SECS");
}

#[test]
fn test_zero_check_interval_fails_validation() {
    let _env = clean_env();
    env::set_var("VMSCALE_CHECK_INTERVAL_SECS", "0");

    let err = MonitorConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "check_interval_secs"));

    env::remove_var("VMSCALE_CHECK_INTERVAL_SECS");
}

#[test]
fn test_env_wins_over_file() {
    let _env = clean_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("monitor.toml");
    std::fs::write(
        &path,
        "check_interval_secs = 30\n\n[logging]\nfile = \"from-file.log\"\n",
    )
    .unwrap();
    env::set_var("VMSCALE_LOG_FILE", "from-env.log");

    let config = MonitorConfig::load_with_fallback(Some(&path)).unwrap();
    assert_eq!(config.logging.file, PathBuf::from("from-env.log"));
    assert_eq!(config.check_interval_secs, 30);

    env::remove_var("VMSCALE_LOG_FILE");
}

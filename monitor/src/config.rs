//! Configuration for the resource monitor
//!
//! The defaults are the fixed monitoring table: 75% threshold, 10 second
//! checks, 60 second cooldown, cpu/memory/disk in that order. A TOML file
//! and a couple of environment variables may override them at startup;
//! after that the value is immutable and owned by the monitor.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// A monitored resource. Declaration order is the default check priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Cpu,
    Memory,
    Disk,
}

impl ResourceKind {
    /// Upper-case name used in alert lines
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Cpu => "CPU",
            ResourceKind::Memory => "MEMORY",
            ResourceKind::Disk => "DISK",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Cpu => write!(f, "cpu"),
            ResourceKind::Memory => write!(f, "memory"),
            ResourceKind::Disk => write!(f, "disk"),
        }
    }
}

/// Main configuration structure for the monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Usage percentage that must be exceeded to trigger scaling
    pub threshold: f64,

    /// Seconds to sleep between ticks
    pub check_interval_secs: u64,

    /// Minimum seconds between two scaling actions
    pub cooldown_period_secs: u64,

    /// Resources checked each tick, in priority order
    pub resources_to_monitor: Vec<ResourceKind>,

    /// Cloud instance named in the simulated scaling log lines
    pub cloud: CloudTarget,

    /// Usage sampling configuration
    pub sampling: SamplingConfig,

    /// Simulated scaling configuration
    pub scaling: ScalingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Identity of the scale-out target. Only ever logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudTarget {
    pub provider: String,
    pub project_id: String,
    pub zone: String,
    pub instance_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Window over which CPU usage is measured
    pub cpu_window_ms: u64,

    /// Mount point whose filesystem usage is reported as disk usage
    pub disk_mount_point: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    /// Pause after each simulated scaling step
    pub step_pause_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file, appended to on every run
    pub file: PathBuf,

    /// Default level when neither the command line nor RUST_LOG set one
    pub level: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            threshold: 75.0,
            check_interval_secs: 10,
            cooldown_period_secs: 60,
            resources_to_monitor: vec![ResourceKind::Cpu, ResourceKind::Memory, ResourceKind::Disk],
            cloud: CloudTarget::default(),
            sampling: SamplingConfig::default(),
            scaling: ScalingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CloudTarget {
    fn default() -> Self {
        Self {
            provider: "GCP".to_string(),
            project_id: "innate-might-454613-p4".to_string(),
            zone: "us-central1-c".to_string(),
            instance_name: "instance-20250323-145124".to_string(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            cpu_window_ms: 1000,
            disk_mount_point: PathBuf::from("/"),
        }
    }
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self { step_pause_ms: 1000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("vm_monitor.log"),
            level: "info".to_string(),
        }
    }
}

impl SamplingConfig {
    pub fn cpu_window(&self) -> Duration {
        Duration::from_millis(self.cpu_window_ms)
    }
}

impl ScalingConfig {
    pub fn step_pause(&self) -> Duration {
        Duration::from_millis(self.step_pause_ms)
    }
}

impl MonitorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn cooldown_period(&self) -> Duration {
        Duration::from_secs(self.cooldown_period_secs)
    }

    /// Load configuration from a TOML file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.to_string_lossy().to_string() })?;

        let config: MonitorConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError { reason: e.to_string() })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides on top of this configuration
    pub fn apply_env(mut self) -> ConfigResult<Self> {
        if let Ok(log_file) = std::env::var("VMSCALE_LOG_FILE") {
            self.logging.file = PathBuf::from(log_file);
        }

        if let Ok(level) = std::env::var("VMSCALE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(mount_point) = std::env::var("VMSCALE_DISK_MOUNT_POINT") {
            self.sampling.disk_mount_point = PathBuf::from(mount_point);
        }

        if let Ok(interval) = std::env::var("VMSCALE_CHECK_INTERVAL_SECS") {
            self.check_interval_secs = interval.parse()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "VMSCALE_CHECK_INTERVAL_SECS".to_string(),
                    value: interval,
                })?;
        }

        Ok(self)
    }

    /// Load configuration from defaults plus environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let config = MonitorConfig::default().apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback order: file -> defaults, then env
    pub fn load_with_fallback<P: AsRef<Path>>(config_path: Option<P>) -> ConfigResult<Self> {
        let Some(path) = config_path else {
            return MonitorConfig::from_env();
        };

        let config = MonitorConfig::from_file(path)?.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 || self.threshold > 100.0 {
            return Err(ConfigError::InvalidValue {
                field: "threshold".to_string(),
                value: self.threshold.to_string(),
            });
        }

        if self.check_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "check_interval_secs".to_string(),
                value: "0".to_string(),
            });
        }

        if self.resources_to_monitor.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "resources_to_monitor must name at least one resource".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for resource in &self.resources_to_monitor {
            if !seen.insert(resource) {
                return Err(ConfigError::InvalidValue {
                    field: "resources_to_monitor".to_string(),
                    value: format!("{} listed twice", resource),
                });
            }
        }

        if self.cloud.instance_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "cloud.instance_name".to_string(),
                value: String::new(),
            });
        }

        if self.sampling.cpu_window_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sampling.cpu_window_ms".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|_| ConfigError::ValidationFailed {
                reason: format!("Unable to create config directory: {}", parent.display()),
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ValidationFailed { reason: e.to_string() })?;

        fs::write(path, content)
            .map_err(|_| ConfigError::PermissionDenied { path: path.to_string_lossy().to_string() })?;

        Ok(())
    }
}

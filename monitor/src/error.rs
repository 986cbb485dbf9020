//! Error handling for the resource monitor
//!
//! Every error that reaches the monitoring loop is terminal: it is logged
//! and the loop ends. There is no retry path.

use thiserror::Error;

use crate::config::ResourceKind;

/// The main error type for the monitor
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The metrics provider could not produce a reading
    #[error("Failed to sample {resource} usage: {reason}")]
    Sampling { resource: ResourceKind, reason: String },

    /// Log file or subscriber setup failed
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Configuration parsing error: {reason}")]
    ParseError { reason: String },

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration file permission denied: {path}")]
    PermissionDenied { path: String },
}

/// A specialized result type for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// A specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl MonitorError {
    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            MonitorError::Sampling { .. } => "sampling",
            MonitorError::Logging(_) => "logging",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        let error = MonitorError::Sampling {
            resource: ResourceKind::Disk,
            reason: "no disk mounted at /".to_string(),
        };
        assert_eq!(error.category(), "sampling");
        assert_eq!(
            error.to_string(),
            "Failed to sample disk usage: no disk mounted at /"
        );

        let error = MonitorError::Logging("subscriber already set".to_string());
        assert_eq!(error.category(), "logging");
    }

    #[test]
    fn test_config_error_messages() {
        let error = ConfigError::InvalidValue {
            field: "threshold".to_string(),
            value: "150".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid configuration value: threshold = 150");
    }
}

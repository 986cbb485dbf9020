//! vmscale resource monitor library
//!
//! Samples CPU, memory and disk utilization on a fixed interval and, when a
//! resource crosses the threshold outside of the cooldown window, runs a
//! simulated scale-out to a cloud instance. The metrics provider and the
//! scaling action are injected, so the decision loop runs unchanged against
//! test doubles.

pub mod config;
pub mod cooldown;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod sampler;
pub mod scaling;

// Re-export commonly used types
pub use config::{CloudTarget, MonitorConfig, ResourceKind};
pub use cooldown::CooldownTimer;
pub use error::{ConfigError, MonitorError, Result};
pub use monitor::{ResourceMonitor, RunSummary, TickReport};
pub use sampler::{SysinfoProvider, UsageProvider, UsageSample};
pub use scaling::{ScalingAction, ScalingStep, SimulatedScaler};

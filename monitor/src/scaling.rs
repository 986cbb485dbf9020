//! Simulated scale-out to a cloud instance
//!
//! Nothing here talks to a cloud provider. The simulation logs the steps a
//! real scale-out would take, pausing between them, and always succeeds.

use std::time::Duration;

use tokio::time::sleep;
use tracing::info;

use crate::config::{CloudTarget, ResourceKind};

/// Capability invoked by the monitor when a threshold is exceeded
pub trait ScalingAction {
    /// Establish the (simulated) provider session before the first tick
    async fn connect(&mut self) -> bool;

    /// Scale out because `resource` was measured at `usage` percent.
    /// Returns whether the action completed.
    async fn scale(&mut self, resource: ResourceKind, usage: f64) -> bool;
}

/// The four steps of a scale-out, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingStep {
    VerifyInstance,
    StartInstance,
    PrepareWorkload,
    MigrateWorkload,
}

impl ScalingStep {
    pub const ALL: [ScalingStep; 4] = [
        ScalingStep::VerifyInstance,
        ScalingStep::StartInstance,
        ScalingStep::PrepareWorkload,
        ScalingStep::MigrateWorkload,
    ];

    pub fn describe(self, provider: &str) -> String {
        match self {
            ScalingStep::VerifyInstance => format!("Verifying {} instance exists", provider),
            ScalingStep::StartInstance => format!("Starting {} instance", provider),
            ScalingStep::PrepareWorkload => "Preparing workload for migration".to_string(),
            ScalingStep::MigrateWorkload => format!("Migrating workload to {} instance", provider),
        }
    }
}

/// Logs a scale-out to `target` without performing it
#[derive(Debug, Clone)]
pub struct SimulatedScaler {
    target: CloudTarget,
    step_pause: Duration,
}

impl SimulatedScaler {
    pub fn new(target: CloudTarget, step_pause: Duration) -> Self {
        Self { target, step_pause }
    }
}

impl ScalingAction for SimulatedScaler {
    async fn connect(&mut self) -> bool {
        info!("Successfully connected to {}", self.target.provider);
        true
    }

    async fn scale(&mut self, resource: ResourceKind, usage: f64) -> bool {
        let provider = &self.target.provider;
        info!(
            "AUTO-SCALING EVENT TRIGGERED by high {} usage: {:.1}%",
            resource.label(),
            usage
        );
        info!(
            "Would connect to {} instance '{}' in zone '{}'",
            provider, self.target.instance_name, self.target.zone
        );
        info!("Simulating auto-scaling process...");

        let total = ScalingStep::ALL.len();
        for (index, step) in ScalingStep::ALL.iter().enumerate() {
            info!(
                "Step {}/{}: {}... [SUCCESS]",
                index + 1,
                total,
                step.describe(provider)
            );
            sleep(self.step_pause).await;
        }

        info!(
            "AUTO-SCALING COMPLETE: Workload successfully migrated to {} instance '{}'",
            provider, self.target.instance_name
        );
        true
    }
}

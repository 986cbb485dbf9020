//! Threshold/cooldown decision loop
//!
//! Each tick takes one usage snapshot, then walks the configured resources
//! in order. The first resource above the threshold triggers a scaling
//! action, provided the cooldown has expired; later resources are not
//! looked at in that tick.

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{MonitorConfig, ResourceKind};
use crate::cooldown::CooldownTimer;
use crate::error::Result;
use crate::sampler::{UsageProvider, UsageSample};
use crate::scaling::ScalingAction;

/// What a single tick observed and did
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub sample: UsageSample,
    pub in_cooldown: bool,
    /// Resource that triggered a completed scaling action, if any
    pub triggered: Option<ResourceKind>,
}

/// Counters for a finished monitoring run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub scaling_events: u64,
}

/// Polls a [`UsageProvider`] and drives a [`ScalingAction`]
pub struct ResourceMonitor<P, S> {
    config: MonitorConfig,
    provider: P,
    scaler: S,
    cooldown: CooldownTimer,
    summary: RunSummary,
}

impl<P, S> ResourceMonitor<P, S>
where
    P: UsageProvider,
    S: ScalingAction,
{
    pub fn new(config: MonitorConfig, provider: P, scaler: S) -> Self {
        let cooldown = CooldownTimer::new(config.cooldown_period());
        Self {
            config,
            provider,
            scaler,
            cooldown,
            summary: RunSummary::default(),
        }
    }

    pub fn cooldown(&self) -> &CooldownTimer {
        &self.cooldown
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn scaler(&self) -> &S {
        &self.scaler
    }

    /// Sample, then evaluate the snapshot at the current time
    pub async fn tick(&mut self) -> Result<TickReport> {
        let sample = self.provider.sample().await?;
        let now = Instant::now();
        Ok(self.evaluate(sample, now).await)
    }

    /// Apply the threshold and cooldown rules to one snapshot taken at `now`
    pub async fn evaluate(&mut self, sample: UsageSample, now: Instant) -> TickReport {
        info!("Current usage: {}", sample);

        let remaining = self.cooldown.remaining(now);
        let in_cooldown = remaining.is_some();
        if let Some(remaining) = remaining {
            info!(
                "In cooldown period, {:.0} seconds remaining",
                remaining.as_secs_f64()
            );
        }

        let mut triggered = None;
        if !in_cooldown {
            for &resource in &self.config.resources_to_monitor {
                let usage = sample.get(resource);
                if usage <= self.config.threshold {
                    continue;
                }

                warn!(
                    "THRESHOLD EXCEEDED: {} usage ({:.1}%) > {}%",
                    resource.label(),
                    usage,
                    self.config.threshold
                );

                if self.scaler.scale(resource, usage).await {
                    self.cooldown.record(now);
                    self.summary.scaling_events += 1;
                    info!(
                        "Entering cooldown period of {} seconds",
                        self.config.cooldown_period_secs
                    );
                    triggered = Some(resource);
                    break;
                }
            }
        }

        self.summary.ticks += 1;
        TickReport {
            sample,
            in_cooldown,
            triggered,
        }
    }

    /// Tick every check interval until `shutdown` fires or a tick fails.
    pub async fn run(&mut self, shutdown: &CancellationToken) -> Result<RunSummary> {
        info!("Starting VM resource monitoring...");
        info!("Monitoring threshold set at {}%", self.config.threshold);

        self.scaler.connect().await;

        loop {
            let tick = tokio::select! {
                _ = shutdown.cancelled() => break,
                tick = self.tick() => tick,
            };

            if let Err(e) = tick {
                error!(category = e.category(), "Error in monitoring: {}", e);
                return Err(e);
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(self.config.check_interval()) => {}
            }
        }

        info!("Monitoring stopped by user");
        Ok(self.summary)
    }
}

//! Test doubles for the monitor's injected capabilities

#![allow(dead_code)]

use std::collections::VecDeque;

use vmscale_monitor::{MonitorError, ResourceKind, ScalingAction, UsageProvider, UsageSample};

/// Replays a fixed script of samples. The last entry repeats forever;
/// `None` entries fail the sample.
pub struct ScriptedProvider {
    script: VecDeque<Option<UsageSample>>,
    last: Option<UsageSample>,
    pub calls: usize,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Option<UsageSample>>) -> Self {
        Self {
            script: script.into(),
            last: None,
            calls: 0,
        }
    }

    pub fn constant(sample: UsageSample) -> Self {
        Self::new(vec![Some(sample)])
    }
}

impl UsageProvider for ScriptedProvider {
    async fn sample(&mut self) -> vmscale_monitor::Result<UsageSample> {
        self.calls += 1;
        let next = match self.script.pop_front() {
            Some(entry) => entry,
            None => self.last,
        };
        match next {
            Some(sample) => {
                self.last = Some(sample);
                Ok(sample)
            }
            None => Err(MonitorError::Sampling {
                resource: ResourceKind::Cpu,
                reason: "scripted failure".to_string(),
            }),
        }
    }
}

/// Records every scaling request instead of simulating it
#[derive(Default)]
pub struct RecordingScaler {
    pub connected: bool,
    pub calls: Vec<(ResourceKind, f64)>,
    /// Resources whose scaling attempts report failure
    pub failing: Vec<ResourceKind>,
}

impl RecordingScaler {
    pub fn failing_on(resources: &[ResourceKind]) -> Self {
        Self {
            failing: resources.to_vec(),
            ..Self::default()
        }
    }
}

impl ScalingAction for RecordingScaler {
    async fn connect(&mut self) -> bool {
        self.connected = true;
        true
    }

    async fn scale(&mut self, resource: ResourceKind, usage: f64) -> bool {
        self.calls.push((resource, usage));
        !self.failing.contains(&resource)
    }
}

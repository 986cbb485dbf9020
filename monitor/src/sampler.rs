//! Usage sampling
//!
//! A [`UsageProvider`] returns one fresh CPU/memory/disk snapshot per call.
//! Nothing is cached or smoothed between calls.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use sysinfo::System;
use tokio::time::sleep;

#[cfg(unix)]
use nix::sys::statvfs::statvfs;

use crate::config::{ResourceKind, SamplingConfig};
use crate::error::{MonitorError, Result};

/// One utilization snapshot, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageSample {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

impl UsageSample {
    pub fn new(cpu: f64, memory: f64, disk: f64) -> Self {
        Self { cpu, memory, disk }
    }

    pub fn get(&self, resource: ResourceKind) -> f64 {
        match resource {
            ResourceKind::Cpu => self.cpu,
            ResourceKind::Memory => self.memory,
            ResourceKind::Disk => self.disk,
        }
    }
}

impl fmt::Display for UsageSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CPU: {:.1}%, Memory: {:.1}%, Disk: {:.1}%",
            self.cpu, self.memory, self.disk
        )
    }
}

/// Source of usage snapshots
pub trait UsageProvider {
    /// Measure current usage. May block for the CPU sampling window.
    async fn sample(&mut self) -> Result<UsageSample>;
}

/// Reads usage from the local host through `sysinfo`, and `statvfs` for disks
pub struct SysinfoProvider {
    system: System,
    #[cfg(not(unix))]
    disks: sysinfo::Disks,
    mount_point: PathBuf,
    cpu_window: Duration,
}

impl SysinfoProvider {
    pub fn new(config: &SamplingConfig) -> Self {
        Self {
            system: System::new(),
            #[cfg(not(unix))]
            disks: sysinfo::Disks::new_with_refreshed_list(),
            mount_point: config.disk_mount_point.clone(),
            cpu_window: config.cpu_window().max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }

    async fn cpu_percent(&mut self) -> f64 {
        // CPU usage is a delta between two refreshes.
        self.system.refresh_cpu();
        sleep(self.cpu_window).await;
        self.system.refresh_cpu();
        f64::from(self.system.global_cpu_info().cpu_usage())
    }

    fn memory_percent(&mut self) -> Result<f64> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return Err(MonitorError::Sampling {
                resource: ResourceKind::Memory,
                reason: "total memory reported as zero".to_string(),
            });
        }
        let used = total.saturating_sub(self.system.available_memory());
        Ok(percent(used, total))
    }

    /// `used / (used + available)`, leaving blocks reserved for root out of
    /// the total the way `df` does.
    #[cfg(unix)]
    fn disk_percent(&mut self) -> Result<f64> {
        let stats = statvfs(&self.mount_point).map_err(|e| MonitorError::Sampling {
            resource: ResourceKind::Disk,
            reason: format!("cannot stat {}: {}", self.mount_point.display(), e),
        })?;

        let fragment = stats.fragment_size() as u64;
        let blocks = stats.blocks() as u64;
        let used = blocks.saturating_sub(stats.blocks_free() as u64) * fragment;
        let available = stats.blocks_available() as u64 * fragment;
        self.disk_usage(used, available)
    }

    #[cfg(not(unix))]
    fn disk_percent(&mut self) -> Result<f64> {
        self.disks.refresh_list();
        let disk = self
            .disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == self.mount_point)
            .ok_or_else(|| MonitorError::Sampling {
                resource: ResourceKind::Disk,
                reason: format!("no disk mounted at {}", self.mount_point.display()),
            })?;

        let used = disk.total_space().saturating_sub(disk.available_space());
        self.disk_usage(used, disk.available_space())
    }

    fn disk_usage(&self, used: u64, available: u64) -> Result<f64> {
        disk_usage_percent(used, available).ok_or_else(|| MonitorError::Sampling {
            resource: ResourceKind::Disk,
            reason: format!("{} reports zero capacity", self.mount_point.display()),
        })
    }
}

impl UsageProvider for SysinfoProvider {
    async fn sample(&mut self) -> Result<UsageSample> {
        let cpu = round_tenth(self.cpu_percent().await);
        let memory = round_tenth(self.memory_percent()?);
        let disk = round_tenth(self.disk_percent()?);
        Ok(UsageSample { cpu, memory, disk })
    }
}

fn percent(used: u64, total: u64) -> f64 {
    used as f64 / total as f64 * 100.0
}

fn disk_usage_percent(used: u64, available: u64) -> Option<f64> {
    let usable = used.checked_add(available)?;
    if usable == 0 {
        return None;
    }
    Some(percent(used, usable))
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

//! vmscale load generator library
//!
//! Drives CPU and memory utilization up for a fixed wall-clock duration so
//! that a resource monitor on the same host has something to react to.
//! The CPU driver runs busy-loop OS threads; the memory driver allocates
//! and touches fixed-size chunks until a share of physical memory is held.

pub mod cpu;
pub mod error;
pub mod memory;

use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

pub use cpu::{CpuLoadPlan, CpuLoadReport};
pub use error::{LoadError, Result};
pub use memory::{MemoryBallast, MemoryLoadPlan, MemoryLoadReport};

/// Target utilization percentage, always within 1..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intensity(u8);

impl Intensity {
    pub fn new(percent: u8) -> Result<Self> {
        if (1..=100).contains(&percent) {
            Ok(Self(percent))
        } else {
            Err(LoadError::InvalidIntensity(percent))
        }
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// `floor(amount * percent / 100)`
    pub fn scale(self, amount: u64) -> u64 {
        (u128::from(amount) * u128::from(self.0) / 100) as u64
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Longest run the drivers will schedule. Longer durations are clamped so
/// that `now + duration` cannot overflow the clock.
pub const MAX_RUN_DURATION: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

pub(crate) fn clamp_duration(duration: Duration) -> Duration {
    duration.min(MAX_RUN_DURATION)
}

/// Which drivers a run exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadType {
    Cpu,
    Memory,
    All,
}

impl LoadType {
    pub fn includes_cpu(self) -> bool {
        matches!(self, LoadType::Cpu | LoadType::All)
    }

    pub fn includes_memory(self) -> bool {
        matches!(self, LoadType::Memory | LoadType::All)
    }
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadType::Cpu => write!(f, "cpu"),
            LoadType::Memory => write!(f, "memory"),
            LoadType::All => write!(f, "all"),
        }
    }
}

/// A single load generation run
#[derive(Debug, Clone, Copy)]
pub struct LoadRequest {
    pub load_type: LoadType,
    pub intensity: Intensity,
    pub duration: Duration,
}

/// What a run actually did
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub cpu: Option<CpuLoadReport>,
    pub memory: Option<MemoryLoadReport>,
    pub interrupted: bool,
}

/// Run the requested drivers in order: CPU first, then memory.
///
/// Cancelling `cancel` stops the current phase at its next checkpoint and
/// skips any phase that has not started yet.
pub async fn run_load(request: &LoadRequest, cancel: &CancellationToken) -> Result<LoadSummary> {
    let mut summary = LoadSummary::default();

    if request.load_type.includes_cpu() && !cancel.is_cancelled() {
        let plan = CpuLoadPlan::detect(request.intensity, request.duration);
        let token = cancel.clone();
        let report =
            tokio::task::spawn_blocking(move || cpu::generate_cpu_load(&plan, &token)).await??;
        summary.interrupted |= report.interrupted;
        summary.cpu = Some(report);
    }

    if request.load_type.includes_memory() && !cancel.is_cancelled() {
        let plan = MemoryLoadPlan::detect(request.intensity, request.duration)?;
        let report = memory::generate_memory_load(&plan, cancel).await?;
        summary.interrupted |= report.interrupted;
        summary.memory = Some(report);
    }

    summary.interrupted |= cancel.is_cancelled();
    if !summary.interrupted {
        info!(load_type = %request.load_type, "All requested load phases finished");
    }
    Ok(summary)
}

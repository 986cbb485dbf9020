//! Memory load driver
//!
//! Allocates fixed-size chunks until a share of physical memory is held,
//! holds it for the rest of the duration, then releases everything. The
//! allocation lives in a [`MemoryBallast`] so it is released on every exit
//! path, including cancellation and early returns.

use std::time::Duration;

use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{LoadError, Result};
use crate::{clamp_duration, Intensity};

/// Size of each allocation step
pub const CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Distance between touched bytes. Assumes 4 KiB pages; larger pages still
/// get committed, smaller ones may not be.
pub const TOUCH_STRIDE: usize = 4096;

/// Pause after each allocated chunk
pub const CHUNK_PAUSE: Duration = Duration::from_millis(500);

const MIB: f64 = 1024.0 * 1024.0;

/// Sizing for a memory load run
#[derive(Debug, Clone)]
pub struct MemoryLoadPlan {
    total_memory: u64,
    intensity: Intensity,
    duration: Duration,
    chunk_size: usize,
    chunk_pause: Duration,
}

impl MemoryLoadPlan {
    pub fn new(total_memory: u64, intensity: Intensity, duration: Duration) -> Self {
        Self {
            total_memory,
            intensity,
            duration,
            chunk_size: CHUNK_SIZE,
            chunk_pause: CHUNK_PAUSE,
        }
    }

    /// Plan against the physical memory reported by the OS
    pub fn detect(intensity: Intensity, duration: Duration) -> Result<Self> {
        let mut system = sysinfo::System::new();
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return Err(LoadError::MemoryUnavailable);
        }
        Ok(Self::new(total, intensity, duration))
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_chunk_pause(mut self, chunk_pause: Duration) -> Self {
        self.chunk_pause = chunk_pause;
        self
    }

    /// `floor(total_memory * intensity / 100)`
    pub fn target_bytes(&self) -> u64 {
        self.intensity.scale(self.total_memory)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Outcome of a memory load run
#[derive(Debug, Clone)]
pub struct MemoryLoadReport {
    pub target_bytes: u64,
    pub peak_allocated_bytes: u64,
    pub chunks: usize,
    /// Bytes still held when the driver returned
    pub retained_bytes: u64,
    pub interrupted: bool,
}

/// Owned chunks of touched memory, released on drop
#[derive(Debug, Default)]
pub struct MemoryBallast {
    buffers: Vec<Vec<u8>>,
    allocated: u64,
    released: bool,
}

impl MemoryBallast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate one chunk of `len` bytes and write a byte into every page.
    /// A refused allocation leaves the chunks already held untouched.
    pub fn push_chunk(&mut self, len: usize) -> Result<()> {
        let mut chunk = Vec::new();
        chunk
            .try_reserve_exact(len)
            .map_err(|_| LoadError::Allocation { bytes: len })?;
        self.buffers
            .try_reserve(1)
            .map_err(|_| LoadError::Allocation { bytes: len })?;

        chunk.resize(len, 0u8);
        for offset in (0..len).step_by(TOUCH_STRIDE) {
            chunk[offset] = 1;
        }
        self.allocated += len as u64;
        self.buffers.push(chunk);
        self.released = false;
        Ok(())
    }

    pub fn allocated_bytes(&self) -> u64 {
        self.allocated
    }

    pub fn chunk_count(&self) -> usize {
        self.buffers.len()
    }

    /// Drop every chunk. Returns the number of bytes freed.
    pub fn release(&mut self) -> u64 {
        if !self.released {
            info!("Releasing allocated memory...");
        }
        let freed = self.allocated;
        self.buffers.clear();
        self.buffers.shrink_to_fit();
        self.allocated = 0;
        self.released = true;
        freed
    }
}

impl Drop for MemoryBallast {
    fn drop(&mut self) {
        if self.allocated > 0 {
            self.release();
        }
    }
}

/// Allocate up to the plan's target, hold it until the deadline, release.
pub async fn generate_memory_load(
    plan: &MemoryLoadPlan,
    cancel: &CancellationToken,
) -> Result<MemoryLoadReport> {
    let target = plan.target_bytes();
    info!(
        "Generating memory load at {} intensity for {} seconds...",
        plan.intensity,
        plan.duration.as_secs()
    );

    let deadline = Instant::now() + clamp_duration(plan.duration);
    let mut ballast = MemoryBallast::new();
    let mut interrupted = cancel.is_cancelled();

    while !interrupted && Instant::now() < deadline && ballast.allocated_bytes() < target {
        let remaining = target - ballast.allocated_bytes();
        let len = remaining.min(plan.chunk_size as u64) as usize;
        // On failure the ballast is dropped here, which releases it.
        ballast.push_chunk(len)?;
        info!(
            "Allocated {:.2} MB of {:.2} MB",
            ballast.allocated_bytes() as f64 / MIB,
            target as f64 / MIB
        );

        tokio::select! {
            _ = cancel.cancelled() => interrupted = true,
            _ = sleep(plan.chunk_pause) => {}
        }
    }

    if !interrupted {
        info!("Memory allocated. Holding for remainder of duration...");
        // Skipped when the allocation phase already ran past the deadline.
        if Instant::now() < deadline {
            tokio::select! {
                _ = cancel.cancelled() => interrupted = true,
                _ = sleep_until(deadline) => {}
            }
        }
    }

    let peak_allocated_bytes = ballast.allocated_bytes();
    let chunks = ballast.chunk_count();
    ballast.release();

    if !interrupted {
        info!("Memory load generation completed");
    }

    Ok(MemoryLoadReport {
        target_bytes: target,
        peak_allocated_bytes,
        chunks,
        retained_bytes: ballast.allocated_bytes(),
        interrupted,
    })
}

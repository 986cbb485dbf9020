//! CPU load driver
//!
//! Spawns one busy-loop OS thread per share of the available processing
//! units. Each worker runs fixed-size batches of multiplications until the
//! deadline, so a run can overshoot its duration by up to one batch.

use std::hint::black_box;
use std::thread;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{LoadError, Result};
use crate::{clamp_duration, Intensity};

/// Multiplications per batch; the deadline and cancellation are only
/// checked between batches.
pub const BATCH_ITERATIONS: u64 = 10_000_000;

/// Sizing for a CPU load run
#[derive(Debug, Clone, Copy)]
pub struct CpuLoadPlan {
    available_units: usize,
    intensity: Intensity,
    duration: Duration,
}

impl CpuLoadPlan {
    pub fn new(available_units: usize, intensity: Intensity, duration: Duration) -> Self {
        Self {
            available_units,
            intensity,
            duration,
        }
    }

    /// Plan against the logical CPUs of this host
    pub fn detect(intensity: Intensity, duration: Duration) -> Self {
        Self::new(num_cpus::get(), intensity, duration)
    }

    /// `max(1, floor(available_units * intensity / 100))`
    pub fn worker_count(&self) -> usize {
        let scaled = self.intensity.scale(self.available_units as u64) as usize;
        scaled.max(1)
    }

    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Outcome of a CPU load run
#[derive(Debug, Clone)]
pub struct CpuLoadReport {
    pub workers: usize,
    pub batches: u64,
    pub elapsed: Duration,
    pub interrupted: bool,
}

/// Run the CPU load to completion, blocking the calling thread until every
/// worker has been joined.
pub fn generate_cpu_load(plan: &CpuLoadPlan, cancel: &CancellationToken) -> Result<CpuLoadReport> {
    let workers = plan.worker_count();
    info!(
        "Generating CPU load at {} intensity for {} seconds...",
        plan.intensity,
        plan.duration.as_secs()
    );
    debug!(workers, available_units = plan.available_units, "Spawning CPU workers");

    let started = Instant::now();
    let deadline = started + clamp_duration(plan.duration);
    // Lets a failed spawn stop the workers that did start.
    let stop = cancel.child_token();

    let mut handles = Vec::with_capacity(workers);
    for index in 0..workers {
        let token = stop.clone();
        let spawned = thread::Builder::new()
            .name(format!("cpu-load-{index}"))
            .spawn(move || burn_until(deadline, &token));

        match spawned {
            Ok(handle) => handles.push(handle),
            Err(source) => {
                stop.cancel();
                return Err(LoadError::WorkerSpawn { index, source });
            }
        }
    }

    let mut batches = 0;
    let mut panicked = None;
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(count) => batches += count,
            Err(_) => {
                panicked.get_or_insert(index);
            }
        }
    }
    if let Some(index) = panicked {
        return Err(LoadError::WorkerPanicked { index });
    }

    let interrupted = cancel.is_cancelled();
    if !interrupted {
        info!("CPU load generation completed");
    }

    Ok(CpuLoadReport {
        workers,
        batches,
        elapsed: started.elapsed(),
        interrupted,
    })
}

/// Busy-loop body of a single worker. Returns the number of batches run.
fn burn_until(deadline: Instant, cancel: &CancellationToken) -> u64 {
    let mut batches = 0;
    while Instant::now() < deadline && !cancel.is_cancelled() {
        for i in 0..BATCH_ITERATIONS {
            black_box(i.wrapping_mul(i));
        }
        batches += 1;
    }
    batches
}

//! Error handling for the load generator
//!
//! Every failure the drivers can hit is terminal for the run: the binary
//! prints it and exits, nothing is retried.

use std::io;

use thiserror::Error;

/// The main error type for load generation
#[derive(Error, Debug)]
pub enum LoadError {
    /// Intensity outside of 1..=100
    #[error("Invalid intensity: {0} (expected 1-100)")]
    InvalidIntensity(u8),

    /// The OS refused to start a CPU worker thread
    #[error("Failed to spawn CPU worker {index}: {source}")]
    WorkerSpawn {
        index: usize,
        #[source]
        source: io::Error,
    },

    /// A CPU worker thread panicked before reaching its deadline
    #[error("CPU worker {index} panicked")]
    WorkerPanicked { index: usize },

    /// The allocator refused a memory chunk
    #[error("Failed to allocate {bytes} bytes")]
    Allocation { bytes: usize },

    /// The metrics provider reported no physical memory
    #[error("Unable to determine total system memory")]
    MemoryUnavailable,

    /// A blocking task could not be joined
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl LoadError {
    /// Short label used in log fields
    pub fn category(&self) -> &'static str {
        match self {
            LoadError::InvalidIntensity(_) => "input",
            LoadError::WorkerSpawn { .. } | LoadError::WorkerPanicked { .. } => "cpu",
            LoadError::Allocation { .. } | LoadError::MemoryUnavailable => "memory",
            LoadError::Join(_) => "runtime",
        }
    }
}

/// A specialized result type for load generation
pub type Result<T> = std::result::Result<T, LoadError>;

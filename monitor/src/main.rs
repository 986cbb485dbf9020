//! resource-monitor entry point
//!
//! Watches local resource usage and logs a simulated scale-out whenever a
//! resource stays above the threshold outside of the cooldown window.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use vmscale_monitor::{logging, MonitorConfig, ResourceMonitor, SimulatedScaler, SysinfoProvider};

/// VM resource monitor with simulated cloud auto-scaling
#[derive(Parser)]
#[command(name = "resource-monitor")]
#[command(about = "VM resource monitor with simulated cloud auto-scaling")]
#[command(version)]
struct Cli {
    /// Configuration file path (TOML); the built-in table is used otherwise
    #[arg(short, long, env = "VMSCALE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log file (overrides the configuration file)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match MonitorConfig::load_with_fallback(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let level = cli.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    let log_file = cli.log_file.clone().unwrap_or_else(|| config.logging.file.clone());
    let guard = match logging::init(&level, &log_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    let provider = SysinfoProvider::new(&config.sampling);
    let scaler = SimulatedScaler::new(config.cloud.clone(), config.scaling.step_pause());
    let mut monitor = ResourceMonitor::new(config, provider, scaler);

    let shutdown = CancellationToken::new();
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => interrupt.cancel(),
            Err(e) => warn!("Unable to listen for interrupt signal: {}", e),
        }
    });

    let result = monitor.run(&shutdown).await;

    // Flush the log file before exiting.
    drop(guard);
    if result.is_err() {
        process::exit(1);
    }
}

//! load-generator entry point
//!
//! Generates CPU and/or memory load on the local host for a fixed duration.

use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vmscale_loadgen::{run_load, Intensity, LoadRequest, LoadType};

/// Generate system load for testing auto-scaling
#[derive(Parser)]
#[command(name = "load-generator")]
#[command(about = "Generate system load for testing auto-scaling")]
#[command(version)]
struct Cli {
    /// Type of load to generate
    #[arg(long = "type", value_enum, default_value = "cpu")]
    load_type: LoadTypeArg,

    /// Duration in seconds to generate load
    #[arg(long, default_value_t = 60)]
    duration: u64,

    /// Load intensity percentage (1-100)
    #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u8).range(1..=100))]
    intensity: u8,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LoadTypeArg {
    Cpu,
    Memory,
    All,
}

impl From<LoadTypeArg> for LoadType {
    fn from(arg: LoadTypeArg) -> Self {
        match arg {
            LoadTypeArg::Cpu => LoadType::Cpu,
            LoadTypeArg::Memory => LoadType::Memory,
            LoadTypeArg::All => LoadType::All,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = initialize_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let load_type = LoadType::from(cli.load_type);
    info!(
        "Starting load generator with {} load at {}% intensity for {} seconds",
        load_type, cli.intensity, cli.duration
    );

    // Errors are reported, not turned into exit codes.
    if let Err(e) = run(&cli, load_type).await {
        error!(category = e.category(), "Error generating load: {}", e);
    }
}

async fn run(cli: &Cli, load_type: LoadType) -> vmscale_loadgen::Result<()> {
    let request = LoadRequest {
        load_type,
        intensity: Intensity::new(cli.intensity)?,
        duration: Duration::from_secs(cli.duration),
    };

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => interrupt.cancel(),
            Err(e) => warn!("Unable to listen for interrupt signal: {}", e),
        }
    });

    let summary = run_load(&request, &cancel).await?;
    if summary.interrupted {
        info!("Load generation stopped by user");
    } else {
        info!("Load generation completed");
    }
    Ok(())
}

/// Initialize logging based on command line flags
fn initialize_logging(cli: &Cli) -> anyhow::Result<()> {
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("vmscale_loadgen={}", log_level).parse()?)
        .add_directive(format!("load_generator={}", log_level).parse()?);

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }

    Ok(())
}

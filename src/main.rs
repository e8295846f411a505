//! Server supervisor.
//!
//! Runs the status listener and any configured health probes under the
//! lifecycle supervisor until a termination signal or a server failure.
//!
//! # Architecture Overview
//!
//! ```text
//!     SIGINT / SIGTERM / SIGQUIT         server exits (ok or error)
//!              │                                  │
//!              ▼                                  ▼
//!     ┌─────────────────────────────────────────────────────┐
//!     │           StopCoordinator (fires exactly once)        │
//!     └──────────────────────────┬──────────────────────────┘
//!                                │ broadcast
//!                                ▼
//!     ┌─────────────────────────────────────────────────────┐
//!     │     Supervisor: shutdown() every server concurrently  │
//!     │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐   │
//!     │  │ status HTTP │  │  server B   │  │  server C   │   │
//!     │  │ /health     │  │             │  │             │   │
//!     │  │ /metrics    │  │             │  │             │   │
//!     │  └──────┬──────┘  └─────────────┘  └─────────────┘   │
//!     └─────────┼───────────────────────────────────────────┘
//!               ▼
//!     HealthAggregator → probes → JSON snapshot (200 / 503)
//! ```

use std::path::PathBuf;

use clap::Parser;

use server_supervisor::config::validation::validate_config;
use server_supervisor::config::{load_config, ConfigError, Mode};
use server_supervisor::lifecycle::Service;
use server_supervisor::observability::init_logging;

#[derive(Parser, Debug)]
#[command(name = "server-supervisor")]
#[command(about = "Supervise servers and serve aggregated health", long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Deployment mode (local, dev, stage, prod); overrides config and env.
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(level) = args.log_level {
        config.observability.log_level = level;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    if args.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    init_logging(config.mode, &config.observability.log_level)?;

    tracing::info!("server-supervisor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        mode = %config.mode,
        status_enabled = config.status.enabled,
        bind_address = %config.status.bind_address,
        shutdown_timeout_secs = ?config.shutdown.timeout_secs,
        probes = config.health.probes.len(),
        "Configuration loaded"
    );

    let report = Service::new(config).run(Vec::new()).await?;

    tracing::info!(
        cause = %report.cause,
        failures = report.failures.len(),
        timed_out = report.timed_out.len(),
        "Shutdown complete"
    );

    std::process::exit(report.exit_code());
}

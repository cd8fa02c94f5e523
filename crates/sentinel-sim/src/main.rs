//! # Sentinel
//!
//! Headless host for Project Sentinel agents.
//!
//! Loads a `SimConfig` (path from the first argument, default
//! `sentinel.toml`), runs the demo arena for the configured duration and
//! prints a JSON summary on stdout. Logs go to stderr; filter them with
//! `RUST_LOG`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sentinel_sim::{SimConfig, Simulation, CONFIG_FILE};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("sentinel=info".parse()?))
        .init();

    info!("Sentinel starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let config = SimConfig::load_from(&path);
    config
        .validate()
        .with_context(|| format!("invalid configuration in {}", path.display()))?;

    let summary = Simulation::new(config).run();
    println!("{}", serde_json::to_string_pretty(&summary)?);

    info!("Sentinel shutdown complete");
    Ok(())
}

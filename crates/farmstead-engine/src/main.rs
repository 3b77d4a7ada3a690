//! # Farmstead
//!
//! Headless farm simulation. Reads commands from stdin, one per line, and
//! prints results to stdout. Logs go to stderr.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use farmstead_engine::{app, EngineConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("farmstead=info".parse()?))
        .init();

    info!("Farmstead starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };
    config.validate();

    app::run(&config)?;

    info!("Farmstead shutdown complete");
    Ok(())
}

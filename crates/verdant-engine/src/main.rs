//! # Verdant Engine
//!
//! Headless runner for the Verdant farm simulation.
//!
//! This binary ties together:
//! - Configuration from `verdant.toml`
//! - The farm session from `verdant-gameplay`
//! - Save files and background auto-save

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod autosave;
mod config;
mod save_manager;
mod timing;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EngineConfig;

/// Main entry point. The first argument, if any, is the config file path.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("verdant=info".parse()?))
        .init();

    info!("Verdant starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = EngineConfig::load(config_path.as_deref());

    app::run(config)?;

    info!("Verdant shutdown complete");
    Ok(())
}

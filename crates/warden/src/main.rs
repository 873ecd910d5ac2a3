//! Warden - supervisor PIN sessions
//!
//! Main entry point for the Warden CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{hash_pin, start};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Warden - supervisor PIN sessions
#[derive(Parser)]
#[command(name = "warden")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to config file (overrides default discovery)
    #[arg(long, global = true, env = "WARDEN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the Warden server
    Start(start::StartArgs),

    /// Hash a PIN for the config file
    HashPin(hash_pin::HashPinArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config is loaded first so the [logging] section can shape the subscriber
    let loaded = match cli.config {
        Some(ref path) => warden_config::LoadedConfig::from_file(path)?,
        None => warden_config::load_config(None)?,
    };
    let logging = loaded.config.logging_or_default();

    // Initialize tracing: console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "warden=debug,warden_server=debug,warden_session=debug,warden_config=debug,tower_http=debug,info"
    } else {
        "warden=info,warden_server=info,warden_session=info,warn"
    };

    let (file_layer, _guard) = if logging.file {
        let log_dir = logging
            .dir
            .clone()
            .or_else(|| warden_config::xdg_config_dir().map(|d| d.join("logs")))
            .unwrap_or_else(|| PathBuf::from("logs"));
        let file_appender = tracing_appender::rolling::daily(&log_dir, "warden.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (Some(non_blocking), Some(guard))
    } else {
        (None, None)
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(file_layer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "warden=trace,warden_server=trace,warden_session=trace,warden_config=trace,info",
                ))
        }))
        .init();

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        loaded,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::HashPin(args) => hash_pin::run(args, &ctx),
    }
}

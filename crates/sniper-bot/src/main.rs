//! Listing sniper - Entry Point
//!
//! Runs one listing from a JSON record and exits with 0 on `NoBuy` or
//! `BoughtAndListed`, 1 on `Failed` or any setup error.

use anyhow::{Context, Result};
use clap::Parser;
use sniper_core::ListingSpec;
use tracing::{error, info};

/// MEXC new-listing sniper
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Listing record (JSON) written by the listing scheduler
    #[arg(short, long, default_value = "current_listing.json")]
    listing: String,

    /// Configuration file path (can also be set via SNIPER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// JSON run report destination (overrides the config)
    #[arg(short, long)]
    report: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before any TLS connection
    sniper_ws::init_crypto();

    let args = Args::parse();

    sniper_telemetry::init_logging()?;

    info!("Starting listing sniper v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > SNIPER_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("SNIPER_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = sniper_bot::AppConfig::load_or_default(&config_path)?;
    info!(rest_url = %config.rest_url, ws_url = %config.ws_url, "Configuration loaded");

    let listing = ListingSpec::from_file(&args.listing)
        .with_context(|| format!("Failed to load listing from {}", args.listing))?;
    info!(
        listing_id = ?listing.id,
        symbol = %listing.symbol,
        listing_time = %listing.listing_time,
        "Listing loaded"
    );

    let mut app = sniper_bot::Application::new(config, listing)?;
    if let Some(path) = args.report {
        app = app.with_report_path(path);
    }

    let outcome = app.run().await?;
    let code = outcome.exit_code();
    if code != 0 {
        error!(outcome = outcome.label(), "Run ended without a clean outcome");
        std::process::exit(code);
    }

    Ok(())
}

//! Inventory Sync - Main entry point
//!
//! Runs one synchronization pass from the backup catalog into the inventory
//! and exits. The exit status is non-zero if any error was reported.

use anyhow::{bail, Context, Result};
use clap::Parser;
use inventory_sync::config::{Config, DEFAULT_CONFIG_PATH, EXAMPLE_FILENAME};
use inventory_sync::inventory::IdbClient;
use inventory_sync::{utils, Pipeline, PipelineOptions};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Write an example config to ./inventory-sync.toml.example and exit
    #[arg(long)]
    example: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.example {
        Config::example().write(&PathBuf::from(EXAMPLE_FILENAME))?;
        println!("Example configuration written to {}", EXAMPLE_FILENAME);
        return Ok(());
    }

    let _ = dotenvy::dotenv();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(config.log_level());
    utils::logger::init(log_level, config.debug)?;

    tracing::info!(
        "Starting inventory-sync v{} (create_missing: {})",
        env!("CARGO_PKG_VERSION"),
        config.sync.create_missing
    );

    // Connect to the backup catalog
    let store = backup_catalog::connect(&config.catalog.url)
        .await
        .context("backup catalog unavailable")?;

    // Inventory client
    let inventory = IdbClient::new(&config.inventory)?;
    if let Err(e) = inventory.check_connection().await {
        store.close().await;
        return Err(e).context("inventory unreachable");
    }
    tracing::info!("Inventory: {}", config.inventory.url);

    let pipeline = Pipeline::new(
        store.clone(),
        Arc::new(inventory),
        PipelineOptions::from_config(&config),
    );
    let report = pipeline.run().await;

    store.close().await;

    if !report.is_clean() {
        bail!("synchronization finished with {} error(s)", report.errors);
    }

    tracing::info!("Synchronization complete");
    Ok(())
}

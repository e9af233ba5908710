//! rustbibcache - virtual-issue metadata cache builder
//!
//! Reads `items.csv` from the working directory, resolves every reference
//! and writes `items.cache.json` next to it.
//!
//! ## Usage
//!
//! ```bash
//! cd docs/virtual-issue && rustbibcache
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use rustbibcache::config::{CacheConfig, DEFAULT_INPUT, DEFAULT_OUTPUT};
use rustbibcache::pipeline;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Build the bibliographic metadata cache for the virtual-issue pages
#[derive(Parser)]
#[command(name = "rustbibcache")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Input table
    #[arg(long, default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Output cache file
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    let config = CacheConfig {
        input: cli.input,
        output: cli.output,
        ..Default::default()
    };

    let written = pipeline::build_cache(&config)
        .await
        .with_context(|| format!("Failed to build cache from {}", config.input.display()))?;

    info!(items = written, "Done");
    println!("wrote {} items: {}", config.output.display(), written);
    Ok(())
}

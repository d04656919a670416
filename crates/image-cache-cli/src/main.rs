//! Image cache CLI
//!
//! Loads remote images through the 24h image cache, backed by a file store
//! on local disk, and prints where the display state machine settled.

mod commands;
mod config;
mod error;
mod report;

use crate::config::load_config;
use crate::error::Result;
use clap::{Parser, Subcommand};
use image_cache::{global, CacheManager, HttpFetcher};
use kv_store::FileStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "image-cache", version, about = "Load images through a 24h local cache")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load an image and print the final display state
    Load {
        url: String,
        /// Shown as-is when the image cannot be fetched
        #[arg(long)]
        fallback: Option<String>,
        #[arg(long, default_value = "")]
        alt: String,
        /// Write the loaded image bytes to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Check whether an image has a fresh cache entry
    Lookup { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout is reserved for reports
    let env_filter =
        EnvFilter::from_default_env().add_directive("image_cache_cli=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    let cli = Cli::parse();

    // Load configuration from environment
    let config = load_config()?;
    info!("Cache dir: {:?}", config.cache_dir);
    info!("Store quota: {} KB", config.store_quota_bytes / 1024);
    info!("Cache TTL: {} seconds", config.cache_ttl_secs);

    let store = FileStore::new(config.cache_dir.clone(), config.store_quota_bytes);
    store.init().await?;

    let manager = global::init(CacheManager::new(
        Arc::new(store),
        Arc::new(HttpFetcher::new()),
        config.cache_config(),
    ))?;

    let output = match cli.command {
        Command::Load {
            url,
            fallback,
            alt,
            output,
        } => {
            let report =
                commands::load(manager, &url, fallback, &alt, output.as_deref()).await?;
            serde_json::to_string_pretty(&report)?
        }
        Command::Lookup { url } => {
            let report = commands::lookup(manager, &url).await;
            serde_json::to_string_pretty(&report)?
        }
    };

    println!("{}", output);
    Ok(())
}

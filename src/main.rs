//! Insight server
//!
//! Binary entry point: loads configuration, opens the dataset store, and
//! serves the REST API.

use clap::Parser;
use insight::api::{serve, ApiConfig, AppState};
use insight::config::Config;
use insight::dataset::DatasetStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "insight", version, about = "Dataset query service")]
struct Args {
    /// Path to a TOML config file (default locations searched otherwise)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the API port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(port) = args.port {
        config.api.port = port;
    }

    init_logging(&config);

    tracing::info!("Insight v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", config.storage.data_dir);

    let store = Arc::new(DatasetStore::open(&config.storage.data_dir).await?);
    let datasets = store.list().await;
    tracing::info!("Loaded {} dataset(s) from disk", datasets.len());

    let api_config = ApiConfig {
        host: config.api.host.clone(),
        port: config.api.port,
        max_body_size: config.api.max_body_size,
    };
    let state = AppState::new(store, api_config.clone());
    serve(state, &api_config).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("insight={}", config.logging.level)),
    );

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

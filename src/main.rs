//! Playlist curation service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ request id → trace → timeout → CORS → access policy
//!                                                              │
//!                                                              ▼
//!                                                     ┌────────────────┐
//!                                                     │    handlers    │
//!                                                     └───────┬────────┘
//!                                                             ▼
//!                                                     ┌────────────────┐
//!                                                     │PlaylistService │
//!                                                     └───────┬────────┘
//!                                                             ▼
//!                                                     ┌────────────────┐
//!                                                     │  SqliteStore   │
//!                                                     └────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use playlist_curation::config::{load_config, AppConfig};
use playlist_curation::http::HttpServer;
use playlist_curation::lifecycle::{wait_for_shutdown_signal, Shutdown};
use playlist_curation::observability::{logging, metrics};
use playlist_curation::playlist::{PlaylistService, SqliteStore};

#[derive(Parser)]
#[command(name = "playlist-curation")]
#[command(about = "Playlist curation and tag-based recommendation service", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "CURATION_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "playlist-curation starting");

    match &args.config {
        Some(path) => tracing::info!(path = %path.display(), "Configuration loaded"),
        None => tracing::info!("No configuration file given, using defaults"),
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = SqliteStore::connect(&config.database).await?;
    let service = PlaylistService::new(Arc::new(store.clone()));

    let server = HttpServer::new(config, service)?;
    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    store.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

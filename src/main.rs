//! Podcatcher gateway (v1)
//!
//! A small gateway for the podcatcher web client, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                PODSYNC GATEWAY                 │
//!                    │                                                │
//!   GET /filesystem  │  ┌──────────┐   ┌─────────┐   ┌────────────┐  │
//!   GET /proxy ──────┼─▶│   http   │──▶│  proxy  │──▶│  upstream  │──┼──▶ Feed host
//!                    │  │  server  │   │ handler │   │  (reqwest) │  │
//!                    │  └──────────┘   └─────────┘   └────────────┘  │
//!                    │        │                                      │
//!   GET|POST|PUT     │        │        ┌─────────┐   ┌────────────┐  │
//!   /sync ───────────┼────────┴───────▶│  sync   │──▶│   store    │  │
//!                    │                 │ handler │   │  (SQLite)  │  │
//!                    │                 └─────────┘   └────────────┘  │
//!                    │                                                │
//!                    │  config · observability · lifecycle · errors   │
//!                    └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use podsync_gateway::config::loader::load_config;
use podsync_gateway::lifecycle::{signals, Shutdown};
use podsync_gateway::observability::{logging, metrics};
use podsync_gateway::store::SqliteSyncStore;
use podsync_gateway::{GatewayConfig, HttpServer};

#[derive(Parser)]
#[command(name = "podsync-gateway")]
#[command(
    about = "Whitelisted fetch proxy and sync endpoint for the podcatcher web client",
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file. Built-in defaults apply when
    /// omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_tracing(&config.observability.log_level);

    tracing::info!("podsync-gateway v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        store_path = %config.store.path.display(),
        allowed_prefixes = config.public_proxy.allowed_prefixes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let store = SqliteSyncStore::open(&config.store)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn(signals::shutdown_on_signal(Arc::clone(&shutdown)));

    let server = HttpServer::new(config, store)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

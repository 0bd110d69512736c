// src/main.rs
use anyhow::{Context, Result};
use std::path::Path;
use tokio::signal;
use tracing::info;

use bindaddr::config::{self, Config};
use bindaddr::socket;

const DEFAULT_CONFIG: &str = "config.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bindaddr=debug".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = match &config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            config::load_config(path).await?
        }
        None if Path::new(DEFAULT_CONFIG).exists() => {
            info!("Loading configuration from: {}", DEFAULT_CONFIG);
            config::load_config(DEFAULT_CONFIG).await?
        }
        None => {
            info!("No configuration file, using defaults");
            Config::default()
        }
    };

    let (transport, address) = socket::parse(&config.listen);
    info!(%transport, %address, mode = %format!("{:#o}", config.mode), "Binding listener");

    let listener = socket::listen(transport, &address, config.mode)
        .with_context(|| format!("Failed to listen on {}", config.listen))?;
    info!("Listening on {} {}", transport, listener.local_addr_string()?);

    shutdown_signal().await;
    listener.close();

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::warn!(%err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::warn!(%err, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

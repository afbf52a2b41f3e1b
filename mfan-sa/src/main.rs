//! mfan-sa (Search Aggregator) - multi-source content search service
//!
//! Loads the TOML config, wires the reference collaborators and serves the
//! batch and streaming search endpoints.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mfan_common::config::{ConfigResolver, CONFIG_ENV_VAR};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mfan_sa::{build_router, AppState};

/// Command-line arguments for mfan-sa
#[derive(Parser, Debug)]
#[command(name = "mfan-sa")]
#[command(about = "Multi-source content search aggregator")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Listen address, overriding server.bind
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_path) = ConfigResolver::new(args.config.clone())
        .load_or_default()
        .context("Failed to load configuration")?;

    // RUST_LOG wins over logging.level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any other startup output
    info!(
        "Starting mfan Search Aggregator (mfan-sa) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => warn!("No config file loaded, running with compiled defaults"),
    }
    if !config.auth.signatures_enabled() {
        warn!("auth.shared_secret is empty, request signatures are not checked");
    }
    info!(
        "{} source(s) configured, per-source timeout {}ms",
        config.sources.len(),
        config.search.source_timeout_ms
    );

    let state = AppState::from_config(&config, config_path)?;
    let app = build_router(state);

    let addr = match args.bind {
        Some(addr) => addr,
        None => config
            .server
            .bind
            .parse::<SocketAddr>()
            .context("Invalid server.bind")?,
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("mfan-sa listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

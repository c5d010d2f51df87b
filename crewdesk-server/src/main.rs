//! crewdesk-server - call-center staff operations service
//!
//! Serves the worker store over HTTP and syncs it with the WordPress user
//! directory and MyPhoner call statistics. Luca accounting data is proxied
//! read-only.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crewdesk_common::config::{load_toml_config, DataFolderInitializer};
use crewdesk_server::config::{CliOverrides, ServiceConfig};
use crewdesk_server::store::WorkerStore;
use crewdesk_server::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for crewdesk-server
#[derive(Parser, Debug)]
#[command(name = "crewdesk-server")]
#[command(about = "Call-center staff operations service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "HOSTNAME")]
    bind: Option<String>,

    /// Folder holding workers.json
    #[arg(short, long, env = "CREWDESK_DATA_FOLDER")]
    data_folder: Option<PathBuf>,

    /// Path to crewdesk.toml
    #[arg(short, long, env = "CREWDESK_CONFIG")]
    config: Option<PathBuf>,
}

fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!(
        "crewdesk_server={level},crewdesk_common={level},tower_http={level}"
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG wins; otherwise start at info and apply the configured level
    // once the config file has been read
    let rust_log = std::env::var_os("RUST_LOG").is_some();
    let initial = if rust_log {
        EnvFilter::from_default_env()
    } else {
        log_filter("info")
    };
    let (filter, filter_handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting crewdesk-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let toml_config =
        load_toml_config(args.config.as_deref()).context("Failed to load configuration file")?;

    let config = ServiceConfig::resolve(
        CliOverrides {
            port: args.port,
            bind: args.bind,
            data_folder: args.data_folder,
        },
        &toml_config,
    );

    if !rust_log {
        filter_handle
            .reload(log_filter(&config.log_level))
            .context("Failed to apply log level")?;
    }

    config.log_summary();

    let initializer = DataFolderInitializer::new(config.data_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to create data folder")?;

    let workers_path = initializer.workers_file_path();
    let store = WorkerStore::open(&workers_path)
        .await
        .with_context(|| format!("Failed to load {}", workers_path.display()))?;
    info!("Worker store ready: {} workers", store.count().await);

    let addr = format!("{}:{}", config.bind, config.port);
    let state = AppState::new(store, config).context("Failed to initialize HTTP clients")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("crewdesk-server listening on http://{}", addr);
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
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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

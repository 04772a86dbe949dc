//! gatilho-server - psychological analysis service
//!
//! Serves the analysis API, the `/ws` duplex channel and per-analysis SSE
//! streams. Default port 3001.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use gatilho_common::config::{
    resolve_database_path, TomlConfig, DEFAULT_BIND_ADDRESS, DEFAULT_PORT,
};
use gatilho_server::config::{PipelineTiming, ProviderKeys};
use gatilho_server::services::ProviderChain;
use gatilho_server::AppState;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for gatilho-server
#[derive(Parser, Debug)]
#[command(name = "gatilho-server")]
#[command(about = "Psychological analysis service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "GATILHO_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "GATILHO_DATABASE")]
    database: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "GATILHO_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = TomlConfig::load_or_default(args.config.as_deref());

    // RUST_LOG wins over the config file level
    let level = toml_config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "gatilho_server={level},gatilho_common={level},tower_http={level}",
                    level = level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting gatilho-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let db_path = resolve_database_path(args.database.as_deref(), &toml_config);
    info!("Database: {}", db_path.display());
    let db_pool = gatilho_common::db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let keys = ProviderKeys::resolve(&toml_config.providers);
    let timing = PipelineTiming::from_config(&toml_config.pipeline);
    let provider = ProviderChain::from_keys(&keys, &timing);
    info!(
        "Text providers: {} (configured keys: {})",
        provider.active_providers().join(" → "),
        keys.configured_count()
    );

    let state = AppState::new(db_pool, Arc::new(provider), timing);
    let app = gatilho_server::build_router(state);

    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let bind_address = args
        .bind_address
        .or(toml_config.bind_address)
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
    let addr: SocketAddr = format!("{}:{}", bind_address, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind_address, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
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
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
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

//! zodiac-admin - Admin session authentication for the Zodiac storefront
//!
//! This is the main entry point for the zodiac-admin service.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use zodiac_admin::auth::{AuthManager, AuthSettings};
use zodiac_admin::config::Config;
use zodiac_admin::database::SqliteDatabase;
use zodiac_admin::notify::notifier_from_config;
use zodiac_admin::server::{AppState, Server};
use zodiac_admin::telemetry::init_tracing;

/// How often expired login rate limit entries are dropped
const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// zodiac-admin - Admin session authentication for the Zodiac storefront
#[derive(Parser, Debug)]
#[command(name = "zodiac-admin")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "ZODIAC_ADMIN_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(&args)?;

    init_tracing(&config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting zodiac-admin");

    ensure_parent_dir(&config.database.path)?;
    let database = Arc::new(SqliteDatabase::new(&config.database.path).await?);
    info!(path = %config.database.path, "Database initialized");

    let settings = AuthSettings::from_config(&config.auth);
    if settings.codec.is_none() {
        warn!("No session secret configured, every login and session will be refused");
    }
    if settings.fallback.is_none() {
        warn!("No owner credential configured, only stored admins can sign in");
    }

    let auth_manager = Arc::new(
        AuthManager::new(Arc::clone(&database), settings)
            .with_notifier(notifier_from_config(&config.notify)),
    );
    info!(
        configured = auth_manager.is_configured(),
        webhook = config.notify.webhook_url.is_some(),
        "Authentication manager initialized"
    );

    let pruner = {
        let auth_manager = Arc::clone(&auth_manager);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                auth_manager.prune_rate_limits();
            }
        })
    };

    let server = Server::new(config.server.clone(), AppState { auth_manager });

    info!(
        host = %config.server.host,
        port = %config.server.port,
        "Starting HTTP server"
    );

    let result = server.run(shutdown_signal()).await;

    pruner.abort();
    info!("zodiac-admin shutdown complete");

    result.map_err(Into::into)
}

/// Load configuration from file or environment
fn load_config(args: &Args) -> anyhow::Result<Config> {
    match &args.config {
        Some(path) => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from file: {}", path);
            Config::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
        None => {
            eprintln!("Loading configuration from environment variables");
            Config::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
    }
}

/// Create the directory holding a file-backed database
fn ensure_parent_dir(path: &str) -> anyhow::Result<()> {
    if path == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Create a future that resolves when a shutdown signal is received
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

//! SSO server binary.
//!
//! `serve` runs the RPC surface over a SQLite database; `migrate` only brings
//! the schema up to date.

pub use self::error::{Error, Result};
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use sso_api::config::ApiConfig;
use sso_api::{AppState, router};
use sso_core::storage::sqlite::SqliteStorage;
use tracing::{info, warn};

use cli::{Cli, Commands};

mod cli;
mod logging;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!(error = %e, "fatal");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    let config = load_config(&args)?;
    logging::init(config.env)?;

    let storage = open_storage(&config).await?;

    match args.command {
        Commands::Migrate => {
            info!("migrations applied");
            Ok(())
        }
        Commands::Serve { .. } => serve(config, storage).await,
    }
}

fn load_config(args: &Cli) -> Result<ApiConfig> {
    let path = args.config.clone().unwrap_or_else(|| PathBuf::from("config/local.yaml"));
    let mut config = ApiConfig::from_file(&path)?;

    if let Some(storage_path) = &args.storage_path {
        config.storage_path = storage_path.clone();
    }
    if let Commands::Serve { port: Some(port) } = args.command {
        config.http.port = port;
    }
    config.validate()?;
    Ok(config)
}

/// Open the database, creating it if needed, and run migrations.
async fn open_storage(config: &ApiConfig) -> Result<SqliteStorage> {
    info!(path = %config.storage_path.display(), "opening storage");
    if let Some(parent) = config.storage_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let storage = SqliteStorage::connect(&config.storage_path).await?;

    info!("running database migrations");
    sso_core::migrate::migrate(storage.pool()).await?;
    Ok(storage)
}

async fn serve(config: ApiConfig, storage: SqliteStorage) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let local_addr = listener.local_addr()?;

    let app = router(AppState::new(config, Arc::new(storage)));

    info!(addr = %local_addr, "RPC server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received SIGINT, shutting down"),
            Err(e) => {
                warn!(error = %e, "failed to install SIGINT handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("received SIGTERM, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

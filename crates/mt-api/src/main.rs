//! Money tracker API server

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use mt_api::{create_router, logging, state::AppState};
use mt_core::AppConfig;
use mt_store::SqliteStore;
use tokio::signal;

#[derive(Parser)]
#[command(name = "mt-api")]
#[command(about = "Personal finance tracking API server", version)]
struct Cli {
    /// TOML configuration file; environment variables override its values
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    config.validate()?;

    logging::init_logging(config.env, &config.logging);
    tracing::info!(env = %config.env, "starting money tracker");

    let store = Arc::new(SqliteStore::new(&config.database).await?);
    tracing::info!(path = %config.database.storage_path.display(), "storage ready");

    let addr = config.listen_addr();
    let state = Arc::new(AppState::with_store(config, store));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Money tracker API listening on http://{}", addr);
    tracing::info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
}

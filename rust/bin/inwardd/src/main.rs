//! `inwardd`: the inward ledger server.
//!
//! Usage:
//!   inwardd [--port <port>] [--host <ip>] [--ledger <path>] [--public <dir>]
//!
//! Every flag can also come from the environment (`PORT`, `INWARD_HOST`,
//! `INWARD_LEDGER`, `INWARD_PUBLIC`). Relative paths are resolved against
//! the working directory at startup.

mod config;
mod error;
mod handlers;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use inward_ledger::{LedgerStore, XlsxStore};
use tracing::info;

use config::{ServerConfig, DEFAULT_PORT};
use routes::AppState;

/// Inward ledger server.
#[derive(Parser, Debug)]
#[command(name = "inwardd", about = "Inward ledger server")]
struct Cli {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// IP address to bind.
    #[arg(long, env = "INWARD_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Ledger workbook path.
    #[arg(long, env = "INWARD_LEDGER", default_value = inward_ledger::EXPORT_FILE_NAME)]
    ledger: PathBuf,

    /// Directory with the static form UI.
    #[arg(long = "public", env = "INWARD_PUBLIC", default_value = "public")]
    static_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let cwd = std::env::current_dir()?;
    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        ledger_path: cli.ledger,
        static_dir: cli.static_dir,
    }
    .resolve(&cwd);
    info!("Ledger workbook at {}", config.ledger_path.display());

    let ledger: Arc<dyn LedgerStore> = Arc::new(
        XlsxStore::open(&config.ledger_path)
            .map_err(|e| anyhow::anyhow!("failed to open ledger: {}", e))?,
    );

    let app = routes::build_router(AppState { ledger }, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.listen_addr()?).await?;
    info!("Server running on port {}", config.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

//! fedbrief server
//!
//! Local web chat server for the daily-briefing assistant. Serves the chat
//! page, proxies turns to an OpenAI-compatible backend through the
//! orchestrator, and ingests Federal Register documents into the local
//! SQLite cache.

mod config;
mod error;
mod ingest;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use fedbrief::Orchestrator;
use fedbrief_client::OpenAIClient;
use fedbrief_tools::search::ExecutiveOrderSearchTool;
use fedbrief_tools::store::DocumentStore;
use fedbrief_tools::ToolRegistry;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::routes::AppState;

/// Daily-briefing assistant over locally cached federal executive orders.
#[derive(Debug, Parser)]
#[command(name = "fedbrief-server", version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run one Federal Register ingestion pass and exit.
    #[arg(long)]
    ingest: bool,
}

/// Initializes structured logging with tracing.
///
/// Supports two output formats via the `FEDBRIEF_LOG_FORMAT` environment
/// variable:
/// - `json`: Machine-readable JSON logs
/// - `pretty`: Human-readable formatted logs (default)
///
/// Log level is controlled via the `RUST_LOG` environment variable.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let format = std::env::var("FEDBRIEF_LOG_FORMAT")
        .unwrap_or_else(|_| "pretty".to_string())
        .to_lowercase();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fedbrief_server=info,fedbrief=info"));

    match format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .init();
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install ctrl-c handler: {e}");
    } else {
        info!("Shutdown signal received");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let config = match ServerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return Err(e);
        }
    };

    info!(
        "Opening document store at {}",
        config.database_path.display()
    );
    let store = Arc::new(DocumentStore::open(&config.database_path)?);

    if args.ingest {
        let report = ingest::run_ingestion(&store, &config.ingestion).await?;
        info!(
            "Ingestion run finished: {} fetched, {} stored",
            report.fetched, report.stored
        );
        return Ok(());
    }

    let document_count = store.count()?;
    info!("Document store ready with {document_count} cached documents");

    let registry = ToolRegistry::new();
    registry.register(Arc::new(ExecutiveOrderSearchTool::new(Arc::clone(&store))));

    let client = OpenAIClient::new(config.backend_config())?;
    let orchestrator = Orchestrator::new(client, registry);

    let state = Arc::new(AppState { orchestrator });
    let app = routes::router(state);

    let addr = config.bind_address()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

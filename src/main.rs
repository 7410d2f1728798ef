//! Parlay Ledger service.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the configured store, and serves the HTTP API until Ctrl+C.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use parlay_ledger::api;
use parlay_ledger::config::{AppConfig, StorageBackend};
use parlay_ledger::ledger::Ledger;
use parlay_ledger::storage::{LedgerStore, MemoryStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = AppConfig::path_from_env();
    let mut cfg = AppConfig::load_or_default(&config_path)?;
    cfg.apply_env();

    init_logging(&cfg);

    info!(
        config = %config_path,
        addr = %cfg.server.addr(),
        backend = %cfg.storage.backend,
        "Parlay ledger starting up"
    );

    // -- Storage ---------------------------------------------------------

    let store: Arc<dyn LedgerStore> = match cfg.storage.backend {
        StorageBackend::Sqlite => {
            let store = SqliteStore::connect(&cfg.storage.database_url)
                .await
                .with_context(|| {
                    format!("Failed to open database: {}", cfg.storage.database_url)
                })?;
            info!(url = %cfg.storage.database_url, "SQLite ledger ready");
            Arc::new(store)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; parlays are lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let ledger = Arc::new(Ledger::with_store(store));

    // -- Serve -----------------------------------------------------------

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received.");
        }
    };
    api::serve(&cfg.server.addr(), ledger, shutdown).await?;

    info!("Parlay ledger shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging(cfg: &AppConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.filter));

    if cfg.logging.json {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

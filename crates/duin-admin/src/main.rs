//! duin-admin: the marketplace admin daemon.
//!
//! Single OS process running a Tokio async runtime. Owns the ledger
//! connection and the transfer validator; the HTTP-facing collaborator
//! talks to it via JSON-RPC over a Unix socket.

mod commands;
mod config;
mod rpc;

use std::sync::Arc;

use duin_ledger::{BidLedger, LocalLedger};
use duin_transfer::TransferValidator;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::config::{AdminConfig, LedgerBackend};
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct AdminState {
    /// Validator over the configured ledger. Also the owner of the ledger
    /// handle.
    pub validator: TransferValidator<dyn BidLedger>,
    pub config: AdminConfig,
    /// Unix seconds at startup.
    pub started_at: u64,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AdminState {
    pub fn new(ledger: Arc<dyn BidLedger>, config: AdminConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            validator: TransferValidator::new(ledger),
            config,
            started_at: duin_ledger::current_timestamp(),
            shutdown_tx,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn BidLedger> {
        self.validator.ledger()
    }
}

/// Open the configured ledger backend.
fn open_ledger(config: &AdminConfig) -> anyhow::Result<Arc<dyn BidLedger>> {
    let ledger: Arc<dyn BidLedger> = match config.ledger.backend {
        LedgerBackend::Local => {
            info!("Using in-process ledger; state is discarded on exit");
            Arc::new(LocalLedger::since(config.ledger.publish_timestamp))
        }
        LedgerBackend::Sqlite => {
            let path = config.database_path();
            info!(path = ?path, "Opening SQLite ledger");
            Arc::new(duin_db::SqliteLedger::open_since(&path, config.ledger.publish_timestamp)?)
        }
    };
    Ok(ledger)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = AdminConfig::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("duin={}", config.logging.level).parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = config.ledger.backend.as_str(),
        "Duin admin starting"
    );

    // Ensure data directory exists
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open the ledger
    let ledger = open_ledger(&config)?;

    // 3. Build daemon state
    let socket_path = config.socket_path();
    let state = Arc::new(AdminState::new(ledger, config));

    // 4. Start IPC server
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());
    info!(socket = ?socket_path, "Starting JSON-RPC server");

    // 5. Run the RPC server until shutdown
    let mut shutdown_rx = state.shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Admin daemon stopped");
    Ok(())
}

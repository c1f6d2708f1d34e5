//! Daemon status command handlers.

use std::sync::Arc;

use duin_ledger::Ledger;

use super::{blocking, Result};
use crate::AdminState;

/// Liveness plus a summary of the ledger view.
pub async fn health(state: &Arc<AdminState>) -> Result {
    let (commitments, active_bids) = blocking(state, |state| {
        let commitments = state.ledger().commitment_log()?;
        let active_bids = state.ledger().active_bids()?;
        Ok((commitments.len(), active_bids.len()))
    })
    .await?;

    let now = duin_ledger::current_timestamp();
    Ok(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.config.ledger.backend.as_str(),
        "publishTimestamp": state.config.ledger.publish_timestamp,
        "uptimeSecs": now.saturating_sub(state.started_at),
        "commitments": commitments,
        "activeBids": active_bids,
    }))
}

/// Ask the daemon to stop after this response.
pub async fn shutdown(state: &Arc<AdminState>) -> Result {
    tracing::info!("shutdown requested over RPC");
    // No receivers just means the run loop already exited.
    let _ = state.shutdown_tx.send(());
    Ok(serde_json::json!({"stopping": true}))
}

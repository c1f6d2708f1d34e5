//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! line-delimited JSON-RPC 2.0 calls to the command handlers. The
//! HTTP-facing collaborator is the only expected client.

use std::path::PathBuf;
use std::sync::Arc;

use duin_ledger::LedgerError;
use duin_transfer::TransferError;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::AdminState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    fn new(code: i32, message: &str, data: Option<serde_json::Value>) -> Self {
        Self {
            code,
            message: message.to_string(),
            data,
        }
    }

    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self::new(-32700, "PARSE_ERROR", None)
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self::new(-32600, "INVALID_REQUEST", None)
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            -32601,
            "METHOD_NOT_FOUND",
            Some(serde_json::json!({"method": method})),
        )
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self::new(
            -32602,
            "INVALID_PARAMS",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self::new(
            -32603,
            "INTERNAL_ERROR",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    // Protocol errors

    /// Malformed or empty protocol input (-32010).
    pub fn invalid_input(detail: &str) -> Self {
        Self::new(
            -32010,
            "INVALID_INPUT",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    /// Mint secret missing or wrong (-32011).
    pub fn unauthorized() -> Self {
        Self::new(-32011, "UNAUTHORIZED", None)
    }

    /// Recomputed commitment not published (-32020).
    pub fn invalid_commitment(commitment: &str) -> Self {
        Self::new(
            -32020,
            "INVALID_COMMITMENT",
            Some(serde_json::json!({"commitment": commitment})),
        )
    }

    /// Recomputed bid nullifier not active (-32021). Retryable after the
    /// caller refreshes its view.
    pub fn bid_not_found(bid_nullifier: &str) -> Self {
        Self::new(
            -32021,
            "BID_NOT_FOUND",
            Some(serde_json::json!({"bidNullifier": bid_nullifier, "retryable": true})),
        )
    }

    /// Token nullifier already consumed (-32030).
    pub fn double_spend(token_nullifier: &str) -> Self {
        Self::new(
            -32030,
            "DOUBLE_SPEND",
            Some(serde_json::json!({"tokenNullifier": token_nullifier})),
        )
    }

    /// The ledger refused the call (-32031).
    pub fn ledger_rejected(detail: &str) -> Self {
        Self::new(
            -32031,
            "LEDGER_REJECTED",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    /// The ledger could not be reached or its storage failed (-32032).
    pub fn ledger_unavailable(detail: &str) -> Self {
        Self::new(
            -32032,
            "LEDGER_UNAVAILABLE",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    /// Transfer executed but the replacement mint failed (-32040).
    pub fn partial_completion(data: serde_json::Value) -> Self {
        Self::new(-32040, "PARTIAL_COMPLETION", Some(data))
    }
}

impl From<LedgerError> for RpcError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::DoubleSpend(nullifier) => Self::double_spend(&nullifier.to_hex()),
            LedgerError::Unavailable(_) | LedgerError::Storage(_) => {
                Self::ledger_unavailable(&err.to_string())
            }
            LedgerError::Rejected(_)
            | LedgerError::UnknownBid(_)
            | LedgerError::BidderHasActiveBid(_)
            | LedgerError::NoActiveBid(_)
            | LedgerError::TokenIdsExhausted => Self::ledger_rejected(&err.to_string()),
        }
    }
}

impl From<TransferError> for RpcError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::InvalidInput(detail) => Self::invalid_input(&detail),
            TransferError::InvalidCommitment(commitment) => {
                Self::invalid_commitment(&commitment.to_hex())
            }
            TransferError::BidNotFound(bid_nullifier) => {
                Self::bid_not_found(&bid_nullifier.to_hex())
            }
            TransferError::Ledger(inner) => inner.into(),
            TransferError::PartialCompletion {
                transaction,
                bid_nullifier,
                token_nullifier,
                receiver_ownership_nullifier,
                mint_error,
            } => Self::partial_completion(serde_json::json!({
                "transaction": transaction,
                "bidNullifier": bid_nullifier,
                "tokenNullifier": token_nullifier,
                "receiverOwnershipNullifier": receiver_ownership_nullifier,
                "mintError": mint_error.to_string(),
            })),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<AdminState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<AdminState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!(socket = ?self.socket_path, "IPC server listening");

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<AdminState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(&state, &line).await;

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Parse one request line and dispatch it.
pub async fn handle_line(state: &Arc<AdminState>, line: &str) -> RpcResponse {
    match serde_json::from_str::<RpcRequest>(line) {
        Ok(request) if request.jsonrpc != "2.0" => {
            RpcResponse::error(request.id, RpcError::invalid_request())
        }
        Ok(request) => dispatch_request(state.clone(), request).await,
        Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
    }
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
async fn dispatch_request(state: Arc<AdminState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    debug!(method, "Dispatching RPC method");

    let result = match method {
        // Status
        "health" => commands::status::health(&state).await,
        "shutdown" => commands::status::shutdown(&state).await,

        // Ledger views
        "get_commitments" => commands::ledger::get_commitments(&state, &request.params).await,
        "get_active_bids" => commands::ledger::get_active_bids(&state).await,
        "mint" => commands::ledger::mint(&state, &request.params).await,
        "place_bid" => commands::ledger::place_bid(&state, &request.params).await,
        "withdraw_bid" => commands::ledger::withdraw_bid(&state, &request.params).await,

        // Derivations
        "derive_commitment" => commands::derive::derive_commitment(&state, &request.params).await,
        "derive_bid_nullifier" => {
            commands::derive::derive_bid_nullifier(&state, &request.params).await
        }

        // Transfers
        "authorize_transfer" => {
            commands::transfer::authorize_transfer(&state, &request.params).await
        }
        "transfer" => commands::transfer::transfer(&state, &request.params).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

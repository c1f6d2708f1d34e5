//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category. Ledger
//! calls block (SQLite, std locks), so handlers run them on the blocking
//! pool via [`blocking`].

pub mod derive;
pub mod ledger;
pub mod status;
pub mod transfer;

use std::sync::Arc;

use serde_json::Value;

use crate::rpc::RpcError;
use crate::AdminState;

/// Result type shared by all handlers.
pub type Result = std::result::Result<Value, RpcError>;

/// Run a ledger-touching closure on the blocking thread pool.
pub(crate) async fn blocking<T, F>(state: &Arc<AdminState>, f: F) -> std::result::Result<T, RpcError>
where
    F: FnOnce(&AdminState) -> std::result::Result<T, RpcError> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| RpcError::internal_error(&format!("task failed: {e}")))?
}

/// A required string parameter.
pub(crate) fn str_param<'a>(params: &'a Value, name: &str) -> std::result::Result<&'a str, RpcError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))
}

/// Serialise a handler result.
pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Result {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&format!("serialize: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use duin_ledger::{BidLedger, LocalLedger};

    use super::*;
    use crate::config::{AdminConfig, LedgerBackend};

    pub const OWNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    pub const BIDDER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    pub const CAROL: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";
    pub const OWNERSHIP_NULLIFIER: &str =
        "0x8c01d4b950e14439bdae7de3fe4ec8161d9183910d243e79d304b6de61c4ec5f";
    pub const COMMITMENT_1: &str =
        "0x554f198dc946ce841f15b7804319b9c1210a22ba19f065f10bee80bedae9745a";
    pub const BID_SECRET: &str =
        "0xebd0c9651ea19cee50a3b10e7be33b9ea4d7a1b7c543a908cd9eb73b5b4703e1";
    pub const BID_NULLIFIER: &str =
        "0x9fe91bf19b2ecee59f40bcc08729dc8ee6372af8a24ff587dd7890fd895a9522";
    pub const RECEIVER_NULLIFIER: &str =
        "0x0757b118a54d28d76ecef2a1e06950b850356153cd1d7e31199d51d83908b28e";

    /// Admin state over a fresh in-process ledger.
    pub fn local_state() -> Arc<AdminState> {
        state_with(AdminConfig::default())
    }

    pub fn state_with(mut config: AdminConfig) -> Arc<AdminState> {
        config.ledger.backend = LedgerBackend::Local;
        let ledger: Arc<dyn BidLedger> = Arc::new(LocalLedger::new());
        Arc::new(AdminState::new(ledger, config))
    }

    #[test]
    fn test_str_param() {
        let params = serde_json::json!({"a": "x", "b": 1});
        assert_eq!(str_param(&params, "a").expect("a"), "x");
        assert_eq!(str_param(&params, "b").expect_err("b").code, -32602);
        assert_eq!(str_param(&Value::Null, "a").expect_err("missing").code, -32602);
    }

    #[tokio::test]
    async fn test_blocking_propagates_errors() {
        let state = local_state();
        let err = blocking(&state, |_| -> std::result::Result<(), RpcError> {
            Err(RpcError::invalid_input("nope"))
        })
        .await
        .expect_err("error");
        assert_eq!(err.code, -32010);
    }
}

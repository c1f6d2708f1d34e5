//! Transfer command handlers.
//!
//! Params are a `TransferRequest` object (camelCase fields). Secrets in it
//! are never logged.

use std::sync::Arc;

use duin_transfer::TransferRequest;
use serde::Deserialize;
use serde_json::Value;

use super::{blocking, to_value, Result};
use crate::rpc::RpcError;
use crate::AdminState;

fn parse_request(params: &Value) -> std::result::Result<TransferRequest, RpcError> {
    TransferRequest::deserialize(params).map_err(|e| RpcError::invalid_params(&e.to_string()))
}

/// Dry run: steps 1-6 of the pipeline, no ledger mutation.
pub async fn authorize_transfer(state: &Arc<AdminState>, params: &Value) -> Result {
    let request = parse_request(params)?;
    let authorized = blocking(state, move |state| Ok(state.validator.authorize(&request)?)).await?;
    to_value(&authorized)
}

/// Validate, execute, and re-mint to the receiver.
pub async fn transfer(state: &Arc<AdminState>, params: &Value) -> Result {
    let request = parse_request(params)?;
    let receipt = blocking(state, move |state| {
        Ok(state.validator.validate_and_execute_transfer(&request)?)
    })
    .await?;
    to_value(&receipt)
}

#[cfg(test)]
mod tests {
    use duin_ledger::Ledger;
    use duin_types::Digest;

    use super::*;
    use crate::commands::tests::{
        local_state, BIDDER, BID_NULLIFIER, BID_SECRET, CAROL, COMMITMENT_1, OWNER,
        OWNERSHIP_NULLIFIER, RECEIVER_NULLIFIER,
    };

    fn digest(text: &str) -> Digest {
        Digest::parse(text).expect("digest")
    }

    fn request() -> Value {
        serde_json::json!({
            "senderAddress": OWNER,
            "senderSecret": "alpha",
            "tokenId": "1",
            "receiverSecret": BID_SECRET,
            "fundsReceiver": CAROL,
            "receiverOwnershipNullifier": RECEIVER_NULLIFIER,
        })
    }

    fn seeded_state() -> Arc<AdminState> {
        let state = local_state();
        state.ledger().mint(&digest(OWNERSHIP_NULLIFIER)).expect("mint");
        let bidder = duin_crypto::address::Address::parse(BIDDER).expect("address");
        state
            .ledger()
            .place_bid(&bidder, &digest(BID_NULLIFIER), 500)
            .expect("bid");
        state
    }

    #[tokio::test]
    async fn test_authorize_is_read_only() {
        let state = seeded_state();
        let authorized = authorize_transfer(&state, &request()).await.expect("authorize");
        assert_eq!(authorized["commitment"], COMMITMENT_1);
        assert_eq!(authorized["bidNullifier"], BID_NULLIFIER);
        assert_eq!(authorized["bidAmount"], "500");
        assert_eq!(state.ledger().active_bids().expect("bids").len(), 1);
    }

    #[tokio::test]
    async fn test_transfer_then_replay() {
        let state = seeded_state();
        let receipt = transfer(&state, &request()).await.expect("transfer");
        assert_eq!(receipt["mint"]["tokenId"], "2");

        let err = transfer(&state, &request()).await.expect_err("replay");
        assert_eq!(err.code, -32021);
    }

    #[tokio::test]
    async fn test_unknown_commitment() {
        let state = seeded_state();
        let mut params = request();
        params["senderSecret"] = serde_json::json!("not alpha");
        let err = transfer(&state, &params).await.expect_err("wrong secret");
        assert_eq!(err.code, -32020);
    }

    #[tokio::test]
    async fn test_missing_field_is_invalid_params() {
        let state = seeded_state();
        let mut params = request();
        params.as_object_mut().expect("object").remove("tokenId");
        let err = transfer(&state, &params).await.expect_err("missing");
        assert_eq!(err.code, -32602);
    }

    #[tokio::test]
    async fn test_sender_as_funds_receiver_rejected() {
        let state = seeded_state();
        let mut params = request();
        params["fundsReceiver"] = serde_json::json!(OWNER);
        let err = transfer(&state, &params).await.expect_err("self payout");
        assert_eq!(err.code, -32010);
    }
}

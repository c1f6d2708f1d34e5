//! Ledger command handlers: published views, minting, and the bidder-side
//! calls used against the development ledgers.

use std::sync::Arc;

use duin_ledger::Ledger;
use duin_nullifier::derive::{parse_address, parse_digest};
use duin_types::{Amount, Digest};
use serde_json::Value;

use super::{blocking, str_param, to_value, Result};
use crate::rpc::RpcError;
use crate::AdminState;

/// Published commitments in chronological order.
///
/// Optional `since` (Unix seconds, inclusive) limits the result to records
/// at or after that time.
pub async fn get_commitments(state: &Arc<AdminState>, params: &Value) -> Result {
    let since = match params.get("since") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            v.as_u64()
                .ok_or_else(|| RpcError::invalid_params("since must be a non-negative integer"))?,
        ),
    };

    let log = blocking(state, |state| Ok(state.ledger().commitment_log()?)).await?;
    let records: Vec<_> = log
        .records()
        .iter()
        .filter(|r| since.map_or(true, |t| r.timestamp >= t))
        .collect();
    to_value(&records)
}

/// Open bids, oldest first.
pub async fn get_active_bids(state: &Arc<AdminState>) -> Result {
    let bids = blocking(state, |state| Ok(state.ledger().active_bids()?)).await?;
    let mut entries: Vec<Value> = bids
        .iter()
        .map(|(nullifier, bid)| {
            serde_json::json!({
                "bidNullifier": nullifier,
                "bidder": bid.bidder,
                "amount": bid.amount.to_string(),
                "timestamp": bid.timestamp,
            })
        })
        .collect();
    entries.sort_by(|a, b| {
        let key = |v: &Value| (v["timestamp"].as_u64(), v["bidNullifier"].as_str().map(str::to_owned));
        key(a).cmp(&key(b))
    });
    Ok(Value::Array(entries))
}

/// Mint a token to an ownership nullifier.
pub async fn mint(state: &Arc<AdminState>, params: &Value) -> Result {
    check_mint_secret(state, params)?;
    let nullifier = digest_param(params, "ownershipNullifier")?;
    let receipt = blocking(state, move |state| Ok(state.ledger().mint(&nullifier)?)).await?;
    tracing::info!(token_id = %receipt.token_id, commitment = %receipt.commitment, "minted over RPC");
    to_value(&receipt)
}

/// Deposit a bid.
pub async fn place_bid(state: &Arc<AdminState>, params: &Value) -> Result {
    let bidder = parse_address("bidder", str_param(params, "bidder")?)
        .map_err(|e| RpcError::invalid_input(&e.to_string()))?;
    let bid_nullifier = digest_param(params, "bidNullifier")?;
    let amount = amount_param(params, "amount")?;

    let transaction = blocking(state, move |state| {
        Ok(state.ledger().place_bid(&bidder, &bid_nullifier, amount)?)
    })
    .await?;
    Ok(serde_json::json!({
        "transaction": transaction,
        "bidNullifier": bid_nullifier,
    }))
}

/// Withdraw the bidder's open bid.
pub async fn withdraw_bid(state: &Arc<AdminState>, params: &Value) -> Result {
    let bidder = parse_address("bidder", str_param(params, "bidder")?)
        .map_err(|e| RpcError::invalid_input(&e.to_string()))?;
    let (bid_nullifier, amount) =
        blocking(state, move |state| Ok(state.ledger().withdraw_bid(&bidder)?)).await?;
    Ok(serde_json::json!({
        "bidNullifier": bid_nullifier,
        "amount": amount.to_string(),
    }))
}

fn check_mint_secret(state: &AdminState, params: &Value) -> std::result::Result<(), RpcError> {
    let expected = state.config.rpc.mint_secret.as_str();
    if expected.is_empty() {
        return Ok(());
    }
    match params.get("mintSecret").and_then(|v| v.as_str()) {
        Some(given) if given == expected => Ok(()),
        _ => {
            tracing::warn!("mint refused: bad mint secret");
            Err(RpcError::unauthorized())
        }
    }
}

fn digest_param(params: &Value, name: &str) -> std::result::Result<Digest, RpcError> {
    parse_digest(name, str_param(params, name)?).map_err(|e| RpcError::invalid_input(&e.to_string()))
}

/// Amounts travel as decimal strings; small integers are accepted too.
fn amount_param(params: &Value, name: &str) -> std::result::Result<Amount, RpcError> {
    match params.get(name) {
        Some(Value::String(s)) => s
            .parse::<Amount>()
            .map_err(|_| RpcError::invalid_params(&format!("{name} must be a decimal integer"))),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Amount::from)
            .ok_or_else(|| RpcError::invalid_params(&format!("{name} must be a non-negative integer"))),
        _ => Err(RpcError::invalid_params(&format!("{name} required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{
        local_state, state_with, BIDDER, BID_NULLIFIER, COMMITMENT_1, OWNERSHIP_NULLIFIER,
    };
    use crate::config::AdminConfig;

    #[tokio::test]
    async fn test_mint_and_list() {
        let state = local_state();
        let receipt = mint(&state, &serde_json::json!({"ownershipNullifier": OWNERSHIP_NULLIFIER}))
            .await
            .expect("mint");
        assert_eq!(receipt["tokenId"], "1");
        assert_eq!(receipt["commitment"], COMMITMENT_1);

        let list = get_commitments(&state, &Value::Null).await.expect("list");
        let list = list.as_array().expect("array");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["commitmentHash"], COMMITMENT_1);

        let future = get_commitments(&state, &serde_json::json!({"since": u64::MAX}))
            .await
            .expect("list");
        assert_eq!(future.as_array().expect("array").len(), 0);
    }

    #[tokio::test]
    async fn test_mint_secret_enforced() {
        let mut config = AdminConfig::default();
        config.rpc.mint_secret = "open sesame".into();
        let state = state_with(config);

        let err = mint(&state, &serde_json::json!({"ownershipNullifier": OWNERSHIP_NULLIFIER}))
            .await
            .expect_err("no secret");
        assert_eq!(err.code, -32011);

        mint(
            &state,
            &serde_json::json!({"ownershipNullifier": OWNERSHIP_NULLIFIER, "mintSecret": "open sesame"}),
        )
        .await
        .expect("mint");
    }

    #[tokio::test]
    async fn test_mint_rejects_bad_nullifier() {
        let state = local_state();
        let err = mint(&state, &serde_json::json!({"ownershipNullifier": "0x1234"}))
            .await
            .expect_err("bad digest");
        assert_eq!(err.code, -32010);
    }

    #[tokio::test]
    async fn test_bid_lifecycle() {
        let state = local_state();
        place_bid(
            &state,
            &serde_json::json!({"bidder": BIDDER, "bidNullifier": BID_NULLIFIER, "amount": "1000000000000000000"}),
        )
        .await
        .expect("place");

        let bids = get_active_bids(&state).await.expect("bids");
        let bids = bids.as_array().expect("array");
        assert_eq!(bids.len(), 1);
        assert_eq!(bids[0]["bidNullifier"], BID_NULLIFIER);
        assert_eq!(bids[0]["amount"], "1000000000000000000");
        assert_eq!(bids[0]["bidder"], BIDDER);

        let err = place_bid(
            &state,
            &serde_json::json!({"bidder": BIDDER, "bidNullifier": COMMITMENT_1, "amount": 5}),
        )
        .await
        .expect_err("second bid");
        assert_eq!(err.code, -32031);

        let withdrawn = withdraw_bid(&state, &serde_json::json!({"bidder": BIDDER}))
            .await
            .expect("withdraw");
        assert_eq!(withdrawn["bidNullifier"], BID_NULLIFIER);
        assert!(get_active_bids(&state)
            .await
            .expect("bids")
            .as_array()
            .expect("array")
            .is_empty());
    }

    #[test]
    fn test_amount_param_forms() {
        let params = serde_json::json!({"a": "340282366920938463463374607431768211455", "b": 7, "c": -1, "d": "1.5"});
        assert_eq!(amount_param(&params, "a").expect("a"), u128::MAX);
        assert_eq!(amount_param(&params, "b").expect("b"), 7);
        assert!(amount_param(&params, "c").is_err());
        assert!(amount_param(&params, "d").is_err());
        assert!(amount_param(&params, "e").is_err());
    }
}

//! Derivation command handlers. Pure functions of their parameters; they
//! never touch the ledger.

use std::sync::Arc;

use duin_crypto::secret::Secret;
use duin_nullifier::derive::{parse_digest, parse_token_id};
use duin_nullifier::{derive_bid_secret, derive_ownership_nullifier};
use serde_json::Value;

use super::{str_param, Result};
use crate::rpc::RpcError;
use crate::AdminState;

fn secret_param(params: &Value, name: &str) -> std::result::Result<Secret, RpcError> {
    str_param(params, name).map(Secret::from)
}

fn invalid(e: duin_nullifier::NullifierError) -> RpcError {
    RpcError::invalid_input(&e.to_string())
}

/// `{address, secret, tokenId}` to the owner's nullifier and commitment.
pub async fn derive_commitment(_state: &Arc<AdminState>, params: &Value) -> Result {
    let address = str_param(params, "address")?;
    let secret = secret_param(params, "secret")?;
    let token_id = parse_token_id("tokenId", str_param(params, "tokenId")?).map_err(invalid)?;

    let ownership_nullifier = derive_ownership_nullifier(address, &secret).map_err(invalid)?;
    let commitment = duin_nullifier::derive_commitment(&ownership_nullifier, &token_id);
    Ok(serde_json::json!({
        "tokenId": token_id,
        "ownershipNullifier": ownership_nullifier,
        "commitment": commitment,
    }))
}

/// `{address, secret, commitment}` to the bidder's bid secret and bid
/// nullifier.
pub async fn derive_bid_nullifier(_state: &Arc<AdminState>, params: &Value) -> Result {
    let address = str_param(params, "address")?;
    let secret = secret_param(params, "secret")?;
    let commitment = parse_digest("commitment", str_param(params, "commitment")?).map_err(invalid)?;

    let bid_secret = derive_bid_secret(address, &secret).map_err(invalid)?;
    Ok(serde_json::json!({
        "bidSecret": bid_secret,
        "bidNullifier": duin_nullifier::derive_bid_nullifier(&bid_secret, &commitment),
    }))
}

//! Receipts returned by the ledger for state-changing calls.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Digest, TokenId};

/// Reference to a ledger transaction (a transaction hash on a real chain).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRef(pub Digest);

impl fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Result of minting a token to an ownership nullifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    pub token_id: TokenId,
    pub commitment: Digest,
    pub transaction: TransactionRef,
}

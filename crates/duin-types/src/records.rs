//! Ledger records mirrored by the indexer.
//!
//! Both record kinds are append-only. The "active bids" view is not stored:
//! it is the fold of the bid event log (see `duin-ledger`).

use duin_crypto::address::Address;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{Amount, Digest, Timestamp, TokenId};

/// An `NftMinted` record: a commitment published for a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentRecord {
    pub token_id: TokenId,
    pub commitment_hash: Digest,
    pub timestamp: Timestamp,
}

/// What happened to a bid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidEventKind {
    /// Funds deposited against a bid nullifier.
    Placed,
    /// The bidder took the funds back.
    Withdrawn,
    /// The bid was consumed by a successful transfer.
    Accepted,
}

impl BidEventKind {
    /// Whether this event removes the bid from the active view.
    pub fn closes_bid(&self) -> bool {
        matches!(self, Self::Withdrawn | Self::Accepted)
    }
}

/// One entry of the bid event log.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidEvent {
    /// Unique event id (`{chain}_{block}_{log_index}` on a real chain).
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BidEventKind,
    pub bid_nullifier: Digest,
    /// The account that sent the bid transaction. Not necessarily the
    /// address bound into the bid secret.
    pub bidder: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
    pub timestamp: Timestamp,
}

/// A currently open bid in the active view.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveBid {
    #[serde_as(as = "DisplayFromStr")]
    pub amount: Amount,
    pub timestamp: Timestamp,
    pub bidder: Address,
}

//! # duin-ledger
//!
//! The ledger collaborator of the transfer protocol: the contract surface
//! the admin calls, and the mirrored commitment and bid logs it validates
//! against.
//!
//! The ledger is the only authority on whether a token nullifier has been
//! consumed. Implementations must make "check not consumed, then consume"
//! one indivisible step; [`Ledger::consumes_atomically`] reports whether
//! they do, and callers serialise executions when it is `false`.
//!
//! ## Modules
//!
//! - [`commitments`]: Append-only commitment log
//! - [`bids`]: Bid event log and its active-bid projection
//! - [`cache`]: Single-writer indexer mirror serving point-in-time snapshots
//! - [`local`]: In-process ledger with contract semantics

pub mod bids;
pub mod cache;
pub mod commitments;
pub mod local;

use std::sync::Arc;

use duin_crypto::address::Address;
use duin_crypto::keccak;
use duin_nullifier::NullifierError;
use duin_types::{Amount, Digest, MintReceipt, TransactionRef};

pub use bids::{ActiveBids, BidLog};
pub use cache::{LedgerCache, LedgerSnapshot, SyncCursor, SyncReport};
pub use commitments::CommitmentLog;
pub use local::LocalLedger;

/// Error types for ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The ledger refused the call (a contract-level revert).
    #[error("rejected by ledger: {0}")]
    Rejected(String),

    /// The token nullifier was consumed by an earlier transfer.
    #[error("token nullifier {0} already consumed")]
    DoubleSpend(Digest),

    /// The bid nullifier is not an open bid.
    #[error("bid {0} is not active")]
    UnknownBid(Digest),

    /// The bidder already has an open bid (one per address).
    #[error("bidder {0} already has an active bid")]
    BidderHasActiveBid(Address),

    /// The bidder has no open bid to withdraw.
    #[error("bidder {0} has no active bid")]
    NoActiveBid(Address),

    /// No more token ids can be minted.
    #[error("token id space exhausted")]
    TokenIdsExhausted,

    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// Backing storage failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<NullifierError> for LedgerError {
    fn from(err: NullifierError) -> Self {
        match err {
            NullifierError::DoubleSpend(nullifier) => Self::DoubleSpend(nullifier),
            NullifierError::InvalidInput(msg) => Self::Rejected(msg),
        }
    }
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// The contract surface consumed by the transfer validator.
pub trait Ledger: Send + Sync {
    /// Point-in-time snapshot of all published commitments.
    fn commitment_log(&self) -> Result<Arc<CommitmentLog>>;

    /// Point-in-time snapshot of the open bids.
    fn active_bids(&self) -> Result<Arc<ActiveBids>>;

    /// Consume `token_nullifier`, close the bid, and release its funds to
    /// `funds_receiver`, as one indivisible operation.
    fn execute_transfer(
        &self,
        bid_nullifier: &Digest,
        token_nullifier: &Digest,
        funds_receiver: &Address,
    ) -> Result<TransactionRef>;

    /// Mint a new token committed to `ownership_nullifier`.
    fn mint(&self, ownership_nullifier: &Digest) -> Result<MintReceipt>;

    /// Whether [`Ledger::execute_transfer`] performs its consumption check
    /// and state change atomically.
    fn consumes_atomically(&self) -> bool {
        true
    }
}

/// Bidder-side contract calls.
pub trait BidLedger: Ledger {
    /// Deposit `amount` against `bid_nullifier` from `bidder`.
    fn place_bid(
        &self,
        bidder: &Address,
        bid_nullifier: &Digest,
        amount: Amount,
    ) -> Result<TransactionRef>;

    /// Withdraw the bidder's open bid, returning its nullifier and amount.
    fn withdraw_bid(&self, bidder: &Address) -> Result<(Digest, Amount)>;
}

impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    fn commitment_log(&self) -> Result<Arc<CommitmentLog>> {
        (**self).commitment_log()
    }

    fn active_bids(&self) -> Result<Arc<ActiveBids>> {
        (**self).active_bids()
    }

    fn execute_transfer(
        &self,
        bid_nullifier: &Digest,
        token_nullifier: &Digest,
        funds_receiver: &Address,
    ) -> Result<TransactionRef> {
        (**self).execute_transfer(bid_nullifier, token_nullifier, funds_receiver)
    }

    fn mint(&self, ownership_nullifier: &Digest) -> Result<MintReceipt> {
        (**self).mint(ownership_nullifier)
    }

    fn consumes_atomically(&self) -> bool {
        (**self).consumes_atomically()
    }
}

/// Current Unix time in seconds.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Transaction reference for the `sequence`-th state change of a
/// simulated ledger: `keccak(kind || sequence_be)`.
pub fn transaction_ref(kind: &str, sequence: u64) -> TransactionRef {
    TransactionRef(Digest::from_bytes(keccak::hash_concat(&[
        kind.as_bytes(),
        &sequence.to_be_bytes(),
    ])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_ref_distinct() {
        assert_ne!(transaction_ref("mint", 1), transaction_ref("mint", 2));
        assert_ne!(transaction_ref("mint", 1), transaction_ref("bid", 1));
        assert_eq!(transaction_ref("mint", 1), transaction_ref("mint", 1));
    }

    #[test]
    fn test_nullifier_error_conversion() {
        let n = Digest::from_bytes([0x01; 32]);
        assert_eq!(
            LedgerError::from(NullifierError::DoubleSpend(n)),
            LedgerError::DoubleSpend(n)
        );
        assert!(matches!(
            LedgerError::from(NullifierError::InvalidInput("x".into())),
            LedgerError::Rejected(_)
        ));
    }
}

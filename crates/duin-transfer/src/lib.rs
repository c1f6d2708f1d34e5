//! # duin-transfer
//!
//! The admin-side transfer pipeline. Given an owner's request to sell a
//! token to a bidder, recompute every derived value, check it against the
//! ledger's published state, and only then execute the transfer and mint
//! the replacement token to the receiver.
//!
//! ## Pipeline
//!
//! 1. Parse and sanity-check the request (addresses, token id, digests)
//! 2. Recompute the sender's commitment
//! 3. Require it in the commitment log
//! 4. Recompute the bid nullifier from the receiver's bid secret
//! 5. Require it in the active-bid view
//! 6. Compute the token nullifier
//! 7. Execute the transfer on the ledger
//! 8. Mint to the receiver's fresh ownership nullifier
//!
//! Steps 1-6 never mutate the ledger. Steps 7 and 8 are separate ledger
//! calls; a failure between them surfaces as
//! [`TransferError::PartialCompletion`] and is never retried here.
//!
//! ## Modules
//!
//! - [`request`]: Request, authorization and receipt types
//! - [`validator`]: The validation and execution pipeline

pub mod request;
pub mod validator;

use duin_ledger::LedgerError;
use duin_nullifier::NullifierError;
use duin_types::{Digest, TransactionRef};

pub use request::{AuthorizedTransfer, TransferReceipt, TransferRequest};
pub use validator::TransferValidator;

/// Error types for transfer validation and execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// A request field is malformed or empty.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The recomputed commitment is not in the commitment log.
    #[error("commitment {0} is not in the commitment log")]
    InvalidCommitment(Digest),

    /// The recomputed bid nullifier is not an active bid.
    #[error("bid {0} not found among active bids")]
    BidNotFound(Digest),

    /// The ledger failed or refused the call.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The transfer executed but the replacement mint failed. Needs manual
    /// reconciliation: the token nullifier is consumed and the bid funds
    /// are released, but the receiver holds no commitment yet.
    #[error("transfer {transaction} executed but mint to {receiver_ownership_nullifier} failed: {mint_error}")]
    PartialCompletion {
        transaction: TransactionRef,
        bid_nullifier: Digest,
        token_nullifier: Digest,
        receiver_ownership_nullifier: Digest,
        mint_error: LedgerError,
    },
}

impl TransferError {
    /// Whether retrying after the caller refreshes the ledger view can
    /// succeed. Only a stale active-bid view qualifies.
    pub fn is_retryable_after_refresh(&self) -> bool {
        matches!(self, Self::BidNotFound(_))
    }
}

impl From<NullifierError> for TransferError {
    fn from(err: NullifierError) -> Self {
        match err {
            NullifierError::InvalidInput(msg) => Self::InvalidInput(msg),
            NullifierError::DoubleSpend(n) => Self::Ledger(LedgerError::DoubleSpend(n)),
        }
    }
}

/// Convenience result type for transfer operations.
pub type Result<T> = std::result::Result<T, TransferError>;

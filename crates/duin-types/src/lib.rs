//! # duin-types
//!
//! Shared domain types used across the Duin workspace: digests, token ids,
//! the commitment and bid records mirrored from the ledger, and the
//! receipts the ledger hands back.

pub mod digest;
pub mod receipts;
pub mod records;
pub mod token;

pub use digest::Digest;
pub use receipts::{MintReceipt, TransactionRef};
pub use records::{ActiveBid, BidEvent, BidEventKind, CommitmentRecord};
pub use token::TokenId;

/// Bid amounts in wei.
pub type Amount = u128;

/// Unix epoch seconds. Advisory ordering hint only; never compared for
/// correctness.
pub type Timestamp = u64;

/// Error types for parsing domain values from their text forms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// Not a `0x`-prefixed 32-byte hex digest.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Not a decimal or `0x`-hex integer in `0..2^256`.
    #[error("invalid token id: {0}")]
    InvalidTokenId(String),
}

pub type Result<T> = std::result::Result<T, TypesError>;

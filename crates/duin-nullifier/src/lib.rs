//! # duin-nullifier
//!
//! The commitment/nullifier engine of the anonymous-ownership protocol,
//! plus the consumed-nullifier set ledgers use to reject replays.
//!
//! Every identifier is a pure function of its inputs. The same
//! `(address, secret, token id)` tuple always reproduces the same
//! commitment, which is what lets the admin re-verify a transfer without
//! anything being re-published.
//!
//! ## Derivations
//!
//! ```text
//! identity        = keccak(address || secret)                 (words)
//! commitment      = keccak(ownership_nullifier || token_id)   (32 + 32 bytes)
//! bid nullifier   = keccak(bid_secret || commitment)          (words)
//! token nullifier = keccak(address || secret || commitment)   (words)
//! ```
//!
//! ## Modules
//!
//! - [`derive`]: Identity bindings, commitments and nullifiers
//! - [`spent`]: Exact set of consumed token nullifiers

pub mod derive;
pub mod spent;

pub use derive::{
    derive_bid_nullifier, derive_bid_secret, derive_commitment, derive_identity_binding,
    derive_ownership_nullifier, derive_token_nullifier, hash_words,
};
pub use spent::SpentSet;

use duin_types::Digest;

/// Error types for nullifier operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NullifierError {
    /// Malformed address or empty required field. Detected before hashing.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The nullifier has already been consumed.
    #[error("nullifier {0} already consumed (double-spend detected)")]
    DoubleSpend(Digest),
}

/// Convenience result type for nullifier operations.
pub type Result<T> = std::result::Result<T, NullifierError>;

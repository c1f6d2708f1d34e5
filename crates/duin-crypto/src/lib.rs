//! # duin-crypto
//!
//! Cryptographic primitives for the Duin anonymous-ownership protocol.
//!
//! The suite is fixed: every identifier in the protocol is a Keccak-256
//! digest, and both the client that publishes a value and the admin that
//! re-derives it must hash byte-identical preimages.
//!
//! ## Modules
//!
//! - [`keccak`]: Keccak-256 hashing, word concatenation, hex text form
//! - [`address`]: Ethereum address well-formedness and EIP-55 checksums
//! - [`secret`]: Zeroizing container for user-held secret phrases
//! - [`mnemonic`]: BIP-39 owner secret generation (128-bit entropy)

pub mod address;
pub mod keccak;
pub mod mnemonic;
pub mod secret;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The address is not `0x` followed by 40 hex digits.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Mixed-case address whose casing does not match its EIP-55 checksum.
    #[error("address checksum mismatch: {0}")]
    AddressChecksum(String),

    /// Malformed hex input.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// BIP-39 mnemonic generation or parsing failed.
    #[error("mnemonic error: {0}")]
    Mnemonic(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

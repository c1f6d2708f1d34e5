//! Identity bindings, commitments and nullifiers.
//!
//! All functions are pure and fail closed: a malformed address or an empty
//! secret is rejected with [`NullifierError::InvalidInput`] before anything
//! is hashed. Digest and token-id operands are typed, so "empty" can only
//! arise at the text boundary; [`parse_digest`] and [`parse_token_id`]
//! reject it there.
//!
//! Operand order is part of the protocol. Producer and verifier must call
//! the same function; never reorder arguments.

use duin_crypto::address::Address;
use duin_crypto::keccak;
use duin_crypto::secret::Secret;
use duin_types::{Digest, TokenId};

use crate::{NullifierError, Result};

/// Hash words in order: `keccak(utf8(p0) || utf8(p1) || ...)`.
pub fn hash_words<S: AsRef<str>>(parts: &[S]) -> Digest {
    Digest::from_bytes(keccak::hash_words(parts))
}

/// Bind a secret to an account: `keccak(checksum_address || secret)`.
///
/// This one primitive serves both the owner identity (ownership nullifier)
/// and the bidder identity (bid secret).
///
/// # Errors
///
/// - [`NullifierError::InvalidInput`] if the address is malformed or the
///   secret is empty
pub fn derive_identity_binding(address: &str, secret: &Secret) -> Result<Digest> {
    let address = parse_address("address", address)?;
    require_secret(secret)?;
    Ok(hash_words(&[address.as_str(), secret.expose()]))
}

/// Ownership nullifier for an owner account and owner secret.
///
/// # Errors
///
/// See [`derive_identity_binding`].
pub fn derive_ownership_nullifier(owner_address: &str, owner_secret: &Secret) -> Result<Digest> {
    derive_identity_binding(owner_address, owner_secret)
}

/// Bid secret for a bidder account and bidder secret.
///
/// # Errors
///
/// See [`derive_identity_binding`].
pub fn derive_bid_secret(bidder_address: &str, bidder_secret: &Secret) -> Result<Digest> {
    derive_identity_binding(bidder_address, bidder_secret)
}

/// Commitment to a token: `keccak(nullifier[32] || token_id_be[32])`.
///
/// Matches Solidity `keccak256(abi.encodePacked(bytes32, uint256))`.
pub fn derive_commitment(ownership_nullifier: &Digest, token_id: &TokenId) -> Digest {
    let token_bytes = token_id.to_be_bytes();
    Digest::from_bytes(keccak::hash_concat(&[
        ownership_nullifier.as_bytes(),
        &token_bytes,
    ]))
}

/// Bid nullifier: `keccak(bid_secret_text || commitment_text)`.
///
/// Both operands enter as their `0x` lowercase text forms.
pub fn derive_bid_nullifier(bid_secret: &Digest, commitment: &Digest) -> Digest {
    hash_words(&[bid_secret.to_hex(), commitment.to_hex()])
}

/// Token nullifier: `keccak(checksum_address || secret || commitment_text)`.
///
/// # Errors
///
/// - [`NullifierError::InvalidInput`] if the address is malformed or the
///   secret is empty
pub fn derive_token_nullifier(
    sender_address: &str,
    sender_secret: &Secret,
    commitment: &Digest,
) -> Result<Digest> {
    let address = parse_address("sender address", sender_address)?;
    require_secret(sender_secret)?;
    Ok(hash_words(&[
        address.as_str(),
        sender_secret.expose(),
        commitment.to_hex().as_str(),
    ]))
}

/// Parse an address operand.
///
/// # Errors
///
/// - [`NullifierError::InvalidInput`] naming `field`
pub fn parse_address(field: &str, text: &str) -> Result<Address> {
    if text.is_empty() {
        return Err(NullifierError::InvalidInput(format!("{field} is empty")));
    }
    Address::parse(text).map_err(|e| NullifierError::InvalidInput(format!("{field}: {e}")))
}

/// Parse a digest operand (commitment hash, bid secret, nullifier).
///
/// # Errors
///
/// - [`NullifierError::InvalidInput`] naming `field`
pub fn parse_digest(field: &str, text: &str) -> Result<Digest> {
    if text.trim().is_empty() {
        return Err(NullifierError::InvalidInput(format!("{field} is empty")));
    }
    Digest::parse(text).map_err(|e| NullifierError::InvalidInput(format!("{field}: {e}")))
}

/// Parse a token id operand.
///
/// # Errors
///
/// - [`NullifierError::InvalidInput`] naming `field`
pub fn parse_token_id(field: &str, text: &str) -> Result<TokenId> {
    if text.trim().is_empty() {
        return Err(NullifierError::InvalidInput(format!("{field} is empty")));
    }
    TokenId::parse(text).map_err(|e| NullifierError::InvalidInput(format!("{field}: {e}")))
}

fn require_secret(secret: &Secret) -> Result<()> {
    if secret.expose().trim().is_empty() {
        return Err(NullifierError::InvalidInput("secret is empty".to_string()));
    }
    Ok(())
}

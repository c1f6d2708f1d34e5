//! Keccak-256 hashing for the Duin protocol.
//!
//! This is the original Keccak padding used by the EVM (`keccak256` in
//! Solidity), not NIST SHA3-256. The two differ on every input.
//!
//! ## Encodings
//!
//! - [`hash`] / [`hash_concat`]: raw byte preimages (commitments)
//! - [`hash_words`]: UTF-8 words concatenated with no separator
//!   (identity bindings, bid nullifiers, token nullifiers)
//!
//! Digests have a single text form: `0x` followed by 64 lowercase hex digits.

use sha3::{Digest, Keccak256};

use crate::{CryptoError, Result};

/// Length of a Keccak-256 digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Compute the Keccak-256 hash of the input data.
pub fn hash(data: &[u8]) -> [u8; 32] {
    hash_concat(&[data])
}

/// Hash the concatenation of several byte slices without copying them
/// into one buffer first.
///
/// `hash_concat(&[a, b]) == hash(a || b)`
pub fn hash_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Hash a sequence of words: UTF-8 encode each, concatenate in order, hash.
///
/// `hash_words(["ab", "c"]) == hash_words(["a", "bc"])`; callers that need
/// unambiguous framing must use fixed-width operands.
pub fn hash_words<S: AsRef<str>>(parts: &[S]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part.as_ref().as_bytes());
    }
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Render bytes in the protocol's text form (`0x` + lowercase hex).
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a `0x`-prefixed 32-byte hex string. Either case is accepted.
///
/// # Errors
///
/// - [`CryptoError::InvalidHex`] if the prefix is missing, the length is
///   not 64 hex digits, or a non-hex character is present
pub fn parse_hex32(text: &str) -> Result<[u8; 32]> {
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| CryptoError::InvalidHex(format!("missing 0x prefix: {text:?}")))?;
    if digits.len() != DIGEST_LEN * 2 {
        return Err(CryptoError::InvalidHex(format!(
            "expected {} hex digits, got {}",
            DIGEST_LEN * 2,
            digits.len()
        )));
    }
    let mut out = [0u8; DIGEST_LEN];
    hex::decode_to_slice(digits, &mut out).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_vector() {
        assert_eq!(
            to_hex_prefixed(&hash(b"")),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_abc_vector() {
        // Distinguishes Keccak-256 from SHA3-256 (3a985da7...).
        assert_eq!(
            hex::encode(hash(b"abc")),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn test_hash_words_vector() {
        assert_eq!(
            to_hex_prefixed(&hash_words(&["hello", "world"])),
            "0xfa26db7ca85ead399216e7c6316bc50ed24393c3122b582735e7f3b0f91b93f0"
        );
    }

    #[test]
    fn test_hash_words_is_plain_concatenation() {
        assert_eq!(hash_words(&["hello", "world"]), hash(b"helloworld"));
        assert_eq!(hash_words(&["hel", "lowo", "rld"]), hash(b"helloworld"));
        assert_eq!(hash_words::<&str>(&[]), hash(b""));
    }

    #[test]
    fn test_hash_words_order_sensitive() {
        assert_ne!(hash_words(&["a", "b"]), hash_words(&["b", "a"]));
    }

    #[test]
    fn test_hash_concat_matches_single_buffer() {
        let zeros = [0u8; 64];
        assert_eq!(hash_concat(&[&zeros[..32], &zeros[32..]]), hash(&zeros));
        assert_eq!(
            to_hex_prefixed(&hash(&zeros)),
            "0xad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5"
        );
    }

    #[test]
    fn test_parse_hex32() {
        let text = "0xC5D2460186F7233C927E7DB2DCC703C0E500B653CA82273B7BFAD8045D85A470";
        let bytes = parse_hex32(text).expect("parse");
        assert_eq!(bytes, hash(b""));
        assert_eq!(to_hex_prefixed(&bytes), text.to_ascii_lowercase());
    }

    #[test]
    fn test_parse_hex32_rejects_malformed() {
        assert!(parse_hex32("").is_err());
        assert!(parse_hex32("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470").is_err());
        assert!(parse_hex32("0x1234").is_err());
        assert!(parse_hex32(&format!("0x{}", "zz".repeat(32))).is_err());
    }
}

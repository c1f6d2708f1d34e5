//! Zeroizing container for user-held secret phrases.
//!
//! Owner and bidder secrets only ever exist in memory on the path from the
//! request to the hash function. They are wiped on drop and never appear
//! in `Debug` output or logs.

use std::fmt;

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret phrase (e.g. a BIP-39 mnemonic).
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(transparent)]
pub struct Secret {
    phrase: String,
}

impl Secret {
    /// Wrap a phrase. Surrounding whitespace is kept; callers decide whether
    /// to trim before hashing.
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
        }
    }

    /// Borrow the phrase for hashing.
    pub fn expose(&self) -> &str {
        &self.phrase
    }

    /// Whether the phrase is empty.
    pub fn is_empty(&self) -> bool {
        self.phrase.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = Secret::new("alpha");
        assert_eq!(format!("{secret:?}"), "Secret(<redacted>)");
        assert_eq!(secret.expose(), "alpha");
    }

    #[test]
    fn test_zeroize_clears_phrase() {
        let mut secret = Secret::new("alpha");
        secret.zeroize();
        assert!(secret.is_empty());
    }

    #[test]
    fn test_deserialize_from_plain_string() {
        let secret: Secret = serde_json::from_str("\"beta\"").expect("deserialize");
        assert_eq!(secret.expose(), "beta");
    }
}

//! Ethereum address well-formedness and EIP-55 checksums.
//!
//! Every address that enters a derivation is parsed into an [`Address`],
//! which stores the checksummed text form. Identity bindings hash that
//! canonical form, so `0xabc…` and `0xAbC…` spellings of the same account
//! bind to the same identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::keccak;
use crate::{CryptoError, Result};

/// Number of hex digits in an address (20 bytes).
pub const ADDRESS_HEX_LEN: usize = 40;

/// A validated, EIP-55 checksummed Ethereum address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and canonicalise an address.
    ///
    /// Accepts `0x` + 40 hex digits. All-lowercase and all-uppercase digits
    /// are taken as unchecksummed; mixed case must match EIP-55.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::InvalidAddress`] on wrong prefix, length or characters
    /// - [`CryptoError::AddressChecksum`] on a mixed-case checksum mismatch
    pub fn parse(text: &str) -> Result<Self> {
        let digits = text
            .strip_prefix("0x")
            .ok_or_else(|| CryptoError::InvalidAddress(format!("missing 0x prefix: {text:?}")))?;
        if digits.len() != ADDRESS_HEX_LEN || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CryptoError::InvalidAddress(format!(
                "expected {ADDRESS_HEX_LEN} hex digits: {text:?}"
            )));
        }

        let checksummed = checksum_digits(digits);
        let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper && digits != checksummed {
            return Err(CryptoError::AddressChecksum(text.to_string()));
        }

        Ok(Self(format!("0x{checksummed}")))
    }

    /// The checksummed text form, e.g. `0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Check whether `text` is a well-formed address.
pub fn is_valid_address(text: &str) -> bool {
    Address::parse(text).is_ok()
}

/// Apply EIP-55 casing to 40 hex digits (no prefix).
///
/// Digit `i` is uppercased when nibble `i` of `keccak256(lowercase_hex)` is >= 8.
fn checksum_digits(digits: &str) -> String {
    let lower = digits.to_ascii_lowercase();
    let digest = keccak::hash(lower.as_bytes());
    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let byte = digest[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = CryptoError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known dev-chain accounts with published EIP-55 forms.
    const ALICE: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const BOB: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const CAROL: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

    #[test]
    fn test_checksum_from_lowercase() {
        for addr in [ALICE, BOB, CAROL] {
            let parsed = Address::parse(&addr.to_ascii_lowercase()).expect("parse");
            assert_eq!(parsed.as_str(), addr);
        }
    }

    #[test]
    fn test_checksum_from_uppercase_digits() {
        let upper = format!("0x{}", ALICE[2..].to_ascii_uppercase());
        assert_eq!(Address::parse(&upper).expect("parse").as_str(), ALICE);
    }

    #[test]
    fn test_correct_checksum_accepted() {
        assert_eq!(Address::parse(BOB).expect("parse").as_str(), BOB);
    }

    #[test]
    fn test_bad_checksum_rejected() {
        // Flip the case of one letter in a valid mixed-case address.
        let bad = ALICE.replacen("0xf39Fd", "0xf39fd", 1);
        assert!(matches!(
            Address::parse(&bad),
            Err(CryptoError::AddressChecksum(_))
        ));
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("0xA"));
        assert!(!is_valid_address("f39fd6e51aad88f6f4ce6ab8827279cfffb92266"));
        assert!(!is_valid_address("0xf39fd6e51aad88f6f4ce6ab8827279cfffb9226"));
        assert!(!is_valid_address("0xg39fd6e51aad88f6f4ce6ab8827279cfffb92266"));
        assert!(is_valid_address(CAROL));
    }

    #[test]
    fn test_serde_uses_checksummed_string() {
        let addr: Address =
            serde_json::from_str(&format!("\"{}\"", BOB.to_ascii_lowercase())).expect("deserialize");
        assert_eq!(serde_json::to_string(&addr).expect("serialize"), format!("\"{BOB}\""));
        assert!(serde_json::from_str::<Address>("\"0x1234\"").is_err());
    }
}

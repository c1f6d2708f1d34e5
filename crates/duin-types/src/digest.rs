//! 32-byte Keccak-256 digests.

use std::fmt;
use std::str::FromStr;

use duin_crypto::keccak;
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{Result, TypesError};

/// A 32-byte protocol identifier (commitment, nullifier, bid secret, tx hash).
///
/// Text form is `0x` + 64 lowercase hex digits, which is also the form fed
/// into [`keccak::hash_words`] when a digest is an operand of another
/// derivation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Wrap raw digest bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The canonical text form (`0x` + lowercase hex).
    pub fn to_hex(&self) -> String {
        keccak::to_hex_prefixed(&self.0)
    }

    /// Parse the text form. Either hex case is accepted.
    ///
    /// # Errors
    ///
    /// - [`TypesError::InvalidDigest`] if the text is not `0x` + 64 hex digits
    pub fn parse(text: &str) -> Result<Self> {
        keccak::parse_hex32(text.trim())
            .map(Self)
            .map_err(|e| TypesError::InvalidDigest(e.to_string()))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

impl FromStr for Digest {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

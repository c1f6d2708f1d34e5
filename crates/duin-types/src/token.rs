//! 256-bit token ids.
//!
//! The contract's `uint256 tokenId` is held as 32 big-endian bytes, the
//! exact operand layout of `abi.encodePacked(bytes32, uint256)`. Text form
//! is decimal (what the ledger emits); parsing also accepts `0x` hex.

use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::{Result, TypesError};

/// An unsigned 256-bit token id.
///
/// Ordering follows the numeric value because the bytes are big-endian.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, SerializeDisplay, DeserializeFromStr)]
pub struct TokenId([u8; 32]);

impl TokenId {
    /// Build from a small integer.
    pub fn from_u64(value: u64) -> Self {
        let mut out = [0u8; 32];
        out[24..].copy_from_slice(&value.to_be_bytes());
        Self(out)
    }

    /// Build from 32 big-endian bytes.
    pub const fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The 32-byte big-endian encoding hashed into commitments.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// The next id, or `None` at 2^256 - 1.
    pub fn checked_next(&self) -> Option<Self> {
        let mut out = self.0;
        for byte in out.iter_mut().rev() {
            let (sum, overflow) = byte.overflowing_add(1);
            *byte = sum;
            if !overflow {
                return Some(Self(out));
            }
        }
        None
    }

    /// Parse decimal (`"1"`) or `0x`-prefixed hex (`"0x01"`).
    ///
    /// # Errors
    ///
    /// - [`TypesError::InvalidTokenId`] on empty input, signs, non-digits,
    ///   or values that do not fit in 256 bits
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let parsed = match text.strip_prefix("0x") {
            Some(digits) => parse_hex(digits),
            None => parse_decimal(text),
        };
        parsed
            .map(Self)
            .ok_or_else(|| TypesError::InvalidTokenId(text.to_string()))
    }
}

fn parse_decimal(digits: &str) -> Option<[u8; 32]> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut out = [0u8; 32];
    for b in digits.bytes() {
        let mut carry = u32::from(b - b'0');
        for byte in out.iter_mut().rev() {
            let v = u32::from(*byte) * 10 + carry;
            *byte = (v & 0xff) as u8;
            carry = v >> 8;
        }
        if carry != 0 {
            return None;
        }
    }
    Some(out)
}

fn parse_hex(digits: &str) -> Option<[u8; 32]> {
    if digits.is_empty() || digits.len() > 64 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let padded = format!("{digits:0>64}");
    let mut out = [0u8; 32];
    hex::decode_to_slice(padded, &mut out).ok()?;
    Some(out)
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n = self.0;
        let mut digits = Vec::new();
        loop {
            let mut rem = 0u32;
            for byte in n.iter_mut() {
                let v = (rem << 8) | u32::from(*byte);
                *byte = (v / 10) as u8;
                rem = v % 10;
            }
            digits.push(char::from(b'0' + rem as u8));
            if n.iter().all(|b| *b == 0) {
                break;
            }
        }
        let text: String = digits.iter().rev().collect();
        f.write_str(&text)
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({self})")
    }
}

impl FromStr for TokenId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<u64> for TokenId {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

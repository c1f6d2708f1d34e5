//! BIP-39 owner secrets.
//!
//! An owner secret is a 12-word English mnemonic generated client-side from
//! 128 bits of OS entropy. The phrase itself (not the BIP-39 seed) is the
//! secret that enters identity bindings, so the words must be reproduced
//! exactly, single-space separated, to re-derive the same identifiers.

use bip39::{Language, Mnemonic};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::secret::Secret;
use crate::{CryptoError, Result};

/// Entropy for a fresh owner secret (128 bits, 12 words).
pub const OWNER_SECRET_ENTROPY_BYTES: usize = 16;

/// Generate a fresh owner secret.
///
/// # Errors
///
/// - [`CryptoError::Mnemonic`] if the mnemonic encoder rejects the entropy
pub fn generate_owner_secret() -> Result<Secret> {
    let mut entropy = [0u8; OWNER_SECRET_ENTROPY_BYTES];
    OsRng.fill_bytes(&mut entropy);
    let secret = secret_from_entropy(&entropy);
    entropy.zeroize();
    secret
}

/// Encode raw entropy as an English mnemonic secret.
///
/// # Errors
///
/// - [`CryptoError::Mnemonic`] if the entropy length is not a multiple of
///   32 bits between 128 and 256
pub fn secret_from_entropy(entropy: &[u8]) -> Result<Secret> {
    let mnemonic = Mnemonic::from_entropy_in(Language::English, entropy)
        .map_err(|e| CryptoError::Mnemonic(e.to_string()))?;
    Ok(Secret::new(mnemonic.to_string()))
}

/// Check that a phrase is a valid English BIP-39 mnemonic (word list and
/// checksum).
///
/// # Errors
///
/// - [`CryptoError::Mnemonic`] on unknown words, bad word count, or a
///   checksum mismatch
pub fn validate_mnemonic(phrase: &str) -> Result<()> {
    Mnemonic::parse_in_normalized(Language::English, phrase)
        .map(|_| ())
        .map_err(|e| CryptoError::Mnemonic(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_entropy_vector() {
        let secret = secret_from_entropy(&[0u8; 16]).expect("encode");
        assert_eq!(
            secret.expose(),
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about"
        );
    }

    #[test]
    fn test_generate_owner_secret() {
        let secret = generate_owner_secret().expect("generate");
        assert_eq!(secret.expose().split(' ').count(), 12);
        validate_mnemonic(secret.expose()).expect("generated phrase must validate");
    }

    #[test]
    fn test_generated_secrets_differ() {
        let a = generate_owner_secret().expect("generate");
        let b = generate_owner_secret().expect("generate");
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_rejects_bad_checksum() {
        let phrase = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";
        assert!(validate_mnemonic(phrase).is_err());
        assert!(validate_mnemonic("alpha").is_err());
    }

    #[test]
    fn test_bad_entropy_length() {
        assert!(secret_from_entropy(&[0u8; 15]).is_err());
    }
}

//! Test vector generator for the Duin commitment/nullifier protocol.
//!
//! Generates `test_vectors.json` with every derivation the client, the
//! contract and the admin must agree on. Each generated output is also
//! checked against a pinned value, so a regression in the hashing code
//! fails here before it reaches a fixture.
//!
//! Usage:
//!   duin-testvec                  # Generate tests/fixtures/test_vectors.json
//!   duin-testvec --verify         # Verify an existing file against a fresh run
//!   duin-testvec [--verify] PATH  # Same, with an explicit path

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use duin_crypto::keccak;
use duin_crypto::secret::Secret;
use duin_nullifier::{
    derive_bid_nullifier, derive_bid_secret, derive_commitment, derive_ownership_nullifier,
    derive_token_nullifier, hash_words,
};
use duin_types::TokenId;
use serde::{Deserialize, Serialize};

const DEFAULT_PATH: &str = "tests/fixtures/test_vectors.json";

const OWNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
const BIDDER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

/// Known-good outputs, keyed by `vector/output`.
const PINNED: &[(&str, &str)] = &[
    (
        "keccak_empty/hash",
        "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470",
    ),
    (
        "keccak_zero_words/hash",
        "0xad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5",
    ),
    (
        "hash_words_hello_world/hash",
        "0xfa26db7ca85ead399216e7c6316bc50ed24393c3122b582735e7f3b0f91b93f0",
    ),
    (
        "ownership_nullifier/nullifier",
        "0x8c01d4b950e14439bdae7de3fe4ec8161d9183910d243e79d304b6de61c4ec5f",
    ),
    (
        "commitment_token_1/commitment",
        "0x554f198dc946ce841f15b7804319b9c1210a22ba19f065f10bee80bedae9745a",
    ),
    (
        "commitment_token_2/commitment",
        "0x0138d7f2686843dde952698bc00348350a8411af6c8ccdfbd2ce265c068fd796",
    ),
    (
        "bid_secret/bid_secret",
        "0xebd0c9651ea19cee50a3b10e7be33b9ea4d7a1b7c543a908cd9eb73b5b4703e1",
    ),
    (
        "bid_nullifier/bid_nullifier",
        "0x9fe91bf19b2ecee59f40bcc08729dc8ee6372af8a24ff587dd7890fd895a9522",
    ),
    (
        "token_nullifier/token_nullifier",
        "0x57463bbf959c38d046ec3101f7d0cd8401ef00329e146724dea01b05c5d82c2f",
    ),
    (
        "owner_secret_zero_entropy/mnemonic",
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
    ),
];

#[derive(Serialize, Deserialize)]
struct TestVectors {
    version: String,
    generated_by: String,
    vectors: BTreeMap<String, TestVector>,
}

#[derive(Serialize, Deserialize)]
struct TestVector {
    description: String,
    inputs: BTreeMap<String, String>,
    outputs: BTreeMap<String, String>,
}

fn vector(description: &str, inputs: &[(&str, String)], outputs: &[(&str, String)]) -> TestVector {
    let collect = |pairs: &[(&str, String)]| -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    };
    TestVector {
        description: description.to_string(),
        inputs: collect(inputs),
        outputs: collect(outputs),
    }
}

fn generate_keccak_vectors() -> BTreeMap<String, TestVector> {
    let mut vectors = BTreeMap::new();

    vectors.insert(
        "keccak_empty".to_string(),
        vector(
            "Keccak-256(\"\") (original padding, not SHA3-256)",
            &[("data", String::new())],
            &[("hash", keccak::to_hex_prefixed(&keccak::hash(b"")))],
        ),
    );

    // Two zero words: the shape of a commitment preimage.
    vectors.insert(
        "keccak_zero_words".to_string(),
        vector(
            "Keccak-256(0x00*64)",
            &[("data", hex::encode([0u8; 64]))],
            &[("hash", keccak::to_hex_prefixed(&keccak::hash(&[0u8; 64])))],
        ),
    );

    vectors.insert(
        "hash_words_hello_world".to_string(),
        vector(
            "hashWords([\"hello\", \"world\"]): UTF-8 concatenation, no separators",
            &[("parts", "hello,world".to_string())],
            &[("hash", hash_words(&["hello", "world"]).to_hex())],
        ),
    );

    vectors
}

fn generate_protocol_vectors() -> anyhow::Result<BTreeMap<String, TestVector>> {
    let mut vectors = BTreeMap::new();
    let owner_secret = Secret::new("alpha");
    let bidder_secret = Secret::new("beta");

    let ownership = derive_ownership_nullifier(OWNER, &owner_secret)?;
    vectors.insert(
        "ownership_nullifier".to_string(),
        vector(
            "hashWords([checksumAddress, secret])",
            &[("address", OWNER.to_string()), ("secret", "alpha".to_string())],
            &[("nullifier", ownership.to_hex())],
        ),
    );

    let commitment = derive_commitment(&ownership, &TokenId::from_u64(1));
    vectors.insert(
        "commitment_token_1".to_string(),
        vector(
            "Keccak-256(ownershipNullifier[32] || tokenId[32, big-endian])",
            &[
                ("ownership_nullifier", ownership.to_hex()),
                ("token_id", "1".to_string()),
            ],
            &[("commitment", commitment.to_hex())],
        ),
    );

    let commitment_2 = derive_commitment(&ownership, &TokenId::from_u64(2));
    vectors.insert(
        "commitment_token_2".to_string(),
        vector(
            "Same owner, token 2: commitments differ per token",
            &[
                ("ownership_nullifier", ownership.to_hex()),
                ("token_id", "2".to_string()),
            ],
            &[("commitment", commitment_2.to_hex())],
        ),
    );

    let bid_secret = derive_bid_secret(BIDDER, &bidder_secret)?;
    vectors.insert(
        "bid_secret".to_string(),
        vector(
            "hashWords([checksumAddress, secret]) for the bidder",
            &[("address", BIDDER.to_string()), ("secret", "beta".to_string())],
            &[("bid_secret", bid_secret.to_hex())],
        ),
    );

    vectors.insert(
        "bid_nullifier".to_string(),
        vector(
            "hashWords([bidSecret hex, commitment hex])",
            &[
                ("bid_secret", bid_secret.to_hex()),
                ("commitment", commitment.to_hex()),
            ],
            &[("bid_nullifier", derive_bid_nullifier(&bid_secret, &commitment).to_hex())],
        ),
    );

    let token_nullifier = derive_token_nullifier(OWNER, &owner_secret, &commitment)?;
    vectors.insert(
        "token_nullifier".to_string(),
        vector(
            "hashWords([checksumAddress, secret, commitment hex])",
            &[
                ("address", OWNER.to_string()),
                ("secret", "alpha".to_string()),
                ("commitment", commitment.to_hex()),
            ],
            &[("token_nullifier", token_nullifier.to_hex())],
        ),
    );

    let mnemonic = duin_crypto::mnemonic::secret_from_entropy(&[0u8; 16])?;
    vectors.insert(
        "owner_secret_zero_entropy".to_string(),
        vector(
            "BIP-39 English mnemonic from 128 zero bits",
            &[("entropy", hex::encode([0u8; 16]))],
            &[("mnemonic", mnemonic.expose().to_string())],
        ),
    );

    Ok(vectors)
}

fn generate_all_vectors() -> anyhow::Result<TestVectors> {
    let mut all_vectors = BTreeMap::new();

    all_vectors.extend(generate_keccak_vectors());
    all_vectors.extend(generate_protocol_vectors()?);

    Ok(TestVectors {
        version: "1.0".to_string(),
        generated_by: "duin-testvec".to_string(),
        vectors: all_vectors,
    })
}

/// Check generated outputs against [`PINNED`].
fn check_pinned(vectors: &TestVectors) -> bool {
    let mut all_pass = true;
    for (key, expected) in PINNED {
        let (name, output) = key.split_once('/').unwrap_or((*key, ""));
        let actual = vectors
            .vectors
            .get(name)
            .and_then(|v| v.outputs.get(output));
        if actual.map(String::as_str) != Some(*expected) {
            eprintln!("PINNED FAIL: {key}");
            eprintln!("  expected: {expected}");
            eprintln!("  actual:   {actual:?}");
            all_pass = false;
        }
    }
    all_pass
}

/// Compare a stored file against a fresh generation.
fn verify_vectors(stored: &TestVectors, regenerated: &TestVectors) -> bool {
    let mut all_pass = true;

    for (name, expected) in &stored.vectors {
        if let Some(actual) = regenerated.vectors.get(name) {
            if actual.outputs != expected.outputs {
                eprintln!("FAIL: {name}");
                eprintln!("  expected: {:?}", expected.outputs);
                eprintln!("  actual:   {:?}", actual.outputs);
                all_pass = false;
            } else {
                eprintln!("PASS: {name}");
            }
        } else {
            eprintln!("MISSING: {name}");
            all_pass = false;
        }
    }

    all_pass
}

fn write_vectors(path: &Path, vectors: &TestVectors) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(vectors)?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let verify = args.iter().any(|a| a == "--verify");
    let path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map_or_else(|| PathBuf::from(DEFAULT_PATH), PathBuf::from);

    let vectors = generate_all_vectors()?;
    if !check_pinned(&vectors) {
        bail!("generated vectors disagree with pinned values");
    }

    if verify {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => {
                eprintln!("No existing test vectors found at {}. Generating...", path.display());
                write_vectors(&path, &vectors)?;
                eprintln!("Generated test vectors to {}", path.display());
                return Ok(());
            }
        };
        let stored: TestVectors = serde_json::from_str(&content)
            .with_context(|| format!("parse {}", path.display()))?;
        if !verify_vectors(&stored, &vectors) {
            bail!("test vector verification failed");
        }
        eprintln!("All test vectors verified successfully.");
    } else {
        write_vectors(&path, &vectors)?;
        eprintln!("Generated {} test vectors to {}", vectors.vectors.len(), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_vectors_match_pinned() {
        let vectors = generate_all_vectors().expect("generate");
        assert!(check_pinned(&vectors));
        assert_eq!(vectors.vectors.len(), PINNED.len());
    }

    #[test]
    fn test_verify_detects_drift() {
        let fresh = generate_all_vectors().expect("generate");
        let mut stored = generate_all_vectors().expect("generate");
        assert!(verify_vectors(&stored, &fresh));

        if let Some(v) = stored.vectors.get_mut("bid_nullifier") {
            v.outputs.insert("bid_nullifier".into(), "0x00".into());
        }
        assert!(!verify_vectors(&stored, &fresh));
    }

    #[test]
    fn test_json_round_trip() {
        let vectors = generate_all_vectors().expect("generate");
        let json = serde_json::to_string(&vectors).expect("serialize");
        let back: TestVectors = serde_json::from_str(&json).expect("parse");
        assert!(verify_vectors(&back, &vectors));
    }
}

//! SQL schema definitions.
//!
//! Digests and token ids are stored as 32-byte BLOBs (token ids big-endian,
//! so BLOB ordering is numeric ordering). Amounts are decimal TEXT because
//! they exceed SQLite's 64-bit integers.

/// Complete schema for the v1 ledger database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Ledger counters
-- ============================================================

CREATE TABLE IF NOT EXISTS ledger_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    sequence INTEGER NOT NULL DEFAULT 0,
    last_timestamp INTEGER NOT NULL DEFAULT 0
);

-- ============================================================
-- Commitment log (NftMinted)
-- ============================================================

CREATE TABLE IF NOT EXISTS commitments (
    token_id BLOB PRIMARY KEY,
    commitment_hash BLOB NOT NULL UNIQUE,
    timestamp INTEGER NOT NULL,
    sequence INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_commitments_timestamp ON commitments(timestamp, sequence);

-- ============================================================
-- Bid event log and open bids
-- ============================================================

CREATE TABLE IF NOT EXISTS bid_events (
    sequence INTEGER PRIMARY KEY,
    id TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL CHECK (kind IN ('placed', 'withdrawn', 'accepted')),
    bid_nullifier BLOB NOT NULL,
    bidder TEXT NOT NULL,
    amount TEXT NOT NULL,
    timestamp INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS open_bids (
    bid_nullifier BLOB PRIMARY KEY,
    bidder TEXT NOT NULL UNIQUE,
    amount TEXT NOT NULL,
    placed_at INTEGER NOT NULL
);

-- ============================================================
-- Consumed token nullifiers and executed transfers
-- ============================================================

CREATE TABLE IF NOT EXISTS spent_token_nullifiers (
    nullifier BLOB PRIMARY KEY,
    spent_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS transfers (
    tx_ref BLOB PRIMARY KEY,
    token_nullifier BLOB NOT NULL UNIQUE REFERENCES spent_token_nullifiers(nullifier),
    bid_nullifier BLOB NOT NULL,
    funds_receiver TEXT NOT NULL,
    amount TEXT NOT NULL,
    timestamp INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transfers_receiver ON transfers(funds_receiver);
"#;

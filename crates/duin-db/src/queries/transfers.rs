//! Token-nullifier consumption and transfer records.

use duin_crypto::address::Address;
use duin_types::{Amount, Digest, Timestamp, TransactionRef};
use rusqlite::Connection;

use crate::queries::amount_from_text;
use crate::{DbError, Result};

/// Consume a token nullifier.
///
/// Returns `false` if it was already consumed. The primary key makes this
/// the test-and-set; call it inside the transaction that records the
/// transfer.
pub fn consume_nullifier(conn: &Connection, nullifier: &Digest, spent_at: Timestamp) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO spent_token_nullifiers (nullifier, spent_at) VALUES (?1, ?2)",
        rusqlite::params![nullifier.as_bytes().as_slice(), spent_at as i64],
    )?;
    Ok(inserted == 1)
}

/// Whether a token nullifier has been consumed.
pub fn is_consumed(conn: &Connection, nullifier: &Digest) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM spent_token_nullifiers WHERE nullifier = ?1",
        [nullifier.as_bytes().as_slice()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// An executed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRow {
    pub tx_ref: TransactionRef,
    pub token_nullifier: Digest,
    pub bid_nullifier: Digest,
    pub funds_receiver: Address,
    pub amount: Amount,
    pub timestamp: Timestamp,
}

/// Record an executed transfer. The token nullifier must already be consumed.
pub fn insert(conn: &Connection, row: &TransferRow) -> Result<()> {
    conn.execute(
        "INSERT INTO transfers (tx_ref, token_nullifier, bid_nullifier, funds_receiver, amount, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            row.tx_ref.0.as_bytes().as_slice(),
            row.token_nullifier.as_bytes().as_slice(),
            row.bid_nullifier.as_bytes().as_slice(),
            row.funds_receiver.as_str(),
            row.amount.to_string(),
            row.timestamp as i64,
        ],
    )?;
    Ok(())
}

/// Total funds released to a receiver.
pub fn released_to(conn: &Connection, receiver: &Address) -> Result<Amount> {
    let mut stmt = conn.prepare("SELECT amount FROM transfers WHERE funds_receiver = ?1")?;
    let amounts = stmt
        .query_map([receiver.as_str()], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    amounts.iter().try_fold(0u128, |total, text| {
        total
            .checked_add(amount_from_text(text)?)
            .ok_or_else(|| DbError::Serialization("released amount overflows".into()))
    })
}

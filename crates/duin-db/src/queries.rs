//! Database query functions organized by table.
//!
//! Rows are read as raw columns and decoded here, so a corrupt value
//! surfaces as [`DbError::Serialization`] instead of a panic.

pub mod bids;
pub mod commitments;
pub mod transfers;

use duin_crypto::address::Address;
use duin_types::{Amount, BidEventKind, Digest, Timestamp, TokenId};
use rusqlite::Connection;

use crate::{DbError, Result};

/// Advance the ledger sequence and return `(sequence, timestamp)`.
///
/// The timestamp never goes backwards, even if the wall clock does.
pub fn next_sequence(conn: &Connection, now: Timestamp) -> Result<(u64, Timestamp)> {
    conn.execute(
        "UPDATE ledger_meta
         SET sequence = sequence + 1, last_timestamp = MAX(last_timestamp, ?1)
         WHERE id = 1",
        [now as i64],
    )?;
    let (sequence, timestamp): (i64, i64) = conn.query_row(
        "SELECT sequence, last_timestamp FROM ledger_meta WHERE id = 1",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok((sequence as u64, timestamp as u64))
}

pub(crate) fn digest_from_blob(column: &str, blob: Vec<u8>) -> Result<Digest> {
    let bytes: [u8; 32] = blob
        .try_into()
        .map_err(|b: Vec<u8>| DbError::Serialization(format!("{column}: {} bytes", b.len())))?;
    Ok(Digest::from_bytes(bytes))
}

pub(crate) fn token_id_from_blob(blob: Vec<u8>) -> Result<TokenId> {
    let bytes: [u8; 32] = blob
        .try_into()
        .map_err(|b: Vec<u8>| DbError::Serialization(format!("token_id: {} bytes", b.len())))?;
    Ok(TokenId::from_be_bytes(bytes))
}

pub(crate) fn address_from_text(column: &str, text: &str) -> Result<Address> {
    Address::parse(text).map_err(|e| DbError::Serialization(format!("{column}: {e}")))
}

pub(crate) fn amount_from_text(text: &str) -> Result<Amount> {
    text.parse()
        .map_err(|e: std::num::ParseIntError| DbError::Serialization(format!("amount: {e}")))
}

pub(crate) fn kind_as_str(kind: BidEventKind) -> &'static str {
    match kind {
        BidEventKind::Placed => "placed",
        BidEventKind::Withdrawn => "withdrawn",
        BidEventKind::Accepted => "accepted",
    }
}

pub(crate) fn kind_from_str(text: &str) -> Result<BidEventKind> {
    match text {
        "placed" => Ok(BidEventKind::Placed),
        "withdrawn" => Ok(BidEventKind::Withdrawn),
        "accepted" => Ok(BidEventKind::Accepted),
        other => Err(DbError::Serialization(format!("bid event kind '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_monotonic() {
        let conn = crate::open_memory().expect("open");
        assert_eq!(next_sequence(&conn, 100).expect("seq"), (1, 100));
        assert_eq!(next_sequence(&conn, 50).expect("seq"), (2, 100));
        assert_eq!(next_sequence(&conn, 120).expect("seq"), (3, 120));
    }

    #[test]
    fn test_short_blob_refused() {
        assert!(matches!(
            digest_from_blob("commitment_hash", vec![0u8; 31]),
            Err(DbError::Serialization(_))
        ));
        assert!(token_id_from_blob(vec![0u8; 33]).is_err());
    }

    #[test]
    fn test_kind_text() {
        for kind in [
            BidEventKind::Placed,
            BidEventKind::Withdrawn,
            BidEventKind::Accepted,
        ] {
            assert_eq!(kind_from_str(kind_as_str(kind)).expect("kind"), kind);
        }
        assert!(kind_from_str("cancelled").is_err());
    }
}

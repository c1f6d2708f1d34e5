//! Bid event log and open-bid queries.

use duin_crypto::address::Address;
use duin_types::{Amount, BidEvent, Digest, Timestamp};
use rusqlite::{Connection, OptionalExtension};

use crate::queries::{
    address_from_text, amount_from_text, digest_from_blob, kind_as_str, kind_from_str,
};
use crate::{DbError, Result};

/// Append a bid event.
pub fn insert_event(conn: &Connection, sequence: u64, event: &BidEvent) -> Result<()> {
    conn.execute(
        "INSERT INTO bid_events (sequence, id, kind, bid_nullifier, bidder, amount, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            sequence as i64,
            event.id,
            kind_as_str(event.kind),
            event.bid_nullifier.as_bytes().as_slice(),
            event.bidder.as_str(),
            event.amount.to_string(),
            event.timestamp as i64,
        ],
    )?;
    Ok(())
}

/// All bid events in ledger order.
pub fn all_events(conn: &Connection) -> Result<Vec<BidEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, bid_nullifier, bidder, amount, timestamp
         FROM bid_events ORDER BY sequence ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Vec<u8>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, kind, bid_nullifier, bidder, amount, timestamp)| {
            Ok(BidEvent {
                id,
                kind: kind_from_str(&kind)?,
                bid_nullifier: digest_from_blob("bid_nullifier", bid_nullifier)?,
                bidder: address_from_text("bidder", &bidder)?,
                amount: amount_from_text(&amount)?,
                timestamp: timestamp as u64,
            })
        })
        .collect()
}

/// Open a bid. One open bid per nullifier and per bidder.
pub fn insert_open(
    conn: &Connection,
    bid_nullifier: &Digest,
    bidder: &Address,
    amount: Amount,
    placed_at: Timestamp,
) -> Result<()> {
    conn.execute(
        "INSERT INTO open_bids (bid_nullifier, bidder, amount, placed_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            bid_nullifier.as_bytes().as_slice(),
            bidder.as_str(),
            amount.to_string(),
            placed_at as i64,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(format!("bid {bid_nullifier} or bidder {bidder} already open"))
        }
        other => DbError::Sqlite(other),
    })?;
    Ok(())
}

/// The open bid for a nullifier: `(bidder, amount)`.
pub fn open_by_nullifier(
    conn: &Connection,
    bid_nullifier: &Digest,
) -> Result<Option<(Address, Amount)>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT bidder, amount FROM open_bids WHERE bid_nullifier = ?1",
            [bid_nullifier.as_bytes().as_slice()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    row.map(|(bidder, amount)| {
        Ok((address_from_text("bidder", &bidder)?, amount_from_text(&amount)?))
    })
    .transpose()
}

/// The open bid sent by a bidder: `(bid_nullifier, amount)`.
pub fn open_by_bidder(conn: &Connection, bidder: &Address) -> Result<Option<(Digest, Amount)>> {
    let row: Option<(Vec<u8>, String)> = conn
        .query_row(
            "SELECT bid_nullifier, amount FROM open_bids WHERE bidder = ?1",
            [bidder.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    row.map(|(nullifier, amount)| {
        Ok((
            digest_from_blob("bid_nullifier", nullifier)?,
            amount_from_text(&amount)?,
        ))
    })
    .transpose()
}

/// Close a bid. Returns whether it was open.
pub fn remove_open(conn: &Connection, bid_nullifier: &Digest) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM open_bids WHERE bid_nullifier = ?1",
        [bid_nullifier.as_bytes().as_slice()],
    )?;
    Ok(removed == 1)
}

#[cfg(test)]
mod tests {
    use duin_types::BidEventKind;

    use super::*;

    const BIDDER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const CAROL: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn address(text: &str) -> Address {
        Address::parse(text).expect("address")
    }

    #[test]
    fn test_events_in_order() {
        let conn = test_db();
        let placed = BidEvent {
            id: "local_1_0".into(),
            kind: BidEventKind::Placed,
            bid_nullifier: Digest::from_bytes([0x0a; 32]),
            bidder: address(BIDDER),
            amount: u128::from(u64::MAX) * 4,
            timestamp: 100,
        };
        let withdrawn = BidEvent {
            id: "local_2_0".into(),
            kind: BidEventKind::Withdrawn,
            timestamp: 90,
            ..placed.clone()
        };
        insert_event(&conn, 1, &placed).expect("insert");
        insert_event(&conn, 2, &withdrawn).expect("insert");
        assert_eq!(all_events(&conn).expect("list"), vec![placed, withdrawn]);
    }

    #[test]
    fn test_duplicate_event_id_refused() {
        let conn = test_db();
        let event = BidEvent {
            id: "dup".into(),
            kind: BidEventKind::Placed,
            bid_nullifier: Digest::from_bytes([0x0a; 32]),
            bidder: address(BIDDER),
            amount: 1,
            timestamp: 1,
        };
        insert_event(&conn, 1, &event).expect("insert");
        assert!(insert_event(&conn, 2, &event).is_err());
    }

    #[test]
    fn test_open_bid_lifecycle() {
        let conn = test_db();
        let bid = Digest::from_bytes([0x0a; 32]);
        let bidder = address(BIDDER);
        insert_open(&conn, &bid, &bidder, 7, 100).expect("open");

        assert_eq!(
            open_by_nullifier(&conn, &bid).expect("query"),
            Some((bidder.clone(), 7))
        );
        assert_eq!(open_by_bidder(&conn, &bidder).expect("query"), Some((bid, 7)));
        assert_eq!(open_by_bidder(&conn, &address(CAROL)).expect("query"), None);

        assert!(remove_open(&conn, &bid).expect("remove"));
        assert!(!remove_open(&conn, &bid).expect("remove"));
        assert_eq!(open_by_nullifier(&conn, &bid).expect("query"), None);
    }

    #[test]
    fn test_second_bid_per_bidder_refused() {
        let conn = test_db();
        let bidder = address(BIDDER);
        insert_open(&conn, &Digest::from_bytes([0x0a; 32]), &bidder, 1, 100).expect("open");
        assert!(matches!(
            insert_open(&conn, &Digest::from_bytes([0x0b; 32]), &bidder, 1, 100),
            Err(DbError::Constraint(_))
        ));
    }
}

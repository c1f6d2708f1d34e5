//! Commitment log queries.

use duin_types::{CommitmentRecord, TokenId};
use rusqlite::{Connection, OptionalExtension};

use crate::queries::{digest_from_blob, token_id_from_blob};
use crate::{DbError, Result};

/// Insert a minted commitment.
pub fn insert(conn: &Connection, record: &CommitmentRecord, sequence: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO commitments (token_id, commitment_hash, timestamp, sequence)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            record.token_id.to_be_bytes().as_slice(),
            record.commitment_hash.as_bytes().as_slice(),
            record.timestamp as i64,
            sequence as i64,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(format!("commitment for token {} already exists", record.token_id))
        }
        other => DbError::Sqlite(other),
    })?;
    Ok(())
}

/// All commitments, oldest first.
pub fn all(conn: &Connection) -> Result<Vec<CommitmentRecord>> {
    let mut stmt = conn.prepare(
        "SELECT token_id, commitment_hash, timestamp
         FROM commitments ORDER BY timestamp ASC, sequence ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, Vec<u8>>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(token_id, commitment_hash, timestamp)| {
            Ok(CommitmentRecord {
                token_id: token_id_from_blob(token_id)?,
                commitment_hash: digest_from_blob("commitment_hash", commitment_hash)?,
                timestamp: timestamp as u64,
            })
        })
        .collect()
}

/// Highest minted token id.
pub fn max_token_id(conn: &Connection) -> Result<Option<TokenId>> {
    let blob: Option<Vec<u8>> = conn
        .query_row(
            "SELECT token_id FROM commitments ORDER BY token_id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    blob.map(token_id_from_blob).transpose()
}

#[cfg(test)]
mod tests {
    use duin_types::Digest;

    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn record(token: u64, byte: u8, timestamp: u64) -> CommitmentRecord {
        CommitmentRecord {
            token_id: TokenId::from_u64(token),
            commitment_hash: Digest::from_bytes([byte; 32]),
            timestamp,
        }
    }

    #[test]
    fn test_insert_and_list() {
        let conn = test_db();
        insert(&conn, &record(2, 0x02, 200), 2).expect("insert");
        insert(&conn, &record(1, 0x01, 100), 1).expect("insert");
        let all = all(&conn).expect("list");
        assert_eq!(all, vec![record(1, 0x01, 100), record(2, 0x02, 200)]);
    }

    #[test]
    fn test_duplicate_token_refused() {
        let conn = test_db();
        insert(&conn, &record(1, 0x01, 100), 1).expect("insert");
        assert!(matches!(
            insert(&conn, &record(1, 0x09, 100), 2),
            Err(DbError::Constraint(_))
        ));
    }

    #[test]
    fn test_max_token_id_numeric_order() {
        let conn = test_db();
        assert_eq!(max_token_id(&conn).expect("max"), None);
        insert(&conn, &record(255, 0x01, 100), 1).expect("insert");
        insert(&conn, &record(256, 0x02, 100), 2).expect("insert");
        insert(&conn, &record(3, 0x03, 100), 3).expect("insert");
        assert_eq!(max_token_id(&conn).expect("max"), Some(TokenId::from_u64(256)));
    }
}

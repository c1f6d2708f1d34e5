//! Append-only commitment log.
//!
//! Records are deduplicated by commitment hash and kept in chronological
//! order (timestamp, then arrival). Timestamps only order the log; a
//! commitment is valid if and only if it is present.

use std::collections::HashMap;

use duin_types::{CommitmentRecord, Digest, Timestamp, TokenId};

/// The published commitments, oldest first.
#[derive(Debug, Clone, Default)]
pub struct CommitmentLog {
    records: Vec<CommitmentRecord>,
    /// Commitment hash -> token id.
    index: HashMap<Digest, TokenId>,
}

impl CommitmentLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Returns `false` if its commitment is already logged.
    pub fn append(&mut self, record: CommitmentRecord) -> bool {
        if self.index.contains_key(&record.commitment_hash) {
            return false;
        }
        self.index.insert(record.commitment_hash, record.token_id);
        // Late arrivals from an older block slot in behind equal timestamps.
        let at = self
            .records
            .partition_point(|r| r.timestamp <= record.timestamp);
        self.records.insert(at, record);
        true
    }

    /// Append many records, returning how many were new.
    pub fn extend<I: IntoIterator<Item = CommitmentRecord>>(&mut self, records: I) -> usize {
        records.into_iter().filter(|r| self.append(r.clone())).count()
    }

    /// Whether the commitment has been published.
    pub fn contains(&self, commitment: &Digest) -> bool {
        self.index.contains_key(commitment)
    }

    /// The token a commitment was minted for.
    pub fn token_for(&self, commitment: &Digest) -> Option<TokenId> {
        self.index.get(commitment).copied()
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[CommitmentRecord] {
        &self.records
    }

    /// Timestamp of the newest record, used as the incremental sync cursor.
    pub fn latest_timestamp(&self) -> Option<Timestamp> {
        self.records.last().map(|r| r.timestamp)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<CommitmentRecord> for CommitmentLog {
    fn from_iter<I: IntoIterator<Item = CommitmentRecord>>(iter: I) -> Self {
        let mut log = Self::new();
        log.extend(iter);
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(byte: u8, token: u64, timestamp: Timestamp) -> CommitmentRecord {
        CommitmentRecord {
            token_id: TokenId::from_u64(token),
            commitment_hash: Digest::from_bytes([byte; 32]),
            timestamp,
        }
    }

    #[test]
    fn test_append_and_contains() {
        let mut log = CommitmentLog::new();
        assert!(log.is_empty());
        assert!(log.append(record(0x01, 1, 100)));
        assert!(log.contains(&Digest::from_bytes([0x01; 32])));
        assert!(!log.contains(&Digest::from_bytes([0x02; 32])));
        assert_eq!(
            log.token_for(&Digest::from_bytes([0x01; 32])),
            Some(TokenId::from_u64(1))
        );
    }

    #[test]
    fn test_duplicate_ignored() {
        let mut log = CommitmentLog::new();
        assert!(log.append(record(0x01, 1, 100)));
        assert!(!log.append(record(0x01, 1, 200)));
        assert_eq!(log.len(), 1);
        assert_eq!(log.records()[0].timestamp, 100);
    }

    #[test]
    fn test_chronological_order() {
        let mut log = CommitmentLog::new();
        log.append(record(0x03, 3, 300));
        log.append(record(0x01, 1, 100));
        log.append(record(0x02, 2, 200));
        log.append(record(0x04, 4, 200));
        let tokens: Vec<String> = log.records().iter().map(|r| r.token_id.to_string()).collect();
        assert_eq!(tokens, ["1", "2", "4", "3"]);
        assert_eq!(log.latest_timestamp(), Some(300));
    }

    #[test]
    fn test_extend_counts_new() {
        let mut log: CommitmentLog = [record(0x01, 1, 100)].into_iter().collect();
        let added = log.extend([record(0x01, 1, 100), record(0x02, 2, 150)]);
        assert_eq!(added, 1);
        assert_eq!(log.len(), 2);
    }
}

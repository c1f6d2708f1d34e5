//! Indexer mirror of the ledger logs.
//!
//! One writer at a time appends batches pulled from the ledger; readers get
//! an immutable [`LedgerSnapshot`] that a later sync never mutates. A sync
//! builds the next logs off to the side and swaps them in under a short
//! write lock, so no reader observes half a batch.

use std::sync::{Arc, Mutex, RwLock};

use duin_types::{BidEvent, CommitmentRecord, Timestamp};

use crate::bids::{ActiveBids, BidLog};
use crate::commitments::CommitmentLog;
use crate::{LedgerError, Result};

/// A consistent point-in-time view of both logs.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub commitments: Arc<CommitmentLog>,
    pub active_bids: Arc<ActiveBids>,
}

/// Outcome of one [`LedgerCache::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub new_commitments: usize,
    pub new_bid_events: usize,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.new_commitments == 0 && self.new_bid_events == 0
    }
}

/// Where the next incremental scan should start (inclusive).
///
/// Overlap with the previous batch is harmless: both logs deduplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCursor {
    pub commitments_from: Timestamp,
    pub bids_from: Timestamp,
}

#[derive(Debug, Default)]
struct WriterState {
    commitments: Arc<CommitmentLog>,
    bids: Arc<BidLog>,
}

/// Single-writer, many-reader mirror of the commitment and bid logs.
#[derive(Debug)]
pub struct LedgerCache {
    writer: Mutex<WriterState>,
    published: RwLock<LedgerSnapshot>,
    publish_timestamp: Timestamp,
}

impl LedgerCache {
    /// Create an empty cache. Scans never start before `publish_timestamp`
    /// (the contract deployment time).
    pub fn new(publish_timestamp: Timestamp) -> Self {
        Self {
            writer: Mutex::new(WriterState::default()),
            published: RwLock::new(LedgerSnapshot::default()),
            publish_timestamp,
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        let published = self
            .published
            .read()
            .map_err(|_| LedgerError::Unavailable("cache lock poisoned".into()))?;
        Ok(published.clone())
    }

    /// Append a batch of records and publish the result.
    pub fn sync<C, B>(&self, commitments: C, bid_events: B) -> Result<SyncReport>
    where
        C: IntoIterator<Item = CommitmentRecord>,
        B: IntoIterator<Item = BidEvent>,
    {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| LedgerError::Unavailable("cache writer lock poisoned".into()))?;

        // Readers may still hold the current Arcs; make_mut copies on write.
        let new_commitments = Arc::make_mut(&mut writer.commitments).extend(commitments);
        let new_bid_events = Arc::make_mut(&mut writer.bids).extend(bid_events);
        let report = SyncReport {
            new_commitments,
            new_bid_events,
        };
        if report.is_empty() {
            return Ok(report);
        }

        let next = LedgerSnapshot {
            commitments: Arc::clone(&writer.commitments),
            active_bids: Arc::new(writer.bids.active().clone()),
        };
        {
            let mut published = self
                .published
                .write()
                .map_err(|_| LedgerError::Unavailable("cache lock poisoned".into()))?;
            *published = next;
        }

        tracing::debug!(
            new_commitments,
            new_bid_events,
            commitments = writer.commitments.len(),
            active_bids = writer.bids.active().len(),
            "ledger cache: synced"
        );
        Ok(report)
    }

    /// Where the next scan should start.
    pub fn cursor(&self) -> Result<SyncCursor> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| LedgerError::Unavailable("cache writer lock poisoned".into()))?;
        let floor = self.publish_timestamp;
        Ok(SyncCursor {
            commitments_from: writer
                .commitments
                .latest_timestamp()
                .map_or(floor, |t| t.max(floor)),
            bids_from: writer.bids.latest_timestamp().map_or(floor, |t| t.max(floor)),
        })
    }

    /// The full bid event log as of the last sync.
    pub fn bid_log(&self) -> Result<Arc<BidLog>> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| LedgerError::Unavailable("cache writer lock poisoned".into()))?;
        Ok(Arc::clone(&writer.bids))
    }
}

impl Default for LedgerCache {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use duin_crypto::address::Address;
    use duin_types::{BidEventKind, Digest, TokenId};

    use super::*;

    fn commitment(byte: u8, timestamp: Timestamp) -> CommitmentRecord {
        CommitmentRecord {
            token_id: TokenId::from_u64(u64::from(byte)),
            commitment_hash: Digest::from_bytes([byte; 32]),
            timestamp,
        }
    }

    fn placed(id: &str, byte: u8, timestamp: Timestamp) -> BidEvent {
        BidEvent {
            id: id.to_string(),
            kind: BidEventKind::Placed,
            bid_nullifier: Digest::from_bytes([byte; 32]),
            bidder: Address::parse("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").expect("address"),
            amount: 1,
            timestamp,
        }
    }

    #[test]
    fn test_snapshot_isolated_from_later_sync() {
        let cache = LedgerCache::default();
        cache
            .sync([commitment(0x01, 10)], [placed("a", 0x0a, 10)])
            .expect("sync");
        let before = cache.snapshot().expect("snapshot");

        cache
            .sync([commitment(0x02, 20)], [placed("b", 0x0b, 20)])
            .expect("sync");
        let after = cache.snapshot().expect("snapshot");

        assert_eq!(before.commitments.len(), 1);
        assert_eq!(before.active_bids.len(), 1);
        assert_eq!(after.commitments.len(), 2);
        assert_eq!(after.active_bids.len(), 2);
    }

    #[test]
    fn test_overlapping_batches_dedup() {
        let cache = LedgerCache::default();
        cache
            .sync([commitment(0x01, 10)], [placed("a", 0x0a, 10)])
            .expect("sync");
        let report = cache
            .sync(
                [commitment(0x01, 10), commitment(0x02, 11)],
                [placed("a", 0x0a, 10)],
            )
            .expect("sync");
        assert_eq!(
            report,
            SyncReport {
                new_commitments: 1,
                new_bid_events: 0
            }
        );
        assert_eq!(cache.bid_log().expect("log").len(), 1);
    }

    #[test]
    fn test_empty_sync_reports_nothing() {
        let cache = LedgerCache::default();
        let report = cache
            .sync(Vec::<CommitmentRecord>::new(), Vec::<BidEvent>::new())
            .expect("sync");
        assert!(report.is_empty());
    }

    #[test]
    fn test_cursor_respects_publish_floor() {
        let cache = LedgerCache::new(1_000);
        let cursor = cache.cursor().expect("cursor");
        assert_eq!(cursor.commitments_from, 1_000);
        assert_eq!(cursor.bids_from, 1_000);

        cache
            .sync([commitment(0x01, 1_500)], [placed("a", 0x0a, 900)])
            .expect("sync");
        let cursor = cache.cursor().expect("cursor");
        assert_eq!(cursor.commitments_from, 1_500);
        assert_eq!(cursor.bids_from, 1_000);
    }

    #[test]
    fn test_concurrent_readers_see_whole_batches() {
        let cache = Arc::new(LedgerCache::default());
        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..50u8 {
                    cache
                        .sync(
                            [commitment(i, u64::from(i)), commitment(i + 100, u64::from(i))],
                            Vec::<BidEvent>::new(),
                        )
                        .expect("sync");
                }
            })
        };
        for _ in 0..200 {
            let snapshot = cache.snapshot().expect("snapshot");
            assert_eq!(snapshot.commitments.len() % 2, 0);
        }
        writer.join().expect("writer thread");
        assert_eq!(cache.snapshot().expect("snapshot").commitments.len(), 100);
    }
}

//! Persistent ledger over SQLite.
//!
//! Each contract call is one SQL transaction. The mirrored logs are loaded
//! into a [`LedgerCache`] on open and extended after every commit, so reads
//! never touch the database.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use duin_crypto::address::Address;
use duin_ledger::{
    current_timestamp, transaction_ref, ActiveBids, BidLedger, CommitmentLog, Ledger, LedgerCache,
    LedgerError,
};
use duin_nullifier::derive_commitment;
use duin_types::{
    Amount, BidEvent, BidEventKind, CommitmentRecord, Digest, MintReceipt, Timestamp, TokenId,
    TransactionRef,
};
use rusqlite::Connection;

use crate::queries::{self, bids, commitments, transfers};
use crate::DbError;

/// SQLite-backed implementation of the ledger contract.
#[derive(Debug)]
pub struct SqliteLedger {
    conn: Mutex<Connection>,
    cache: LedgerCache,
}

impl SqliteLedger {
    /// Open (or create) the ledger database at `path`.
    pub fn open(path: &Path) -> crate::Result<Self> {
        Self::from_connection(crate::open(path)?)
    }

    /// Open a throwaway in-memory ledger.
    pub fn open_memory() -> crate::Result<Self> {
        Self::from_connection(crate::open_memory()?)
    }

    /// Open the ledger at `path`, ignoring records older than the
    /// contract's `publish_timestamp`.
    pub fn open_since(path: &Path, publish_timestamp: Timestamp) -> crate::Result<Self> {
        Self::from_connection_since(crate::open(path)?, publish_timestamp)
    }

    /// Wrap a migrated connection, loading its logs into the mirror.
    pub fn from_connection(conn: Connection) -> crate::Result<Self> {
        Self::from_connection_since(conn, 0)
    }

    /// Like [`SqliteLedger::from_connection`], skipping records stamped
    /// before `publish_timestamp`.
    pub fn from_connection_since(conn: Connection, publish_timestamp: Timestamp) -> crate::Result<Self> {
        let cache = LedgerCache::new(publish_timestamp);
        let records = commitments::all(&conn)?
            .into_iter()
            .filter(|r| r.timestamp >= publish_timestamp);
        let events = bids::all_events(&conn)?
            .into_iter()
            .filter(|e| e.timestamp >= publish_timestamp);
        let report = cache
            .sync(records, events)
            .map_err(|e| DbError::Migration(e.to_string()))?;
        tracing::info!(
            commitments = report.new_commitments,
            bid_events = report.new_bid_events,
            publish_timestamp,
            "sqlite ledger: loaded"
        );
        Ok(Self {
            conn: Mutex::new(conn),
            cache,
        })
    }

    /// Whether a token nullifier has been consumed.
    pub fn is_consumed(&self, token_nullifier: &Digest) -> duin_ledger::Result<bool> {
        let conn = self.lock()?;
        Ok(transfers::is_consumed(&conn, token_nullifier)?)
    }

    /// Total funds released to `receiver` by accepted transfers.
    pub fn released_to(&self, receiver: &Address) -> duin_ledger::Result<Amount> {
        let conn = self.lock()?;
        Ok(transfers::released_to(&conn, receiver)?)
    }

    fn lock(&self) -> duin_ledger::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Unavailable("database lock poisoned".into()))
    }
}

impl Ledger for SqliteLedger {
    fn commitment_log(&self) -> duin_ledger::Result<Arc<CommitmentLog>> {
        Ok(self.cache.snapshot()?.commitments)
    }

    fn active_bids(&self) -> duin_ledger::Result<Arc<ActiveBids>> {
        Ok(self.cache.snapshot()?.active_bids)
    }

    fn execute_transfer(
        &self,
        bid_nullifier: &Digest,
        token_nullifier: &Digest,
        funds_receiver: &Address,
    ) -> duin_ledger::Result<TransactionRef> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(DbError::from)?;

        if transfers::is_consumed(&tx, token_nullifier)? {
            tracing::warn!(%token_nullifier, "sqlite ledger: token nullifier already consumed");
            return Err(LedgerError::DoubleSpend(*token_nullifier));
        }
        let Some((bidder, amount)) = bids::open_by_nullifier(&tx, bid_nullifier)? else {
            tracing::warn!(%bid_nullifier, "sqlite ledger: transfer against unknown bid");
            return Err(LedgerError::UnknownBid(*bid_nullifier));
        };
        let (sequence, timestamp) = queries::next_sequence(&tx, current_timestamp())?;
        // The primary-key insert is the authoritative test-and-set.
        if !transfers::consume_nullifier(&tx, token_nullifier, timestamp)? {
            return Err(LedgerError::DoubleSpend(*token_nullifier));
        }
        bids::remove_open(&tx, bid_nullifier)?;

        let tx_ref = transaction_ref("transfer", sequence);
        transfers::insert(
            &tx,
            &transfers::TransferRow {
                tx_ref,
                token_nullifier: *token_nullifier,
                bid_nullifier: *bid_nullifier,
                funds_receiver: funds_receiver.clone(),
                amount,
                timestamp,
            },
        )?;
        let event = BidEvent {
            id: format!("sqlite_{sequence}_0"),
            kind: BidEventKind::Accepted,
            bid_nullifier: *bid_nullifier,
            bidder,
            amount,
            timestamp,
        };
        bids::insert_event(&tx, sequence, &event)?;
        tx.commit().map_err(DbError::from)?;

        self.cache.sync(Vec::<CommitmentRecord>::new(), [event])?;
        tracing::info!(
            %bid_nullifier,
            %funds_receiver,
            amount,
            tx = %tx_ref,
            "sqlite ledger: transfer executed"
        );
        Ok(tx_ref)
    }

    fn mint(&self, ownership_nullifier: &Digest) -> duin_ledger::Result<MintReceipt> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(DbError::from)?;

        let token_id = match commitments::max_token_id(&tx)? {
            Some(last) => last.checked_next().ok_or(LedgerError::TokenIdsExhausted)?,
            None => TokenId::from_u64(1),
        };
        let commitment = derive_commitment(ownership_nullifier, &token_id);
        let (sequence, timestamp) = queries::next_sequence(&tx, current_timestamp())?;
        let record = CommitmentRecord {
            token_id,
            commitment_hash: commitment,
            timestamp,
        };
        commitments::insert(&tx, &record, sequence)?;
        tx.commit().map_err(DbError::from)?;

        self.cache.sync([record], Vec::<BidEvent>::new())?;
        tracing::info!(%token_id, %commitment, "sqlite ledger: token minted");
        Ok(MintReceipt {
            token_id,
            commitment,
            transaction: transaction_ref("mint", sequence),
        })
    }

    fn consumes_atomically(&self) -> bool {
        true
    }
}

impl BidLedger for SqliteLedger {
    fn place_bid(
        &self,
        bidder: &Address,
        bid_nullifier: &Digest,
        amount: Amount,
    ) -> duin_ledger::Result<TransactionRef> {
        if amount == 0 {
            return Err(LedgerError::Rejected("bid amount must be positive".into()));
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(DbError::from)?;

        if bids::open_by_bidder(&tx, bidder)?.is_some() {
            return Err(LedgerError::BidderHasActiveBid(bidder.clone()));
        }
        if bids::open_by_nullifier(&tx, bid_nullifier)?.is_some() {
            return Err(LedgerError::Rejected(format!(
                "bid {bid_nullifier} is already open"
            )));
        }

        let (sequence, timestamp) = queries::next_sequence(&tx, current_timestamp())?;
        bids::insert_open(&tx, bid_nullifier, bidder, amount, timestamp)?;
        let event = BidEvent {
            id: format!("sqlite_{sequence}_0"),
            kind: BidEventKind::Placed,
            bid_nullifier: *bid_nullifier,
            bidder: bidder.clone(),
            amount,
            timestamp,
        };
        bids::insert_event(&tx, sequence, &event)?;
        tx.commit().map_err(DbError::from)?;

        self.cache.sync(Vec::<CommitmentRecord>::new(), [event])?;
        tracing::info!(%bidder, %bid_nullifier, amount, "sqlite ledger: bid placed");
        Ok(transaction_ref("bid", sequence))
    }

    fn withdraw_bid(&self, bidder: &Address) -> duin_ledger::Result<(Digest, Amount)> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(DbError::from)?;

        let (bid_nullifier, amount) = bids::open_by_bidder(&tx, bidder)?
            .ok_or_else(|| LedgerError::NoActiveBid(bidder.clone()))?;
        bids::remove_open(&tx, &bid_nullifier)?;

        let (sequence, timestamp) = queries::next_sequence(&tx, current_timestamp())?;
        let event = BidEvent {
            id: format!("sqlite_{sequence}_0"),
            kind: BidEventKind::Withdrawn,
            bid_nullifier,
            bidder: bidder.clone(),
            amount,
            timestamp,
        };
        bids::insert_event(&tx, sequence, &event)?;
        tx.commit().map_err(DbError::from)?;

        self.cache.sync(Vec::<CommitmentRecord>::new(), [event])?;
        tracing::info!(%bidder, %bid_nullifier, amount, "sqlite ledger: bid withdrawn");
        Ok((bid_nullifier, amount))
    }
}

//! In-process ledger with the marketplace contract's semantics.
//!
//! Every state change happens under one mutex, so the token-nullifier
//! check and its consumption are a single step. After each change the new
//! records are pushed into a [`LedgerCache`], which serves the snapshots
//! the validator reads.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use duin_crypto::address::Address;
use duin_nullifier::{derive_commitment, SpentSet};
use duin_types::{
    Amount, BidEvent, BidEventKind, CommitmentRecord, Digest, MintReceipt, Timestamp, TokenId,
    TransactionRef,
};

use crate::bids::ActiveBids;
use crate::cache::LedgerCache;
use crate::commitments::CommitmentLog;
use crate::{current_timestamp, transaction_ref, BidLedger, Ledger, LedgerError, Result};

/// Mutable contract state.
#[derive(Debug)]
struct LocalChain {
    next_token_id: TokenId,
    sequence: u64,
    last_timestamp: Timestamp,
    spent: SpentSet,
    /// Open bids: bid nullifier -> (bidder, amount).
    open_bids: HashMap<Digest, (Address, Amount)>,
    /// Bidder -> their open bid nullifier.
    bidders: HashMap<Address, Digest>,
    /// Funds released to each receiver.
    payouts: HashMap<Address, Amount>,
}

impl LocalChain {
    fn new(genesis: Timestamp) -> Self {
        Self {
            next_token_id: TokenId::from_u64(1),
            sequence: 0,
            last_timestamp: genesis,
            spent: SpentSet::new(),
            open_bids: HashMap::new(),
            bidders: HashMap::new(),
            payouts: HashMap::new(),
        }
    }

    /// Advance the block: next sequence number and a non-decreasing timestamp.
    fn tick(&mut self) -> (u64, Timestamp) {
        self.sequence += 1;
        self.last_timestamp = self.last_timestamp.max(current_timestamp());
        (self.sequence, self.last_timestamp)
    }
}

/// In-memory ledger for development and tests.
#[derive(Debug)]
pub struct LocalLedger {
    chain: Mutex<LocalChain>,
    cache: Arc<LedgerCache>,
}

impl LocalLedger {
    pub fn new() -> Self {
        Self::since(0)
    }

    /// A ledger deployed at `publish_timestamp`. No record it produces is
    /// older than that.
    pub fn since(publish_timestamp: Timestamp) -> Self {
        Self {
            chain: Mutex::new(LocalChain::new(publish_timestamp)),
            cache: Arc::new(LedgerCache::new(publish_timestamp)),
        }
    }

    /// The mirror this ledger publishes into.
    pub fn cache(&self) -> Arc<LedgerCache> {
        Arc::clone(&self.cache)
    }

    /// Whether a token nullifier has been consumed.
    pub fn is_consumed(&self, token_nullifier: &Digest) -> Result<bool> {
        Ok(self.lock()?.spent.contains(token_nullifier))
    }

    /// Total funds released to `receiver` by accepted transfers.
    pub fn released_to(&self, receiver: &Address) -> Result<Amount> {
        Ok(self.lock()?.payouts.get(receiver).copied().unwrap_or(0))
    }

    fn lock(&self) -> Result<MutexGuard<'_, LocalChain>> {
        self.chain
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".into()))
    }

    fn publish_bid_event(
        &self,
        sequence: u64,
        kind: BidEventKind,
        bid_nullifier: Digest,
        bidder: &Address,
        amount: Amount,
        timestamp: Timestamp,
    ) -> Result<()> {
        let event = BidEvent {
            id: format!("local_{sequence}_0"),
            kind,
            bid_nullifier,
            bidder: bidder.clone(),
            amount,
            timestamp,
        };
        self.cache.sync(Vec::<CommitmentRecord>::new(), [event])?;
        Ok(())
    }
}

impl Default for LocalLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger for LocalLedger {
    fn commitment_log(&self) -> Result<Arc<CommitmentLog>> {
        Ok(self.cache.snapshot()?.commitments)
    }

    fn active_bids(&self) -> Result<Arc<ActiveBids>> {
        Ok(self.cache.snapshot()?.active_bids)
    }

    fn execute_transfer(
        &self,
        bid_nullifier: &Digest,
        token_nullifier: &Digest,
        funds_receiver: &Address,
    ) -> Result<TransactionRef> {
        let mut chain = self.lock()?;

        if chain.spent.contains(token_nullifier) {
            tracing::warn!(%token_nullifier, "local ledger: token nullifier already consumed");
            return Err(LedgerError::DoubleSpend(*token_nullifier));
        }
        let Some((bidder, amount)) = chain.open_bids.get(bid_nullifier).cloned() else {
            tracing::warn!(%bid_nullifier, "local ledger: transfer against unknown bid");
            return Err(LedgerError::UnknownBid(*bid_nullifier));
        };

        chain.spent.insert_checked(*token_nullifier)?;
        chain.open_bids.remove(bid_nullifier);
        chain.bidders.remove(&bidder);
        let released = chain.payouts.entry(funds_receiver.clone()).or_insert(0);
        *released = released.saturating_add(amount);

        let (sequence, timestamp) = chain.tick();
        let tx = transaction_ref("transfer", sequence);
        self.publish_bid_event(
            sequence,
            BidEventKind::Accepted,
            *bid_nullifier,
            &bidder,
            amount,
            timestamp,
        )?;

        tracing::info!(
            %bid_nullifier,
            %funds_receiver,
            amount,
            %tx,
            "local ledger: transfer executed"
        );
        Ok(tx)
    }

    fn mint(&self, ownership_nullifier: &Digest) -> Result<MintReceipt> {
        let mut chain = self.lock()?;

        let token_id = chain.next_token_id;
        let next = token_id
            .checked_next()
            .ok_or(LedgerError::TokenIdsExhausted)?;
        let commitment = derive_commitment(ownership_nullifier, &token_id);

        let (sequence, timestamp) = chain.tick();
        chain.next_token_id = next;
        let transaction = transaction_ref("mint", sequence);

        let record = CommitmentRecord {
            token_id,
            commitment_hash: commitment,
            timestamp,
        };
        self.cache.sync([record], Vec::<BidEvent>::new())?;

        tracing::info!(%token_id, %commitment, "local ledger: token minted");
        Ok(MintReceipt {
            token_id,
            commitment,
            transaction,
        })
    }

    fn consumes_atomically(&self) -> bool {
        true
    }
}

impl BidLedger for LocalLedger {
    fn place_bid(
        &self,
        bidder: &Address,
        bid_nullifier: &Digest,
        amount: Amount,
    ) -> Result<TransactionRef> {
        if amount == 0 {
            return Err(LedgerError::Rejected("bid amount must be positive".into()));
        }
        let mut chain = self.lock()?;

        if chain.bidders.contains_key(bidder) {
            return Err(LedgerError::BidderHasActiveBid(bidder.clone()));
        }
        if chain.open_bids.contains_key(bid_nullifier) {
            return Err(LedgerError::Rejected(format!(
                "bid {bid_nullifier} is already open"
            )));
        }

        chain
            .open_bids
            .insert(*bid_nullifier, (bidder.clone(), amount));
        chain.bidders.insert(bidder.clone(), *bid_nullifier);

        let (sequence, timestamp) = chain.tick();
        self.publish_bid_event(
            sequence,
            BidEventKind::Placed,
            *bid_nullifier,
            bidder,
            amount,
            timestamp,
        )?;

        tracing::info!(%bidder, %bid_nullifier, amount, "local ledger: bid placed");
        Ok(transaction_ref("bid", sequence))
    }

    fn withdraw_bid(&self, bidder: &Address) -> Result<(Digest, Amount)> {
        let mut chain = self.lock()?;

        let bid_nullifier = chain
            .bidders
            .remove(bidder)
            .ok_or_else(|| LedgerError::NoActiveBid(bidder.clone()))?;
        let (_, amount) = chain
            .open_bids
            .remove(&bid_nullifier)
            .ok_or(LedgerError::UnknownBid(bid_nullifier))?;

        let (sequence, timestamp) = chain.tick();
        self.publish_bid_event(
            sequence,
            BidEventKind::Withdrawn,
            bid_nullifier,
            bidder,
            amount,
            timestamp,
        )?;

        tracing::info!(%bidder, %bid_nullifier, amount, "local ledger: bid withdrawn");
        Ok((bid_nullifier, amount))
    }
}

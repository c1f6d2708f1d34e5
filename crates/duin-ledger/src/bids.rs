//! Bid event log and the active-bid projection.
//!
//! The log is append-only and deduplicated by event id. [`ActiveBids`] is
//! its fold: `placed` inserts or overwrites the entry for a bid nullifier,
//! `withdrawn` and `accepted` delete it. The projection is updated on every
//! append and can be rebuilt from scratch with [`BidLog::rebuild`].

use std::collections::{HashMap, HashSet};

use duin_crypto::address::Address;
use duin_types::{ActiveBid, BidEvent, BidEventKind, Digest};

/// Open bids keyed by bid nullifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveBids {
    bids: HashMap<Digest, ActiveBid>,
}

impl ActiveBids {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an event log into its active view.
    pub fn fold<'a, I: IntoIterator<Item = &'a BidEvent>>(events: I) -> Self {
        let mut view = Self::new();
        for event in events {
            view.apply(event);
        }
        view
    }

    fn apply(&mut self, event: &BidEvent) {
        match event.kind {
            BidEventKind::Placed => {
                self.bids.insert(
                    event.bid_nullifier,
                    ActiveBid {
                        amount: event.amount,
                        timestamp: event.timestamp,
                        bidder: event.bidder.clone(),
                    },
                );
            }
            BidEventKind::Withdrawn | BidEventKind::Accepted => {
                self.bids.remove(&event.bid_nullifier);
            }
        }
    }

    /// Whether a bid nullifier is open.
    pub fn contains(&self, bid_nullifier: &Digest) -> bool {
        self.bids.contains_key(bid_nullifier)
    }

    pub fn get(&self, bid_nullifier: &Digest) -> Option<&ActiveBid> {
        self.bids.get(bid_nullifier)
    }

    /// The open bid sent by `bidder`, if any.
    pub fn by_bidder(&self, bidder: &Address) -> Option<(&Digest, &ActiveBid)> {
        self.bids.iter().find(|(_, bid)| &bid.bidder == bidder)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Digest, &ActiveBid)> {
        self.bids.iter()
    }

    pub fn len(&self) -> usize {
        self.bids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty()
    }
}

/// Append-only bid event log with its materialised active view.
#[derive(Debug, Clone, Default)]
pub struct BidLog {
    events: Vec<BidEvent>,
    seen: HashSet<String>,
    active: ActiveBids,
}

impl BidLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Returns `false` if its id was already applied.
    pub fn append(&mut self, event: BidEvent) -> bool {
        if !self.seen.insert(event.id.clone()) {
            return false;
        }
        self.active.apply(&event);
        tracing::debug!(
            id = %event.id,
            kind = ?event.kind,
            bid_nullifier = %event.bid_nullifier,
            "bid log: event appended"
        );
        self.events.push(event);
        true
    }

    /// Append many events, returning how many were new.
    pub fn extend<I: IntoIterator<Item = BidEvent>>(&mut self, events: I) -> usize {
        events.into_iter().filter(|e| self.append(e.clone())).count()
    }

    /// Re-fold the whole log. Always equal to [`BidLog::active`].
    pub fn rebuild(&self) -> ActiveBids {
        ActiveBids::fold(&self.events)
    }

    /// The current active view.
    pub fn active(&self) -> &ActiveBids {
        &self.active
    }

    /// Events in arrival order.
    pub fn events(&self) -> &[BidEvent] {
        &self.events
    }

    /// Largest event timestamp seen, used as the incremental sync cursor.
    pub fn latest_timestamp(&self) -> Option<u64> {
        self.events.iter().map(|e| e.timestamp).max()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

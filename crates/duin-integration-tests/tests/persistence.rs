//! Integration test: consumed nullifiers survive restarts, and an indexer
//! mirror can follow the ledger incrementally.

use std::path::PathBuf;
use std::sync::Arc;

use duin_db::SqliteLedger;
use duin_integration_tests::{accept_request, bid_on, mint_and_bid, Party, BIDDER, CAROL};
use duin_ledger::{Ledger, LedgerCache, LedgerError};
use duin_transfer::{TransferError, TransferValidator};
use duin_types::BidEvent;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("duin-it-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("tmp dir");
    dir
}

#[test]
fn consumed_nullifier_survives_reopen() {
    let dir = scratch_dir("reopen");
    let path = dir.join("ledger.db");
    let owner = Party::owner();
    let bidder = Party::bidder();
    let receiver = Party::new(BIDDER, "gamma");

    let (listing, request) = {
        let ledger = Arc::new(SqliteLedger::open(&path).expect("open"));
        let validator = TransferValidator::new(Arc::clone(&ledger));
        let listing = mint_and_bid(ledger.as_ref(), &owner, &bidder, 10).expect("listing");
        let request = accept_request(&owner, &listing, CAROL, &receiver).expect("request");
        validator
            .validate_and_execute_transfer(&request)
            .expect("transfer");
        (listing, request)
    };

    // Out-of-band look at the file: one consumed nullifier, one transfer.
    {
        let conn = rusqlite::Connection::open(&path).expect("raw open");
        let spent: i64 = conn
            .query_row("SELECT COUNT(*) FROM spent_token_nullifiers", [], |r| r.get(0))
            .expect("count");
        let transfers: i64 = conn
            .query_row("SELECT COUNT(*) FROM transfers", [], |r| r.get(0))
            .expect("count");
        assert_eq!((spent, transfers), (1, 1));
    }

    let ledger = Arc::new(SqliteLedger::open(&path).expect("reopen"));
    let validator = TransferValidator::new(Arc::clone(&ledger));
    assert_eq!(ledger.commitment_log().expect("log").len(), 2);
    assert!(ledger.active_bids().expect("bids").is_empty());

    bid_on(ledger.as_ref(), listing.token_id, listing.commitment, &bidder, 10).expect("re-bid");
    let err = validator
        .validate_and_execute_transfer(&request)
        .expect_err("replay after restart");
    assert!(matches!(
        err,
        TransferError::Ledger(LedgerError::DoubleSpend(_))
    ));

    drop(validator);
    drop(ledger);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn mirror_follows_ledger_incrementally() {
    let ledger = SqliteLedger::open_memory().expect("open");
    let mirror = LedgerCache::default();
    let owner = Party::owner();

    let pull = |mirror: &LedgerCache| {
        let cursor = mirror.cursor().expect("cursor");
        let log = ledger.commitment_log().expect("log");
        let batch: Vec<_> = log
            .records()
            .iter()
            .filter(|r| r.timestamp >= cursor.commitments_from)
            .cloned()
            .collect();
        mirror
            .sync(batch, Vec::<BidEvent>::new())
            .expect("sync")
    };

    ledger.mint(&owner.ownership_nullifier().expect("nullifier")).expect("mint");
    assert_eq!(pull(&mirror).new_commitments, 1);

    // Nothing new: the overlapping batch deduplicates.
    assert!(pull(&mirror).is_empty());

    ledger.mint(&owner.ownership_nullifier().expect("nullifier")).expect("mint");
    ledger.mint(&owner.ownership_nullifier().expect("nullifier")).expect("mint");
    assert_eq!(pull(&mirror).new_commitments, 2);

    let snapshot = mirror.snapshot().expect("snapshot");
    let source = ledger.commitment_log().expect("log");
    assert_eq!(snapshot.commitments.records(), source.records());
}

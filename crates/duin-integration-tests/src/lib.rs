//! Integration test crate for the Duin protocol.
//!
//! The library holds the shared cast and the client-side steps a real
//! owner or bidder would perform (derive, mint, bid). The tests under
//! `tests/` drive full marketplace flows through the validator against
//! both ledger implementations.

use duin_crypto::address::Address;
use duin_crypto::secret::Secret;
use duin_ledger::BidLedger;
use duin_nullifier::{derive_bid_nullifier, derive_bid_secret, derive_ownership_nullifier};
use duin_transfer::{TransferError, TransferRequest};
use duin_types::{Amount, Digest, TokenId};

pub const OWNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const BIDDER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
pub const CAROL: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

pub const COMMITMENT_1: &str =
    "0x554f198dc946ce841f15b7804319b9c1210a22ba19f065f10bee80bedae9745a";
pub const BID_NULLIFIER: &str =
    "0x9fe91bf19b2ecee59f40bcc08729dc8ee6372af8a24ff587dd7890fd895a9522";
pub const TOKEN_NULLIFIER: &str =
    "0x57463bbf959c38d046ec3101f7d0cd8401ef00329e146724dea01b05c5d82c2f";
pub const RECEIVER_COMMITMENT_2: &str =
    "0xf5de397eb601531359b3d7673a3d1d55603ab48227f5548071b9bf0f87c6f23f";

/// An account and the secret phrase it derives its bindings from.
#[derive(Clone, Debug)]
pub struct Party {
    pub address: &'static str,
    pub secret: Secret,
}

impl Party {
    pub fn new(address: &'static str, secret: &str) -> Self {
        Self {
            address,
            secret: Secret::new(secret),
        }
    }

    pub fn owner() -> Self {
        Self::new(OWNER, "alpha")
    }

    pub fn bidder() -> Self {
        Self::new(BIDDER, "beta")
    }

    pub fn checksummed(&self) -> Result<Address, TransferError> {
        Address::parse(self.address).map_err(|e| TransferError::InvalidInput(e.to_string()))
    }

    /// The ownership nullifier this party mints to.
    pub fn ownership_nullifier(&self) -> Result<Digest, TransferError> {
        Ok(derive_ownership_nullifier(self.address, &self.secret)?)
    }

    /// The bid secret this party hands to a seller.
    pub fn bid_secret(&self) -> Result<Digest, TransferError> {
        Ok(derive_bid_secret(self.address, &self.secret)?)
    }
}

/// A minted token with an open bid against it.
#[derive(Clone, Debug)]
pub struct Listing {
    pub token_id: TokenId,
    pub commitment: Digest,
    pub bid_secret: Digest,
    pub bid_nullifier: Digest,
    pub amount: Amount,
}

/// Mint a token to `owner`, then have `bidder` bid `amount` on it.
pub fn mint_and_bid<L: BidLedger + ?Sized>(
    ledger: &L,
    owner: &Party,
    bidder: &Party,
    amount: Amount,
) -> Result<Listing, TransferError> {
    let minted = ledger.mint(&owner.ownership_nullifier()?)?;
    bid_on(ledger, minted.token_id, minted.commitment, bidder, amount)
}

/// Have `bidder` bid `amount` on an already published commitment.
pub fn bid_on<L: BidLedger + ?Sized>(
    ledger: &L,
    token_id: TokenId,
    commitment: Digest,
    bidder: &Party,
    amount: Amount,
) -> Result<Listing, TransferError> {
    let bid_secret = bidder.bid_secret()?;
    let bid_nullifier = derive_bid_nullifier(&bid_secret, &commitment);
    ledger.place_bid(&bidder.checksummed()?, &bid_nullifier, amount)?;
    Ok(Listing {
        token_id,
        commitment,
        bid_secret,
        bid_nullifier,
        amount,
    })
}

/// The seller's request to accept `listing`, re-minting to `receiver`.
pub fn accept_request(
    seller: &Party,
    listing: &Listing,
    funds_receiver: &str,
    receiver: &Party,
) -> Result<TransferRequest, TransferError> {
    Ok(TransferRequest {
        sender_address: seller.address.to_string(),
        sender_secret: seller.secret.clone(),
        token_id: listing.token_id.to_string(),
        receiver_secret: Secret::new(listing.bid_secret.to_hex()),
        funds_receiver: funds_receiver.to_string(),
        receiver_ownership_nullifier: receiver.ownership_nullifier()?.to_hex(),
    })
}

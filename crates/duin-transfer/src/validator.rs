//! The transfer validation and execution pipeline.

use std::sync::{Arc, Mutex};

use duin_crypto::address::Address;
use duin_ledger::{Ledger, LedgerError};
use duin_nullifier::derive::{parse_address, parse_digest, parse_token_id};
use duin_nullifier::{
    derive_bid_nullifier, derive_bid_secret, derive_commitment, derive_token_nullifier,
};
use duin_types::{Digest, TokenId};

use crate::request::{AuthorizedTransfer, TransferReceipt, TransferRequest};
use crate::{Result, TransferError};

/// Parsed request operands.
struct Operands {
    sender: Address,
    token_id: TokenId,
    receiver_secret: Digest,
    funds_receiver: Address,
    receiver_ownership_nullifier: Digest,
}

fn parse_request(request: &TransferRequest) -> Result<Operands> {
    let sender = parse_address("sender address", &request.sender_address)?;
    let token_id = parse_token_id("token id", &request.token_id)?;
    let receiver_secret = parse_digest("receiver secret", request.receiver_secret.expose())?;
    let funds_receiver = parse_address("funds receiver address", &request.funds_receiver)?;
    let receiver_ownership_nullifier = parse_digest(
        "receiver ownership nullifier",
        &request.receiver_ownership_nullifier,
    )?;

    if funds_receiver == sender {
        return Err(TransferError::InvalidInput(
            "funds receiver must differ from the sender".into(),
        ));
    }

    Ok(Operands {
        sender,
        token_id,
        receiver_secret,
        funds_receiver,
        receiver_ownership_nullifier,
    })
}

/// Validates transfer requests against a ledger and executes them.
///
/// Holds no protocol state of its own; the ledger is the only authority on
/// consumed token nullifiers. When the ledger cannot consume atomically,
/// executions through this validator are serialised behind one mutex.
pub struct TransferValidator<L: ?Sized> {
    ledger: Arc<L>,
    execution: Mutex<()>,
}

impl<L: Ledger + ?Sized> TransferValidator<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self {
            ledger,
            execution: Mutex::new(()),
        }
    }

    /// The ledger this validator executes against.
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Run the read-only steps of the pipeline.
    ///
    /// Reads the ledger's current snapshots; the caller is responsible for
    /// having refreshed them.
    ///
    /// # Errors
    ///
    /// - [`TransferError::InvalidInput`] for malformed fields or a funds
    ///   receiver equal to the sender
    /// - [`TransferError::InvalidCommitment`] if the recomputed commitment
    ///   is not published
    /// - [`TransferError::BidNotFound`] if the recomputed bid nullifier is
    ///   not an active bid
    /// - [`TransferError::Ledger`] if a snapshot cannot be read
    pub fn authorize(&self, request: &TransferRequest) -> Result<AuthorizedTransfer> {
        let operands = parse_request(request)?;

        let sender_binding = derive_bid_secret(operands.sender.as_str(), &request.sender_secret)?;
        let commitment = derive_commitment(&sender_binding, &operands.token_id);
        tracing::debug!(token_id = %operands.token_id, %commitment, "transfer: commitment recomputed");

        let commitments = self.ledger.commitment_log()?;
        if !commitments.contains(&commitment) {
            tracing::warn!(token_id = %operands.token_id, %commitment, "transfer: commitment not published");
            return Err(TransferError::InvalidCommitment(commitment));
        }

        let bid_nullifier = derive_bid_nullifier(&operands.receiver_secret, &commitment);
        let active_bids = self.ledger.active_bids()?;
        let Some(bid) = active_bids.get(&bid_nullifier) else {
            tracing::warn!(%bid_nullifier, "transfer: bid not active");
            return Err(TransferError::BidNotFound(bid_nullifier));
        };
        let bid_amount = bid.amount;

        let token_nullifier = derive_token_nullifier(
            operands.sender.as_str(),
            &request.sender_secret,
            &commitment,
        )?;

        Ok(AuthorizedTransfer {
            token_id: operands.token_id,
            commitment,
            bid_nullifier,
            token_nullifier,
            bid_amount,
            funds_receiver: operands.funds_receiver,
            receiver_ownership_nullifier: operands.receiver_ownership_nullifier,
        })
    }

    /// Run the whole pipeline: authorize, execute the transfer, mint the
    /// replacement token.
    ///
    /// # Errors
    ///
    /// Everything [`TransferValidator::authorize`] returns, plus:
    ///
    /// - [`TransferError::Ledger`] if the ledger refuses the transfer (for
    ///   example a consumed token nullifier); nothing is minted
    /// - [`TransferError::PartialCompletion`] if the transfer executed but
    ///   the mint failed
    pub fn validate_and_execute_transfer(&self, request: &TransferRequest) -> Result<TransferReceipt> {
        let _serial = if self.ledger.consumes_atomically() {
            None
        } else {
            Some(self.execution.lock().map_err(|_| {
                TransferError::Ledger(LedgerError::Unavailable("transfer queue poisoned".into()))
            })?)
        };

        let authorized = self.authorize(request)?;

        let transaction = self.ledger.execute_transfer(
            &authorized.bid_nullifier,
            &authorized.token_nullifier,
            &authorized.funds_receiver,
        )?;
        tracing::info!(
            token_id = %authorized.token_id,
            bid_nullifier = %authorized.bid_nullifier,
            %transaction,
            "transfer: executed"
        );

        let mint = match self.ledger.mint(&authorized.receiver_ownership_nullifier) {
            Ok(mint) => mint,
            Err(mint_error) => {
                tracing::error!(
                    %transaction,
                    token_nullifier = %authorized.token_nullifier,
                    receiver_ownership_nullifier = %authorized.receiver_ownership_nullifier,
                    error = %mint_error,
                    "transfer: executed but replacement mint failed, manual reconciliation required"
                );
                return Err(TransferError::PartialCompletion {
                    transaction,
                    bid_nullifier: authorized.bid_nullifier,
                    token_nullifier: authorized.token_nullifier,
                    receiver_ownership_nullifier: authorized.receiver_ownership_nullifier,
                    mint_error,
                });
            }
        };
        tracing::info!(
            token_id = %mint.token_id,
            commitment = %mint.commitment,
            "transfer: replacement minted"
        );

        Ok(TransferReceipt {
            transaction,
            bid_nullifier: authorized.bid_nullifier,
            token_nullifier: authorized.token_nullifier,
            mint,
        })
    }
}

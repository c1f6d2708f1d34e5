//! Request, authorization and receipt types.

use duin_crypto::address::Address;
use duin_crypto::secret::Secret;
use duin_types::{Amount, Digest, MintReceipt, TokenId, TransactionRef};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// An owner's request to transfer a token to a bidder.
///
/// Fields arrive as text from the HTTP-facing collaborator and are parsed
/// by the validator, so malformed input is reported as
/// [`crate::TransferError::InvalidInput`] naming the field.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// The current owner's account.
    pub sender_address: String,
    /// The current owner's secret phrase.
    pub sender_secret: Secret,
    /// The token being sold (decimal or `0x` hex).
    pub token_id: String,
    /// The bid secret the bidder handed to the seller out of band.
    pub receiver_secret: Secret,
    /// Where the bid's funds are released.
    pub funds_receiver: String,
    /// The receiver's fresh ownership nullifier for the replacement mint.
    pub receiver_ownership_nullifier: String,
}

/// Everything steps 1-6 established, ready to execute.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedTransfer {
    pub token_id: TokenId,
    pub commitment: Digest,
    pub bid_nullifier: Digest,
    pub token_nullifier: Digest,
    #[serde_as(as = "DisplayFromStr")]
    pub bid_amount: Amount,
    pub funds_receiver: Address,
    pub receiver_ownership_nullifier: Digest,
}

/// Outcome of a completed transfer and re-mint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub transaction: TransactionRef,
    pub bid_nullifier: Digest,
    pub token_nullifier: Digest,
    pub mint: MintReceipt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_json() {
        let request: TransferRequest = serde_json::from_value(serde_json::json!({
            "senderAddress": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "senderSecret": "alpha",
            "tokenId": "1",
            "receiverSecret": "0xebd0c9651ea19cee50a3b10e7be33b9ea4d7a1b7c543a908cd9eb73b5b4703e1",
            "fundsReceiver": "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC",
            "receiverOwnershipNullifier": "0x0757b118a54d28d76ecef2a1e06950b850356153cd1d7e31199d51d83908b28e"
        }))
        .expect("deserialize");
        assert_eq!(request.sender_secret.expose(), "alpha");
        assert_eq!(request.token_id, "1");
    }

    #[test]
    fn test_request_debug_redacts_secrets() {
        let request = TransferRequest {
            sender_address: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".into(),
            sender_secret: Secret::new("alpha"),
            token_id: "1".into(),
            receiver_secret: Secret::new("beta"),
            funds_receiver: "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC".into(),
            receiver_ownership_nullifier: String::new(),
        };
        let debug = format!("{request:?}");
        assert!(!debug.contains("alpha"));
        assert!(!debug.contains("beta"));
    }
}

use super::types::TransactionId;
use crate::entity::AccountId;
use crate::error::{Error, Result};
use crate::network::wire::Status;
use crate::network::Client;
use crate::query::{TransactionReceipt, TransactionReceiptQuery};

/// What a node says when it accepts a transaction for consensus.
///
/// Acceptance is not success. Call [`get_receipt`](Self::get_receipt) to
/// learn how consensus went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResponse {
    pub transaction_id: TransactionId,
    /// The node that accepted the submission.
    pub node_id: AccountId,
    /// SHA-384 of the signed transaction bytes that were sent.
    pub transaction_hash: Vec<u8>,
}

impl TransactionResponse {
    /// Polls the accepting node for the receipt and fails with
    /// [`Error::ReceiptStatus`] unless consensus reports success.
    pub fn get_receipt(&self, client: &Client) -> Result<TransactionReceipt> {
        let receipt = TransactionReceiptQuery::new()
            .transaction_id(self.transaction_id.clone())
            .node_account_ids([self.node_id.clone()])
            .execute(client)?;

        if receipt.status != Status::Success {
            return Err(Error::ReceiptStatus {
                status: receipt.status,
                transaction_id: self.transaction_id.clone(),
            });
        }
        Ok(receipt)
    }
}

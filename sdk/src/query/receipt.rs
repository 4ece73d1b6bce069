//! Transaction receipts: the consensus outcome of a submitted transaction.

use serde::{Deserialize, Serialize};

use super::{Query, QueryData};
use crate::entity::{AccountId, EntityIdError, FileId, NetworkName, TokenId, TopicId, ValidateChecksums};
use crate::error::{Error, Result};
use crate::network::execute::Outcome;
use crate::network::wire::{ResponseBody, Status, WireRequest, WireResponse};
use crate::transaction::TransactionId;

/// Consensus outcome of a transaction, plus the IDs of anything it created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub status: Status,
    pub account_id: Option<AccountId>,
    pub token_id: Option<TokenId>,
    pub file_id: Option<FileId>,
    pub topic_id: Option<TopicId>,
}

impl TransactionReceipt {
    /// A receipt with a status and nothing created.
    pub fn new(status: Status) -> Self {
        Self {
            status,
            account_id: None,
            token_id: None,
            file_id: None,
            topic_id: None,
        }
    }
}

/// Looks up a receipt. Free of charge, so nothing to sign.
///
/// Keeps asking while the node answers `BUSY`, `UNKNOWN`,
/// `RECEIPT_NOT_FOUND` or `PLATFORM_NOT_ACTIVE`, or returns a receipt whose
/// status is still `UNKNOWN`.
pub type TransactionReceiptQuery = Query<TransactionReceiptQueryData>;

#[derive(Debug, Clone, Default)]
pub struct TransactionReceiptQueryData {
    transaction_id: Option<TransactionId>,
}

impl Query<TransactionReceiptQueryData> {
    pub fn transaction_id(&mut self, id: TransactionId) -> &mut Self {
        self.data_mut().transaction_id = Some(id);
        self
    }

    pub fn get_transaction_id(&self) -> Option<&TransactionId> {
        self.data().transaction_id.as_ref()
    }
}

impl ValidateChecksums for TransactionReceiptQueryData {
    fn validate_checksums(&self, network: NetworkName) -> std::result::Result<(), EntityIdError> {
        self.transaction_id.validate_checksums(network)
    }
}

impl QueryData for TransactionReceiptQueryData {
    type Response = TransactionReceipt;

    fn to_request(&self) -> Result<WireRequest> {
        let transaction_id = self
            .transaction_id
            .clone()
            .ok_or_else(|| Error::Config("receipt query needs a transaction ID".into()))?;
        Ok(WireRequest::GetTransactionReceipt { transaction_id })
    }

    fn transaction_id(&self) -> Option<&TransactionId> {
        self.transaction_id.as_ref()
    }

    fn classify(&self, response: &WireResponse) -> Outcome {
        match response.status {
            Status::Ok => match &response.body {
                ResponseBody::Receipt(receipt) if receipt.status == Status::Unknown => {
                    Outcome::Retry(Status::Unknown)
                }
                _ => Outcome::Success,
            },
            Status::Busy | Status::Unknown | Status::ReceiptNotFound | Status::PlatformNotActive => {
                Outcome::Retry(response.status)
            }
            other => Outcome::Permanent(other),
        }
    }

    fn map_response(&self, response: WireResponse) -> Result<TransactionReceipt> {
        match response.body {
            ResponseBody::Receipt(receipt) => Ok(receipt),
            ResponseBody::Empty => Err(Error::Serialization(
                "receipt response carried no receipt".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> TransactionReceiptQueryData {
        TransactionReceiptQueryData {
            transaction_id: Some(TransactionId::generate(AccountId::from_num(2))),
        }
    }

    fn receipt(status: Status) -> WireResponse {
        WireResponse {
            status: Status::Ok,
            body: ResponseBody::Receipt(TransactionReceipt::new(status)),
        }
    }

    #[test]
    fn pending_receipts_are_retried() {
        let q = query();
        assert_eq!(q.classify(&receipt(Status::Unknown)), Outcome::Retry(Status::Unknown));
        for status in [Status::Busy, Status::ReceiptNotFound, Status::PlatformNotActive] {
            assert_eq!(
                q.classify(&WireResponse::status(status)),
                Outcome::Retry(status)
            );
        }
    }

    #[test]
    fn final_receipts_succeed_even_when_the_transaction_failed() {
        let q = query();
        assert_eq!(q.classify(&receipt(Status::Success)), Outcome::Success);
        assert_eq!(
            q.classify(&receipt(Status::InsufficientPayerBalance)),
            Outcome::Success
        );
        let mapped = q.map_response(receipt(Status::InsufficientPayerBalance)).unwrap();
        assert_eq!(mapped.status, Status::InsufficientPayerBalance);
    }

    #[test]
    fn precheck_rejection_is_permanent() {
        assert_eq!(
            query().classify(&WireResponse::status(Status::InvalidTransactionId)),
            Outcome::Permanent(Status::InvalidTransactionId)
        );
    }

    #[test]
    fn payer_checksum_is_validated() {
        let data = TransactionReceiptQueryData {
            transaction_id: Some("0.0.123-rmkyk@1700000000.000000000".parse().unwrap()),
        };
        data.validate_checksums(NetworkName::Testnet).unwrap();
        assert!(data.validate_checksums(NetworkName::Previewnet).is_err());
    }

    #[test]
    fn missing_transaction_id_fails_before_dispatch() {
        let empty = TransactionReceiptQueryData::default();
        assert!(matches!(empty.to_request(), Err(Error::Config(_))));
    }

    #[test]
    fn setters_chain() {
        let id = TransactionId::generate(AccountId::from_num(7));
        let mut q = TransactionReceiptQuery::new();
        q.transaction_id(id.clone())
            .node_account_ids([AccountId::from_num(3)]);
        assert_eq!(q.get_transaction_id(), Some(&id));
        assert_eq!(q.get_node_account_ids(), Some(&[AccountId::from_num(3)][..]));
    }
}

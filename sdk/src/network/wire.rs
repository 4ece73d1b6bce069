//! # Wire Messages
//!
//! What actually goes over a node channel. Everything is a serde type
//! encoded with `bincode` (fixed-width integers, size-limited decoding), and
//! framed by the channel layer.
//!
//! ```text
//! WireRequest ──► SubmitTransaction(SignedTransaction)
//!             └─► GetTransactionReceipt { transaction_id }
//!
//! WireResponse { status, body: Empty | Receipt(..) }
//! ```
//!
//! A frozen transaction produces one [`TransactionBody`] per candidate node.
//! The copies are identical except for `node_account_id`, and each is
//! signed independently, which is why signatures live next to the body bytes
//! in [`SignedTransaction`] rather than on the transaction as a whole.

use std::fmt;

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::MAX_FRAME_BYTES;
use crate::entity::AccountId;
use crate::error::{Error, Result};
use crate::query::TransactionReceipt;
use crate::transaction::signing::SignatureMap;
use crate::transaction::transfer::TransferTransactionData;
use crate::transaction::TransactionId;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Response codes a node can answer with, either at precheck or in a
/// receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Precheck passed; the transaction was accepted for consensus.
    Ok,
    /// Reached consensus and applied.
    Success,
    /// Node is overloaded. Try another.
    Busy,
    /// Not yet known; typically a receipt that hasn't reached consensus.
    Unknown,
    /// The node has no receipt for this transaction (yet).
    ReceiptNotFound,
    /// The node is up but not participating in consensus.
    PlatformNotActive,
    /// The node accepted the bytes but couldn't hand them to consensus.
    PlatformTransactionNotCreated,
    InvalidTransaction,
    InvalidTransactionBody,
    InvalidSignature,
    InvalidNodeAccount,
    InvalidAccountId,
    InvalidTokenId,
    InvalidTransactionId,
    InvalidTransactionStart,
    TransactionExpired,
    DuplicateTransaction,
    InsufficientTxFee,
    InsufficientPayerBalance,
    InsufficientAccountBalance,
    InvalidAccountAmounts,
    MemoTooLong,
    PayerAccountNotFound,
}

impl Status {
    /// SCREAMING_SNAKE_CASE name, as nodes and explorers print it.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Success => "SUCCESS",
            Self::Busy => "BUSY",
            Self::Unknown => "UNKNOWN",
            Self::ReceiptNotFound => "RECEIPT_NOT_FOUND",
            Self::PlatformNotActive => "PLATFORM_NOT_ACTIVE",
            Self::PlatformTransactionNotCreated => "PLATFORM_TRANSACTION_NOT_CREATED",
            Self::InvalidTransaction => "INVALID_TRANSACTION",
            Self::InvalidTransactionBody => "INVALID_TRANSACTION_BODY",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InvalidNodeAccount => "INVALID_NODE_ACCOUNT",
            Self::InvalidAccountId => "INVALID_ACCOUNT_ID",
            Self::InvalidTokenId => "INVALID_TOKEN_ID",
            Self::InvalidTransactionId => "INVALID_TRANSACTION_ID",
            Self::InvalidTransactionStart => "INVALID_TRANSACTION_START",
            Self::TransactionExpired => "TRANSACTION_EXPIRED",
            Self::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            Self::InsufficientTxFee => "INSUFFICIENT_TX_FEE",
            Self::InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
            Self::InsufficientAccountBalance => "INSUFFICIENT_ACCOUNT_BALANCE",
            Self::InvalidAccountAmounts => "INVALID_ACCOUNT_AMOUNTS",
            Self::MemoTooLong => "MEMO_TOO_LONG",
            Self::PayerAccountNotFound => "PAYER_ACCOUNT_NOT_FOUND",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// The signed part of a transaction, as it exists for one target node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionBody {
    pub transaction_id: TransactionId,
    pub node_account_id: AccountId,
    /// Max fee in tinybars.
    pub transaction_fee: i64,
    /// Validity window in seconds.
    pub transaction_valid_duration: u64,
    pub memo: String,
    pub data: TransactionBodyData,
}

/// Operation-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransactionBodyData {
    CryptoTransfer(TransferTransactionData),
}

/// Serialized body plus the signatures over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub body_bytes: Vec<u8>,
    pub sig_map: SignatureMap,
}

/// A transaction as a list of per-node signed copies, the form used by
/// [`Transaction::to_bytes`](crate::transaction::Transaction::to_bytes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionList {
    pub transactions: Vec<SignedTransaction>,
}

// ---------------------------------------------------------------------------
// Requests / Responses
// ---------------------------------------------------------------------------

/// Everything a node can be asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WireRequest {
    SubmitTransaction(SignedTransaction),
    GetTransactionReceipt { transaction_id: TransactionId },
}

/// A node's answer: a status code and, for queries, a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireResponse {
    pub status: Status,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseBody {
    Empty,
    Receipt(TransactionReceipt),
}

impl WireResponse {
    /// Bodiless response, what a transaction submission gets back.
    pub fn status(status: Status) -> Self {
        Self {
            status,
            body: ResponseBody::Empty,
        }
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_FRAME_BYTES as u64)
}

/// Encodes a wire message.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    options()
        .serialize(message)
        .map_err(|e| Error::Serialization(e.to_string()))
}

/// Decodes a wire message. Length prefixes inside the message are bounded
/// by [`MAX_FRAME_BYTES`], so a hostile node can't make us allocate
/// gigabytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    options()
        .deserialize(bytes)
        .map_err(|e| Error::Serialization(e.to_string()))
}

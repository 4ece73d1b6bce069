//! # SDK Errors
//!
//! Each subsystem owns a focused error enum ([`KeyError`], [`MnemonicError`],
//! [`KeystoreError`], [`EntityIdError`], [`TransportError`]). This module
//! ties them together into the one [`Error`] that crosses the public API of
//! transactions, queries and the client.
//!
//! ## Classes
//!
//! Most callers don't want to match forty variants. [`Error::kind`] folds
//! them into five classes:
//!
//! | Kind         | Meaning                                          | Retried? |
//! |--------------|--------------------------------------------------|----------|
//! | `Validation` | Malformed input, caught before any I/O           | never    |
//! | `State`      | Misuse of the transaction lifecycle              | never    |
//! | `Network`    | Transport trouble talking to a node              | yes      |
//! | `Protocol`   | A node answered, and the answer was "no"         | some     |
//! | `Exhaustion` | Attempt or time budget spent, or cancelled       | n/a      |
//!
//! The execution engine absorbs the retryable ones internally; by the time
//! an error reaches you, it is either permanent or an exhaustion wrapping the
//! last transient failure.

use std::time::Duration;

use thiserror::Error;

use crate::crypto::KeyError;
use crate::entity::{AccountId, EntityIdError};
use crate::keystore::KeystoreError;
use crate::mnemonic::MnemonicError;
use crate::network::channel::TransportError;
use crate::network::wire::Status;
use crate::transaction::TransactionId;

/// Result alias used throughout the SDK.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad key, mnemonic, checksum, keystore or argument.
    Validation,
    /// Setter after freeze, re-execution and similar lifecycle misuse.
    State,
    /// Transient transport failure.
    Network,
    /// Well-formed rejection from a node.
    Protocol,
    /// Attempt/time budget exhausted, deadline hit, or cancelled.
    Exhaustion,
}

/// Every error the SDK can return from a public operation.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Mnemonic(#[from] MnemonicError),

    #[error(transparent)]
    Keystore(#[from] KeystoreError),

    #[error(transparent)]
    EntityId(#[from] EntityIdError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A setter was called after the transaction was frozen.
    #[error("transaction is immutable; it has been frozen")]
    TransactionIsFrozen,

    /// Sign, freeze or execute on a transaction that already executed.
    #[error("transaction has already been executed")]
    TransactionAlreadyExecuted,

    /// Freeze without explicit node account IDs and without a client to
    /// choose them from.
    #[error("transaction must have node account IDs set, or be frozen with a client")]
    FreezeUnsetNodeAccountIds,

    /// Freeze without a transaction ID and without an operator to pay.
    #[error("transaction has no transaction ID and the client has no operator")]
    NoPayerAccountOrTransactionId,

    /// The memo is longer than the network accepts.
    #[error("memo is {len} bytes, the limit is {max}")]
    MemoTooLong {
        /// Actual length in bytes.
        len: usize,
        /// Network limit.
        max: usize,
    },

    /// Accumulated transfers for one account no longer fit in tinybars.
    #[error("transfer total for account {0} overflows")]
    AmountOverflow(AccountId),

    /// Every permitted attempt failed transiently.
    #[error("gave up after {attempts} attempts: {last}")]
    MaxAttemptsExceeded {
        /// Attempts made.
        attempts: usize,
        /// The last transient failure.
        last: Box<Error>,
    },

    /// The request's elapsed-time budget ran out between attempts.
    #[error("request timed out after {elapsed:?}: {last}")]
    Timeout {
        /// Time spent, retries included.
        elapsed: Duration,
        /// The last transient failure.
        last: Box<Error>,
    },

    /// The caller's cancellation token fired.
    #[error("request was cancelled")]
    Cancelled,

    /// The caller's deadline passed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// A node rejected the request with a permanent status, or a retryable
    /// one that was the last thing we heard.
    #[error(
        "node {node} returned {status}{}",
        transaction_id.as_ref().map(|id| format!(" for transaction {id}")).unwrap_or_default()
    )]
    Protocol {
        /// Precheck or receipt status.
        status: Status,
        /// Node that answered.
        node: AccountId,
        /// Transaction the request was about, if any.
        transaction_id: Option<TransactionId>,
    },

    /// The transaction reached consensus, but not successfully.
    #[error("receipt for transaction {transaction_id} has status {status}")]
    ReceiptStatus {
        /// Consensus status.
        status: Status,
        /// Transaction the receipt belongs to.
        transaction_id: TransactionId,
    },

    /// A message could not be encoded, or a node response could not be
    /// decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The client has no nodes to send to.
    #[error("no nodes available in the client network")]
    NoNodes,

    /// Client configuration is invalid.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl Error {
    /// Which class of failure this is.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Key(_)
            | Self::Mnemonic(_)
            | Self::Keystore(_)
            | Self::EntityId(_)
            | Self::MemoTooLong { .. }
            | Self::AmountOverflow(_)
            | Self::Config(_) => ErrorKind::Validation,

            Self::TransactionIsFrozen
            | Self::TransactionAlreadyExecuted
            | Self::FreezeUnsetNodeAccountIds
            | Self::NoPayerAccountOrTransactionId => ErrorKind::State,

            Self::Transport(_) | Self::Serialization(_) | Self::NoNodes => ErrorKind::Network,

            Self::Protocol { .. } | Self::ReceiptStatus { .. } => ErrorKind::Protocol,

            Self::MaxAttemptsExceeded { .. }
            | Self::Timeout { .. }
            | Self::Cancelled
            | Self::DeadlineExceeded => ErrorKind::Exhaustion,
        }
    }

    /// The innermost cause for exhaustion errors; `self` otherwise.
    pub fn last_error(&self) -> &Error {
        match self {
            Self::MaxAttemptsExceeded { last, .. } | Self::Timeout { last, .. } => last.last_error(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::NetworkName;

    #[test]
    fn kinds_follow_the_taxonomy() {
        let mismatch = EntityIdError::ChecksumMismatch {
            given: "aaaaa".into(),
            expected: "rmkyk".into(),
            network: NetworkName::Testnet,
        };
        assert_eq!(Error::from(mismatch).kind(), ErrorKind::Validation);
        assert_eq!(Error::TransactionIsFrozen.kind(), ErrorKind::State);
        assert_eq!(Error::Transport(TransportError::Timeout).kind(), ErrorKind::Network);
        assert_eq!(
            Error::Protocol {
                status: Status::InvalidSignature,
                node: AccountId::from_num(3),
                transaction_id: None,
            }
            .kind(),
            ErrorKind::Protocol
        );
        assert_eq!(Error::Cancelled.kind(), ErrorKind::Exhaustion);
    }

    #[test]
    fn exhaustion_exposes_last_error() {
        let err = Error::MaxAttemptsExceeded {
            attempts: 3,
            last: Box::new(Error::Transport(TransportError::Timeout)),
        };
        assert!(matches!(err.last_error(), Error::Transport(TransportError::Timeout)));
        assert!(err.to_string().starts_with("gave up after 3 attempts"));
    }

    #[test]
    fn protocol_error_message_names_node_and_status() {
        let err = Error::Protocol {
            status: Status::InsufficientPayerBalance,
            node: AccountId::from_num(5),
            transaction_id: None,
        };
        assert_eq!(err.to_string(), "node 0.0.5 returned INSUFFICIENT_PAYER_BALANCE");
    }
}

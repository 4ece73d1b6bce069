//! # Entity Identifiers
//!
//! Accounts, tokens, files and topics are all addressed as
//! `shard.realm.num`. Humans copy these between wallets, explorers and chat
//! windows, so the written form can carry a five-letter checksum that binds
//! it to one network.
//!
//! ## Where validation happens
//!
//! Parsing never checks a checksum, because parsing doesn't know which
//! network you mean. The execution engine runs [`ValidateChecksums`] over
//! every entity in a request against the client's configured network
//! *before* any node is contacted. A mismatch is a validation error with no
//! I/O behind it.

pub mod checksum;
pub mod id;
pub mod network_name;

use thiserror::Error;

pub use id::{AccountId, EntityId, FileId, TokenId, TopicId};
pub use network_name::NetworkName;

/// Errors from parsing or validating an entity ID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityIdError {
    /// The string is not `shard.realm.num[-checksum]`.
    #[error("malformed entity id: {0:?}")]
    Malformed(String),

    /// The carried checksum does not belong to this entity on this network.
    #[error(
        "network mismatch or wrong checksum given, given checksum: {given}, \
         correct checksum {expected}, network: {network}"
    )]
    ChecksumMismatch {
        /// What the caller wrote.
        given: String,
        /// What the configured network expects.
        expected: String,
        /// The network validation ran against.
        network: NetworkName,
    },

    /// Not one of the known network names.
    #[error("unknown network name: {0:?}")]
    UnknownNetwork(String),
}

/// Anything that embeds entity IDs whose checksums must be checked before
/// a request leaves the process.
pub trait ValidateChecksums {
    /// Fails on the first entity whose checksum does not match `network`.
    fn validate_checksums(&self, network: NetworkName) -> Result<(), EntityIdError>;
}

impl<T: ValidateChecksums> ValidateChecksums for Option<T> {
    fn validate_checksums(&self, network: NetworkName) -> Result<(), EntityIdError> {
        match self {
            Some(inner) => inner.validate_checksums(network),
            None => Ok(()),
        }
    }
}

impl<T: ValidateChecksums> ValidateChecksums for [T] {
    fn validate_checksums(&self, network: NetworkName) -> Result<(), EntityIdError> {
        self.iter().try_for_each(|item| item.validate_checksums(network))
    }
}

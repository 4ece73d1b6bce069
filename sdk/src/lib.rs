// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Ledger SDK — Client Library
//!
//! Everything a client needs to talk to a ledger network it doesn't run:
//! keys, the mnemonics and keystores they live in, transactions that spend
//! them, and the engine that gets those transactions past flaky nodes.
//!
//! There is no consensus code in here and no node implementation. We assume
//! the nodes are someone else's, that some of them are down right now, and
//! that the rest will occasionally say `BUSY` just to keep things
//! interesting.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **crypto** — Ed25519 and secp256k1 keys behind one type. Sign, verify,
//!   derive, export.
//! - **mnemonic** — BIP-39 phrases, SLIP-10 derivation, and the legacy
//!   scheme old wallets still depend on, reproduced bit for bit.
//! - **keystore** — Passphrase-encrypted keys at rest: JSON keystores and
//!   PKCS#8 PEM.
//! - **entity** — `shard.realm.num` IDs and their network checksums.
//! - **transaction** — The Mutable → Frozen → Executed builder.
//! - **query** — Read-only requests, starting with receipts.
//! - **network** — Client context, node health, channels, and the retry
//!   engine.
//! - **config** — Every constant, in one place.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use ledger_sdk::{AccountId, Client, Hbar, NetworkName, PrivateKey, TransferTransaction};
//!
//! # fn main() -> ledger_sdk::Result<()> {
//! let network = HashMap::from([("127.0.0.1:50211".to_string(), AccountId::from_num(3))]);
//! let client = Client::for_network(network);
//! client.set_network_name(NetworkName::Testnet);
//! client.set_operator(AccountId::from_num(1001), PrivateKey::generate_ed25519());
//!
//! let response = TransferTransaction::new()
//!     .hbar_transfer(AccountId::from_num(1001), -Hbar::new(5))?
//!     .hbar_transfer("0.0.2002-cycsi".parse()?, Hbar::new(5))?
//!     .execute(&client)?;
//! let receipt = response.get_receipt(&client)?;
//! println!("{}", receipt.status);
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Philosophy
//!
//! 1. Fail closed. A keystore with a bad MAC never yields a single
//!    decrypted byte.
//! 2. Fail early. A checksum for the wrong network is caught before any
//!    node hears about it.
//! 3. No hidden threads. Every call blocks its caller and nothing else.
//! 4. Old keys keep working. Compatibility vectors are tests, not folklore.

pub mod config;
pub mod crypto;
pub mod entity;
pub mod error;
pub mod keystore;
pub mod mnemonic;
pub mod network;
pub mod query;
pub mod transaction;

pub use crypto::{KeyError, KeyScheme, PrivateKey, PublicKey};
pub use entity::{AccountId, EntityId, EntityIdError, FileId, NetworkName, TokenId, TopicId};
pub use error::{Error, ErrorKind, Result};
pub use keystore::{Keystore, KeystoreError, KeystoreParams};
pub use mnemonic::{Mnemonic, MnemonicError};
pub use network::{CancellationToken, Client, ClientConfig, ExecuteOptions, Status};
pub use query::{TransactionReceipt, TransactionReceiptQuery};
pub use transaction::{
    Hbar, Transaction, TransactionId, TransactionResponse, TransferTransaction,
};

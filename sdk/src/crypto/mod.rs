//! # Cryptographic Primitives
//!
//! Every signature the SDK puts on a transaction, and every key it parses,
//! flows through here.
//!
//! - **Ed25519** for the default account keys. Fast, deterministic, boring.
//! - **ECDSA secp256k1** for EVM-compatible accounts, prehashed with
//!   Keccak-256 the way Ethereum tooling expects.
//! - **SHA-384** for transaction hashes, because that's what the network
//!   uses to name a submitted transaction.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Curve arithmetic, signing and ASN.1 parsing are delegated to
//! audited crates. This module only decides *which* bytes go where. If you
//! are tempted to optimize any of it, please reconsider. Then reconsider
//! again.

pub mod der;
pub mod hash;
pub mod keys;

pub use hash::{keccak256, sha256, sha384};
pub use keys::{KeyError, KeyScheme, PrivateKey, PublicKey};

//! # Encrypted Key Storage
//!
//! Two ways to put a private key on disk without putting it on disk:
//!
//! - **JSON keystore** ([`json`]): PBKDF2-HMAC-SHA256 stretches the
//!   passphrase, AES-128-CTR encrypts the key, HMAC-SHA384 authenticates the
//!   ciphertext. The layout follows the familiar Web3 keystore shape so
//!   existing wallets can read what we write.
//! - **PEM** ([`pem`]): PKCS#8 `PRIVATE KEY` blocks, plain or PBES2-encrypted
//!   `ENCRYPTED PRIVATE KEY` blocks.
//!
//! ## Fail-closed decoding
//!
//! Decoding either format with the wrong passphrase returns
//! [`KeystoreError::InvalidPassphraseOrCorruptKeystore`] and nothing else.
//! For the JSON keystore the MAC is checked before a single byte is
//! decrypted. A wrong passphrase and a flipped ciphertext bit look identical
//! from the outside, which is the point.

pub mod json;
pub mod pem;

use thiserror::Error;

use crate::crypto::keys::KeyError;

pub use json::{Keystore, KeystoreParams};

/// Errors from encoding or decoding encrypted key material.
#[derive(Debug, Error)]
pub enum KeystoreError {
    /// MAC mismatch or undecryptable payload. Deliberately vague.
    #[error("invalid passphrase or corrupt keystore")]
    InvalidPassphraseOrCorruptKeystore,

    /// The document is not shaped like a keystore at all.
    #[error("malformed keystore: {0}")]
    Malformed(String),

    /// A keystore version we don't know how to read.
    #[error("unsupported keystore version {0}")]
    UnsupportedVersion(u32),

    /// A cipher, KDF or PRF other than the ones we write.
    #[error("unsupported keystore algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// An encrypted PEM block was given without a passphrase.
    #[error("encrypted PEM requires a passphrase")]
    MissingPassphrase,

    /// A PEM block with a label other than the private key labels.
    #[error("unsupported PEM label: {0}")]
    UnsupportedPemLabel(String),

    /// The decrypted payload did not make a valid key.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Reading the keystore failed.
    #[error("keystore I/O error: {0}")]
    Io(#[from] std::io::Error),
}

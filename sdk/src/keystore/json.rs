//! JSON keystore codec.
//!
//! ```text
//! {
//!   "version": 1,
//!   "crypto": {
//!     "ciphertext": "<hex>",
//!     "cipherparams": { "iv": "<hex>" },
//!     "cipher": "aes-128-ctr",
//!     "kdf": "pbkdf2",
//!     "kdfparams": { "dkLen": 32, "salt": "<hex>", "c": 262144, "prf": "hmac-sha256" },
//!     "mac": "<hex>"
//!   },
//!   "keyType": "ed25519"
//! }
//! ```
//!
//! The derived key splits in half: the first 16 bytes key AES-128-CTR, the
//! last 16 key HMAC-SHA384 over the ciphertext.

use std::io::Read;

use aes::Aes128;
use ctr::cipher::generic_array::GenericArray;
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384};
use zeroize::Zeroizing;

use super::KeystoreError;
use crate::config::{KEYSTORE_DK_LEN, KEYSTORE_KDF_ROUNDS, KEYSTORE_SALT_LEN, KEYSTORE_VERSION};
use crate::crypto::keys::{KeyScheme, PrivateKey};

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type HmacSha384 = Hmac<Sha384>;

const CIPHER: &str = "aes-128-ctr";
const KDF: &str = "pbkdf2";
const PRF: &str = "hmac-sha256";

/// Tunables for writing a keystore.
#[derive(Debug, Clone, Copy)]
pub struct KeystoreParams {
    /// PBKDF2 iteration count.
    pub rounds: u32,
}

impl Default for KeystoreParams {
    fn default() -> Self {
        Self {
            rounds: KEYSTORE_KDF_ROUNDS,
        }
    }
}

/// On-disk keystore document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keystore {
    /// Format version.
    pub version: u32,
    /// Cipher, KDF and MAC material.
    pub crypto: KeystoreCrypto,
    /// Scheme of the wrapped key. Absent in older keystores, which were
    /// always Ed25519.
    #[serde(rename = "keyType", default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<KeyScheme>,
}

/// The `crypto` object of a keystore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeystoreCrypto {
    pub ciphertext: String,
    pub cipherparams: CipherParams,
    pub cipher: String,
    pub kdf: String,
    pub kdfparams: KdfParams,
    pub mac: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherParams {
    pub iv: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfParams {
    #[serde(rename = "dkLen")]
    pub dk_len: usize,
    pub salt: String,
    pub c: u32,
    pub prf: String,
}

impl Keystore {
    /// Encrypts `key` under `passphrase`.
    pub fn encrypt(
        key: &PrivateKey,
        passphrase: &str,
        params: &KeystoreParams,
    ) -> Result<Self, KeystoreError> {
        let mut salt = [0u8; KEYSTORE_SALT_LEN];
        let mut iv = [0u8; 16];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut iv);

        let derived = derive_key(passphrase, &salt, params.rounds);

        let mut ciphertext = key.to_bytes_raw().to_vec();
        let mut cipher = Aes128Ctr::new(
            GenericArray::from_slice(&derived[..16]),
            GenericArray::from_slice(&iv),
        );
        cipher.apply_keystream(&mut ciphertext);

        let mac = compute_mac(&derived[16..], &ciphertext)?;

        Ok(Self {
            version: KEYSTORE_VERSION,
            crypto: KeystoreCrypto {
                ciphertext: hex::encode(&ciphertext),
                cipherparams: CipherParams {
                    iv: hex::encode(iv),
                },
                cipher: CIPHER.to_string(),
                kdf: KDF.to_string(),
                kdfparams: KdfParams {
                    dk_len: KEYSTORE_DK_LEN,
                    salt: hex::encode(salt),
                    c: params.rounds,
                    prf: PRF.to_string(),
                },
                mac: hex::encode(mac),
            },
            key_type: Some(key.scheme()),
        })
    }

    /// Verifies the MAC, then decrypts. A wrong passphrase never gets as far
    /// as the cipher.
    pub fn decrypt(&self, passphrase: &str) -> Result<PrivateKey, KeystoreError> {
        if self.version != KEYSTORE_VERSION {
            return Err(KeystoreError::UnsupportedVersion(self.version));
        }
        let crypto = &self.crypto;
        if crypto.cipher != CIPHER {
            return Err(KeystoreError::UnsupportedAlgorithm(crypto.cipher.clone()));
        }
        if crypto.kdf != KDF {
            return Err(KeystoreError::UnsupportedAlgorithm(crypto.kdf.clone()));
        }
        if crypto.kdfparams.prf != PRF {
            return Err(KeystoreError::UnsupportedAlgorithm(crypto.kdfparams.prf.clone()));
        }
        if crypto.kdfparams.dk_len != KEYSTORE_DK_LEN {
            return Err(KeystoreError::Malformed(format!(
                "dkLen must be {KEYSTORE_DK_LEN}, got {}",
                crypto.kdfparams.dk_len
            )));
        }
        if crypto.kdfparams.c == 0 {
            return Err(KeystoreError::Malformed("kdf round count is zero".into()));
        }

        let salt = decode_field("salt", &crypto.kdfparams.salt)?;
        let iv = decode_field("iv", &crypto.cipherparams.iv)?;
        let ciphertext = decode_field("ciphertext", &crypto.ciphertext)?;
        let mac = decode_field("mac", &crypto.mac)?;
        if iv.len() != 16 {
            return Err(KeystoreError::Malformed(format!("iv must be 16 bytes, got {}", iv.len())));
        }

        let derived = derive_key(passphrase, &salt, crypto.kdfparams.c);

        let mut verifier = new_mac(&derived[16..])?;
        verifier.update(&ciphertext);
        verifier
            .verify_slice(&mac)
            .map_err(|_| KeystoreError::InvalidPassphraseOrCorruptKeystore)?;

        let mut plaintext = Zeroizing::new(ciphertext);
        let mut cipher = Aes128Ctr::new_from_slices(&derived[..16], &iv)
            .map_err(|_| KeystoreError::Malformed("bad cipher parameters".into()))?;
        cipher.apply_keystream(&mut plaintext);

        let key = match self.key_type.unwrap_or(KeyScheme::Ed25519) {
            KeyScheme::Ed25519 => PrivateKey::from_bytes_ed25519(&plaintext)?,
            KeyScheme::EcdsaSecp256k1 => PrivateKey::from_bytes_ecdsa(&plaintext)?,
        };
        Ok(key)
    }
}

fn derive_key(passphrase: &str, salt: &[u8], rounds: u32) -> Zeroizing<[u8; KEYSTORE_DK_LEN]> {
    let mut out = Zeroizing::new([0u8; KEYSTORE_DK_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, rounds, &mut out[..]);
    out
}

fn new_mac(key: &[u8]) -> Result<HmacSha384, KeystoreError> {
    HmacSha384::new_from_slice(key).map_err(|_| KeystoreError::Malformed("invalid MAC key".into()))
}

fn compute_mac(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, KeystoreError> {
    let mut mac = new_mac(key)?;
    mac.update(ciphertext);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, KeystoreError> {
    hex::decode(value).map_err(|_| KeystoreError::Malformed(format!("{name} is not valid hex")))
}

impl PrivateKey {
    /// Serializes this key as a JSON keystore with the default KDF cost.
    pub fn to_keystore(&self, passphrase: &str) -> Result<Vec<u8>, KeystoreError> {
        self.to_keystore_with(passphrase, &KeystoreParams::default())
    }

    /// Serializes this key as a JSON keystore with explicit parameters.
    pub fn to_keystore_with(
        &self,
        passphrase: &str,
        params: &KeystoreParams,
    ) -> Result<Vec<u8>, KeystoreError> {
        let keystore = Keystore::encrypt(self, passphrase, params)?;
        serde_json::to_vec(&keystore).map_err(|e| KeystoreError::Malformed(e.to_string()))
    }

    /// Parses and decrypts a JSON keystore.
    pub fn from_keystore(bytes: &[u8], passphrase: &str) -> Result<Self, KeystoreError> {
        let keystore: Keystore =
            serde_json::from_slice(bytes).map_err(|e| KeystoreError::Malformed(e.to_string()))?;
        keystore.decrypt(passphrase)
    }

    /// Reads a JSON keystore from `reader` and decrypts it.
    pub fn read_keystore<R: Read>(mut reader: R, passphrase: &str) -> Result<Self, KeystoreError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_keystore(&bytes, passphrase)
    }
}

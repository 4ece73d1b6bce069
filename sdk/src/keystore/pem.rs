//! PEM import and export.
//!
//! Three labels are understood on input:
//!
//! | Label                   | Payload                                  |
//! |-------------------------|------------------------------------------|
//! | `PRIVATE KEY`           | PKCS#8, either scheme                    |
//! | `ENCRYPTED PRIVATE KEY` | PBES2-wrapped PKCS#8, needs a passphrase |
//! | `EC PRIVATE KEY`        | SEC1, secp256k1 only                     |
//!
//! Output is always PKCS#8, encrypted with PBKDF2-SHA256 + AES-256-CBC when
//! a passphrase is given.

use ::pem::{EncodeConfig, LineEnding, Pem};
use pkcs8::pkcs5::pbes2;
use pkcs8::{EncryptedPrivateKeyInfo, PrivateKeyInfo};
use rand::rngs::OsRng;
use rand::RngCore;

use super::KeystoreError;
use crate::config::PEM_PBKDF2_ROUNDS;
use crate::crypto::keys::{KeyError, KeyScheme, PrivateKey};

const PRIVATE_KEY: &str = "PRIVATE KEY";
const ENCRYPTED_PRIVATE_KEY: &str = "ENCRYPTED PRIVATE KEY";
const EC_PRIVATE_KEY: &str = "EC PRIVATE KEY";

fn encode(label: &str, contents: Vec<u8>) -> String {
    let config = EncodeConfig::new().set_line_ending(LineEnding::LF);
    ::pem::encode_config(&Pem::new(label, contents), config)
}

impl PrivateKey {
    /// Parses a PEM block. `passphrase` is required for encrypted blocks
    /// and ignored otherwise.
    pub fn from_pem(text: &str, passphrase: Option<&str>) -> Result<Self, KeystoreError> {
        let block = ::pem::parse(text).map_err(|e| KeystoreError::Malformed(e.to_string()))?;

        match block.tag() {
            PRIVATE_KEY => Ok(Self::from_bytes_der(block.contents())?),
            ENCRYPTED_PRIVATE_KEY => {
                let passphrase = passphrase.ok_or(KeystoreError::MissingPassphrase)?;
                let info = EncryptedPrivateKeyInfo::try_from(block.contents())
                    .map_err(|e| KeystoreError::Malformed(e.to_string()))?;
                // CBC padding failure and a garbled inner document are the
                // same answer: wrong passphrase or a damaged file.
                let document = info
                    .decrypt(passphrase)
                    .map_err(|_| KeystoreError::InvalidPassphraseOrCorruptKeystore)?;
                Self::from_bytes_der(document.as_bytes())
                    .map_err(|_| KeystoreError::InvalidPassphraseOrCorruptKeystore)
            }
            EC_PRIVATE_KEY => {
                let secret = k256::SecretKey::from_sec1_der(block.contents())
                    .map_err(|_| KeyError::InvalidKeyBytes(KeyScheme::EcdsaSecp256k1))?;
                Ok(Self::from_bytes_ecdsa(&secret.to_bytes())?)
            }
            other => Err(KeystoreError::UnsupportedPemLabel(other.to_string())),
        }
    }

    /// Unencrypted PKCS#8 PEM.
    pub fn to_pem(&self) -> String {
        encode(PRIVATE_KEY, self.to_bytes_der().to_vec())
    }

    /// PKCS#8 PEM encrypted under `passphrase` with PBES2
    /// (PBKDF2-HMAC-SHA256, AES-256-CBC).
    pub fn to_encrypted_pem(&self, passphrase: &str) -> Result<String, KeystoreError> {
        let mut salt = [0u8; 16];
        let mut iv = [0u8; 16];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut iv);

        let params = pbes2::Parameters::pbkdf2_sha256_aes256cbc(PEM_PBKDF2_ROUNDS, &salt, &iv)
            .map_err(|e| KeystoreError::Malformed(e.to_string()))?;

        let der = self.to_bytes_der();
        let info = PrivateKeyInfo::try_from(der.as_slice())
            .map_err(|e| KeystoreError::Malformed(e.to_string()))?;
        let encrypted = info
            .encrypt_with_params(params, passphrase)
            .map_err(|e| KeystoreError::Malformed(e.to_string()))?;

        Ok(encode(ENCRYPTED_PRIVATE_KEY, encrypted.as_bytes().to_vec()))
    }
}

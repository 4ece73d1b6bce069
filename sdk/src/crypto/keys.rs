//! # Key Material
//!
//! Private and public keys for the two signature schemes the network
//! accepts, modelled as tagged variants rather than a trait hierarchy.
//!
//! ## Schemes
//!
//! - **Ed25519**: 32-byte seed, RFC 8032 signatures over the raw message.
//! - **ECDSA secp256k1**: 32-byte scalar, RFC 6979 deterministic nonces,
//!   signatures over the Keccak-256 of the message, returned as the 64-byte
//!   `r ‖ s` concatenation (no recovery byte).
//!
//! ## String forms
//!
//! `Display` on both key types produces hex-encoded DER, which is what every
//! other tool in the ecosystem expects. `to_string_raw()` gives the bare key
//! bytes. Parsing sniffs the framing from the length and the DER header, so
//! raw and DER inputs are both accepted.
//!
//! ## Security considerations
//!
//! - `PrivateKey` does not implement `Serialize`. Exporting a secret is an
//!   explicit call: `to_bytes_raw`, `to_bytes_der`, a keystore, or a PEM.
//! - `Debug` never prints secret bytes.
//! - Temporary copies of secret material are wrapped in [`Zeroizing`].

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signer, Verifier};
use k256::ecdsa::signature::{DigestSigner, DigestVerifier};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use thiserror::Error;
use zeroize::Zeroizing;

use super::der;
use super::hash::keccak256;
use crate::mnemonic::derivation;

/// Errors from parsing, converting or deriving keys.
///
/// Messages describe the shape of the problem, never the key bytes.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The input matched neither a raw key length nor a DER document.
    #[error("invalid key length: {0} bytes matches neither raw nor DER framing")]
    InvalidKeyLength(usize),

    /// The DER algorithm identifier names a scheme we don't speak.
    #[error("unsupported key algorithm: {0}")]
    UnsupportedScheme(String),

    /// A scheme-specific parser was handed a key of the other scheme.
    #[error("expected a {expected} key, found {found}")]
    SchemeMismatch {
        /// Scheme the caller asked for.
        expected: KeyScheme,
        /// Scheme the input actually encodes.
        found: KeyScheme,
    },

    /// The bytes have the right length but are not a valid key.
    #[error("key bytes are not a valid {0} key")]
    InvalidKeyBytes(KeyScheme),

    /// The string was not valid hex.
    #[error("key string is not valid hex")]
    InvalidHex,

    /// Derivation was requested on a key that can't support it.
    #[error("key cannot be derived: {0}")]
    NotDerivable(&'static str),

    /// Legacy derivation index outside the encodable range.
    #[error("legacy derivation index {0} is out of range")]
    IndexOutOfRange(i64),
}

/// Which signature scheme a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyScheme {
    /// Ed25519 (RFC 8032).
    #[serde(rename = "ed25519")]
    Ed25519,
    /// ECDSA over secp256k1 with Keccak-256 prehashing.
    #[serde(rename = "ecdsa")]
    EcdsaSecp256k1,
}

impl fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "ed25519"),
            Self::EcdsaSecp256k1 => write!(f, "ecdsa-secp256k1"),
        }
    }
}

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum PrivateKeyKind {
    Ed25519(ed25519_dalek::SigningKey),
    Ecdsa(k256::ecdsa::SigningKey),
}

/// A private key of either scheme, optionally carrying a SLIP-10 chain code
/// that makes it derivable.
///
/// # Examples
///
/// ```
/// use ledger_sdk::crypto::PrivateKey;
///
/// let key = PrivateKey::generate_ed25519();
/// let sig = key.sign(b"transfer 5 hbar");
/// assert!(key.public_key().verify(b"transfer 5 hbar", &sig));
/// ```
#[derive(Clone)]
pub struct PrivateKey {
    kind: PrivateKeyKind,
    chain_code: Option<[u8; 32]>,
}

impl PrivateKey {
    /// Fresh Ed25519 key from the OS RNG.
    pub fn generate_ed25519() -> Self {
        Self::from_kind(PrivateKeyKind::Ed25519(ed25519_dalek::SigningKey::generate(
            &mut OsRng,
        )))
    }

    /// Fresh secp256k1 key from the OS RNG.
    pub fn generate_ecdsa() -> Self {
        Self::from_kind(PrivateKeyKind::Ecdsa(k256::ecdsa::SigningKey::random(&mut OsRng)))
    }

    fn from_kind(kind: PrivateKeyKind) -> Self {
        Self {
            kind,
            chain_code: None,
        }
    }

    /// Attaches a chain code, making the key derivable.
    pub(crate) fn with_chain_code(mut self, chain_code: [u8; 32]) -> Self {
        self.chain_code = Some(chain_code);
        self
    }

    /// Ed25519 key from a 32-byte seed.
    pub fn from_ed25519_seed(seed: &[u8; 32]) -> Self {
        Self::from_kind(PrivateKeyKind::Ed25519(ed25519_dalek::SigningKey::from_bytes(seed)))
    }

    /// Parses bytes in any supported framing.
    ///
    /// Bare 32-byte and 64-byte inputs are taken as Ed25519 (seed, or
    /// seed ‖ public key). Everything else must be a PKCS#8 document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        match bytes.len() {
            32 | 64 => Self::from_bytes_ed25519(bytes),
            _ => Self::from_bytes_der(bytes),
        }
    }

    /// Parses an Ed25519 key: 32-byte seed, 64-byte `seed ‖ public`, or DER.
    pub fn from_bytes_ed25519(bytes: &[u8]) -> Result<Self, KeyError> {
        match bytes.len() {
            32 | 64 => {
                let mut seed = Zeroizing::new([0u8; 32]);
                seed.copy_from_slice(&bytes[..32]);
                Ok(Self::from_ed25519_seed(&seed))
            }
            _ => Self::from_bytes_der(bytes).and_then(|k| k.expect_scheme(KeyScheme::Ed25519)),
        }
    }

    /// Parses a secp256k1 key: 32-byte scalar or DER.
    pub fn from_bytes_ecdsa(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() == 32 {
            let key = k256::ecdsa::SigningKey::from_slice(bytes)
                .map_err(|_| KeyError::InvalidKeyBytes(KeyScheme::EcdsaSecp256k1))?;
            return Ok(Self::from_kind(PrivateKeyKind::Ecdsa(key)));
        }
        Self::from_bytes_der(bytes).and_then(|k| k.expect_scheme(KeyScheme::EcdsaSecp256k1))
    }

    /// Parses a PKCS#8 document, picking the scheme from its algorithm OID.
    pub fn from_bytes_der(bytes: &[u8]) -> Result<Self, KeyError> {
        let (scheme, secret) = der::decode_private_key(bytes)?;
        if secret.len() != 32 {
            return Err(KeyError::InvalidKeyLength(secret.len()));
        }
        match scheme {
            KeyScheme::Ed25519 => Self::from_bytes_ed25519(&secret),
            KeyScheme::EcdsaSecp256k1 => Self::from_bytes_ecdsa(&secret),
        }
    }

    /// Parses an Ed25519 key from hex (raw or DER).
    pub fn from_str_ed25519(s: &str) -> Result<Self, KeyError> {
        Self::from_bytes_ed25519(&decode_hex(s)?)
    }

    /// Parses a secp256k1 key from hex (raw or DER).
    pub fn from_str_ecdsa(s: &str) -> Result<Self, KeyError> {
        Self::from_bytes_ecdsa(&decode_hex(s)?)
    }

    fn expect_scheme(self, expected: KeyScheme) -> Result<Self, KeyError> {
        let found = self.scheme();
        if found == expected {
            Ok(self)
        } else {
            Err(KeyError::SchemeMismatch { expected, found })
        }
    }

    /// Which scheme this key belongs to.
    pub fn scheme(&self) -> KeyScheme {
        match self.kind {
            PrivateKeyKind::Ed25519(_) => KeyScheme::Ed25519,
            PrivateKeyKind::Ecdsa(_) => KeyScheme::EcdsaSecp256k1,
        }
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        match &self.kind {
            PrivateKeyKind::Ed25519(key) => PublicKey::Ed25519(key.verifying_key().to_bytes()),
            PrivateKeyKind::Ecdsa(key) => {
                let point = key.verifying_key().to_encoded_point(true);
                let mut bytes = [0u8; 33];
                bytes.copy_from_slice(point.as_bytes());
                PublicKey::Ecdsa(bytes)
            }
        }
    }

    /// Signs a message. Ed25519 signs the bytes directly; ECDSA signs
    /// their Keccak-256 digest. Both return 64 bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match &self.kind {
            PrivateKeyKind::Ed25519(key) => key.sign(message).to_bytes().to_vec(),
            PrivateKeyKind::Ecdsa(key) => {
                let signature: k256::ecdsa::Signature =
                    key.sign_digest(Keccak256::new_with_prefix(message));
                signature.to_bytes().to_vec()
            }
        }
    }

    /// The raw 32-byte secret. Handle with care.
    pub fn to_bytes_raw(&self) -> Zeroizing<Vec<u8>> {
        match &self.kind {
            PrivateKeyKind::Ed25519(key) => Zeroizing::new(key.to_bytes().to_vec()),
            PrivateKeyKind::Ecdsa(key) => Zeroizing::new(key.to_bytes().to_vec()),
        }
    }

    /// The secret in compact PKCS#8 framing.
    pub fn to_bytes_der(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(der::encode_private_key(self.scheme(), &self.to_bytes_raw()))
    }

    /// Hex of the raw secret.
    pub fn to_string_raw(&self) -> String {
        hex::encode(self.to_bytes_raw().as_slice())
    }

    /// Hex of the DER-framed secret. Same as `to_string()`.
    pub fn to_string_der(&self) -> String {
        hex::encode(self.to_bytes_der().as_slice())
    }

    /// SLIP-10 chain code, present on keys that came out of a mnemonic.
    pub fn chain_code(&self) -> Option<&[u8; 32]> {
        self.chain_code.as_ref()
    }

    /// Whether [`derive`](Self::derive) will work on this key.
    pub fn is_derivable(&self) -> bool {
        matches!(self.kind, PrivateKeyKind::Ed25519(_)) && self.chain_code.is_some()
    }

    /// Hardened SLIP-10 child at `index`.
    pub fn derive(&self, index: u32) -> Result<Self, KeyError> {
        let PrivateKeyKind::Ed25519(key) = &self.kind else {
            return Err(KeyError::NotDerivable("only ed25519 keys support derivation"));
        };
        let chain_code = self
            .chain_code
            .as_ref()
            .ok_or(KeyError::NotDerivable("key has no chain code"))?;

        let (child, child_chain) = derivation::slip10_child(&key.to_bytes(), chain_code, index)?;
        Ok(Self::from_ed25519_seed(&child).with_chain_code(child_chain))
    }

    /// Child key under the legacy scheme. `-1` selects the default legacy
    /// account; `0xff_ffff_ffff` is the reserved all-ones index.
    pub fn legacy_derive(&self, index: i64) -> Result<Self, KeyError> {
        let PrivateKeyKind::Ed25519(key) = &self.kind else {
            return Err(KeyError::NotDerivable("only ed25519 keys support legacy derivation"));
        };
        let seed = Zeroizing::new(key.to_bytes());
        let child = derivation::legacy_child(&seed, index)?;
        Ok(Self::from_ed25519_seed(&child))
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(&decode_hex(s)?)
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_der())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Public half only.
        write!(f, "PrivateKey({}, pub={})", self.scheme(), self.public_key())
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.public_key() == other.public_key()
    }
}

impl Eq for PrivateKey {}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// A public key. ECDSA keys are always held in 33-byte compressed form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PublicKey {
    /// 32-byte Edwards point.
    Ed25519([u8; 32]),
    /// 33-byte compressed SEC1 point.
    Ecdsa([u8; 33]),
}

impl PublicKey {
    /// Parses bytes in any supported framing: 32 (Ed25519), 33 or 65
    /// (secp256k1 SEC1) or SPKI DER.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        match bytes.len() {
            32 => Self::from_bytes_ed25519(bytes),
            33 | 65 => Self::from_bytes_ecdsa(bytes),
            _ => Self::from_bytes_der(bytes),
        }
    }

    /// Parses an Ed25519 point, raw or DER.
    pub fn from_bytes_ed25519(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != 32 {
            return Self::from_bytes_der(bytes).and_then(|k| k.expect_scheme(KeyScheme::Ed25519));
        }
        let mut point = [0u8; 32];
        point.copy_from_slice(bytes);
        ed25519_dalek::VerifyingKey::from_bytes(&point)
            .map_err(|_| KeyError::InvalidKeyBytes(KeyScheme::Ed25519))?;
        Ok(Self::Ed25519(point))
    }

    /// Parses a secp256k1 point (compressed, uncompressed or DER).
    pub fn from_bytes_ecdsa(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != 33 && bytes.len() != 65 {
            return Self::from_bytes_der(bytes)
                .and_then(|k| k.expect_scheme(KeyScheme::EcdsaSecp256k1));
        }
        let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|_| KeyError::InvalidKeyBytes(KeyScheme::EcdsaSecp256k1))?;
        let mut compressed = [0u8; 33];
        compressed.copy_from_slice(key.to_encoded_point(true).as_bytes());
        Ok(Self::Ecdsa(compressed))
    }

    /// Parses an SPKI document.
    pub fn from_bytes_der(bytes: &[u8]) -> Result<Self, KeyError> {
        let (scheme, raw) = der::decode_public_key(bytes)?;
        match scheme {
            KeyScheme::Ed25519 if raw.len() == 32 => Self::from_bytes_ed25519(&raw),
            KeyScheme::EcdsaSecp256k1 if raw.len() == 33 || raw.len() == 65 => {
                Self::from_bytes_ecdsa(&raw)
            }
            _ => Err(KeyError::InvalidKeyLength(raw.len())),
        }
    }

    /// Parses an Ed25519 key from hex (raw or DER).
    pub fn from_str_ed25519(s: &str) -> Result<Self, KeyError> {
        Self::from_bytes_ed25519(&decode_hex(s)?)
    }

    /// Parses a secp256k1 key from hex (raw or DER).
    pub fn from_str_ecdsa(s: &str) -> Result<Self, KeyError> {
        Self::from_bytes_ecdsa(&decode_hex(s)?)
    }

    fn expect_scheme(self, expected: KeyScheme) -> Result<Self, KeyError> {
        let found = self.scheme();
        if found == expected {
            Ok(self)
        } else {
            Err(KeyError::SchemeMismatch { expected, found })
        }
    }

    /// Which scheme this key belongs to.
    pub fn scheme(&self) -> KeyScheme {
        match self {
            Self::Ed25519(_) => KeyScheme::Ed25519,
            Self::Ecdsa(_) => KeyScheme::EcdsaSecp256k1,
        }
    }

    /// Raw key bytes (32 or 33).
    pub fn to_bytes_raw(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(bytes) => bytes.to_vec(),
            Self::Ecdsa(bytes) => bytes.to_vec(),
        }
    }

    /// Compact SPKI framing.
    pub fn to_bytes_der(&self) -> Vec<u8> {
        der::encode_public_key(self.scheme(), &self.to_bytes_raw())
    }

    /// Hex of the raw key bytes.
    pub fn to_string_raw(&self) -> String {
        hex::encode(self.to_bytes_raw())
    }

    /// Hex of the DER framing. Same as `to_string()`.
    pub fn to_string_der(&self) -> String {
        hex::encode(self.to_bytes_der())
    }

    /// Checks a signature produced by [`PrivateKey::sign`].
    ///
    /// Returns `false` for malformed signatures rather than an error; the
    /// caller almost never cares *why* a signature is bad.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::Ed25519(bytes) => {
                let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(bytes) else {
                    return false;
                };
                let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
                    return false;
                };
                key.verify(message, &sig).is_ok()
            }
            Self::Ecdsa(bytes) => {
                let Ok(key) = k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes) else {
                    return false;
                };
                let Ok(sig) = k256::ecdsa::Signature::from_slice(signature) else {
                    return false;
                };
                key.verify_digest(Keccak256::new_with_prefix(message), &sig)
                    .is_ok()
            }
        }
    }

    /// The 20-byte EVM address for a secp256k1 key, hex without `0x`.
    /// `None` for Ed25519 keys.
    pub fn to_evm_address(&self) -> Option<String> {
        let Self::Ecdsa(bytes) = self else {
            return None;
        };
        let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes).ok()?;
        let uncompressed = key.to_encoded_point(false);
        let hash = keccak256(&uncompressed.as_bytes()[1..]);
        Some(hex::encode(&hash[12..]))
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(&decode_hex(s)?)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_der())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}, {})", self.scheme(), self.to_string_raw())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_der())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn decode_hex(s: &str) -> Result<Zeroizing<Vec<u8>>, KeyError> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map(Zeroizing::new).map_err(|_| KeyError::InvalidHex)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED25519_DER: &str = "302e020100300506032b657004220420db484b828e64b2d8f12ce3c0a0e93a0b8cce7af1bb8f39c97732394482538e10";
    const ED25519_PUBLIC_DER: &str =
        "302a300506032b6570032100e0c8ec2758a5879ffac226a13c0c516b799e72e35141a0dd828f94d37988a4b7";
    const ECDSA_DER: &str = "3030020100300706052b8104000a04220420d790c27a81d745ad3340e27dacedc982d1f9252c0d7a4582da9847e2094603d4";
    const ECDSA_PUBLIC_DER: &str = "302f300706052b8104000a032400042102b46925b64940f5d7d3f394aba914c05f1607fa42e9e721afee0770cb55797d99";

    #[test]
    fn generated_ed25519_key_has_der_prefix() {
        let key = PrivateKey::generate_ed25519();
        assert!(key.to_string().starts_with(crate::config::ED25519_PRIVATE_KEY_DER_PREFIX));
    }

    #[test]
    fn ed25519_der_string_round_trips() {
        let key: PrivateKey = ED25519_DER.parse().unwrap();
        assert_eq!(key.to_string(), ED25519_DER);
        assert_eq!(key.public_key().to_string(), ED25519_PUBLIC_DER);
    }

    #[test]
    fn ed25519_concatenated_seed_and_public_key_is_accepted() {
        let concatenated = "db484b828e64b2d8f12ce3c0a0e93a0b8cce7af1bb8f39c97732394482538e10\
                            e0c8ec2758a5879ffac226a13c0c516b799e72e35141a0dd828f94d37988a4b7";
        let key = PrivateKey::from_str_ed25519(concatenated).unwrap();
        assert_eq!(key.to_string(), ED25519_DER);
    }

    #[test]
    fn ed25519_raw_hex_round_trips() {
        let key = PrivateKey::generate_ed25519();
        let restored = PrivateKey::from_str_ed25519(&key.to_string_raw()).unwrap();
        assert_eq!(restored.to_bytes_raw(), key.to_bytes_raw());
    }

    #[test]
    fn ed25519_public_key_raw_and_der_agree() {
        let from_der: PublicKey = ED25519_PUBLIC_DER.parse().unwrap();
        let from_raw = PublicKey::from_str_ed25519(&from_der.to_string_raw()).unwrap();
        assert_eq!(from_der, from_raw);
    }

    #[test]
    fn ecdsa_public_key_matches_known_vector() {
        let key = PrivateKey::from_str_ecdsa(ECDSA_DER).unwrap();
        assert_eq!(key.scheme(), KeyScheme::EcdsaSecp256k1);
        assert_eq!(key.public_key().to_string(), ECDSA_PUBLIC_DER);
    }

    #[test]
    fn ecdsa_generic_parse_detects_scheme_from_der() {
        let key: PrivateKey = ECDSA_DER.parse().unwrap();
        assert_eq!(key.scheme(), KeyScheme::EcdsaSecp256k1);
        assert_eq!(key.to_string(), ECDSA_DER);
    }

    #[test]
    fn ecdsa_raw_round_trip() {
        let key = PrivateKey::generate_ecdsa();
        let restored = PrivateKey::from_str_ecdsa(&key.to_string_raw()).unwrap();
        assert_eq!(restored.to_string(), key.to_string());

        let public = key.public_key();
        let restored = PublicKey::from_str_ecdsa(&public.to_string_raw()).unwrap();
        assert_eq!(restored, public);
        let restored = PublicKey::from_str_ecdsa(&public.to_string()).unwrap();
        assert_eq!(restored, public);
    }

    #[test]
    fn ecdsa_sign_verify() {
        let key = PrivateKey::generate_ecdsa();
        let sig = key.sign(b"aaa");
        assert_eq!(sig.len(), 64);
        assert!(key.public_key().verify(b"aaa", &sig));
        assert!(!key.public_key().verify(b"aab", &sig));
    }

    #[test]
    fn ed25519_sign_verify() {
        let key: PrivateKey = ED25519_DER.parse().unwrap();
        let sig = key.sign(b"hello world");
        assert_eq!(sig.len(), 64);
        assert!(key.public_key().verify(b"hello world", &sig));
        assert!(!PrivateKey::generate_ed25519().public_key().verify(b"hello world", &sig));
    }

    #[test]
    fn malformed_signature_is_rejected_not_panicking() {
        let key = PrivateKey::generate_ed25519();
        assert!(!key.public_key().verify(b"msg", &[0u8; 12]));
        let key = PrivateKey::generate_ecdsa();
        assert!(!key.public_key().verify(b"msg", &[0u8; 12]));
    }

    #[test]
    fn evm_address_matches_known_vector() {
        let key = PublicKey::from_str_ecdsa(
            "03af80b90d25145da28c583359beb47b21796b2fe1a23c1511e443e7a64dfdb27d",
        )
        .unwrap();
        assert_eq!(
            key.to_evm_address().as_deref(),
            Some("627306090abab3a6e1400e9345bc60c78a8bef57")
        );
        let ed: PublicKey = ED25519_PUBLIC_DER.parse().unwrap();
        assert!(ed.to_evm_address().is_none());
    }

    #[test]
    fn wrong_length_is_invalid_key_length() {
        let err = "deadbeef".parse::<PrivateKey>().unwrap_err();
        assert!(matches!(err, KeyError::InvalidKeyLength(4)));
    }

    #[test]
    fn non_hex_is_rejected() {
        assert!(matches!(
            "not-a-key".parse::<PrivateKey>(),
            Err(KeyError::InvalidHex)
        ));
    }

    #[test]
    fn scheme_specific_parser_rejects_other_scheme() {
        let err = PrivateKey::from_str_ed25519(ECDSA_DER).unwrap_err();
        assert!(matches!(
            err,
            KeyError::SchemeMismatch {
                expected: KeyScheme::Ed25519,
                found: KeyScheme::EcdsaSecp256k1
            }
        ));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let key: PrivateKey = ED25519_DER.parse().unwrap();
        let debug = format!("{key:?}");
        assert!(debug.starts_with("PrivateKey(ed25519, pub="));
        assert!(!debug.contains("db484b828e64"));
    }

    #[test]
    fn keys_without_chain_code_are_not_derivable() {
        let key = PrivateKey::generate_ed25519();
        assert!(!key.is_derivable());
        assert!(matches!(key.derive(0), Err(KeyError::NotDerivable(_))));
        assert!(matches!(
            PrivateKey::generate_ecdsa().legacy_derive(0),
            Err(KeyError::NotDerivable(_))
        ));
    }

    #[test]
    fn public_key_serde_uses_der_string() {
        let key: PublicKey = ED25519_PUBLIC_DER.parse().unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{ED25519_PUBLIC_DER}\""));
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}

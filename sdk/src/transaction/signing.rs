//! Signature maps: who signed a node-specific body, and with what.
//!
//! Each frozen transaction carries one [`SignatureMap`] per candidate node.
//! Entries are keyed by public-key bytes and tagged with the scheme, so a
//! node can verify them without guessing the algorithm.
//!
//! A map never holds two entries for the same public key. Signing twice with
//! one key is a no-op, not a duplicate.

use serde::{Deserialize, Serialize};

use crate::crypto::{KeyScheme, PublicKey};

/// Raw signature bytes tagged with the scheme that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signature {
    /// 64-byte RFC 8032 signature.
    Ed25519(Vec<u8>),
    /// 64-byte `r‖s` over the Keccak-256 digest.
    EcdsaSecp256k1(Vec<u8>),
}

impl Signature {
    pub fn new(scheme: KeyScheme, bytes: Vec<u8>) -> Self {
        match scheme {
            KeyScheme::Ed25519 => Self::Ed25519(bytes),
            KeyScheme::EcdsaSecp256k1 => Self::EcdsaSecp256k1(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Ed25519(bytes) | Self::EcdsaSecp256k1(bytes) => bytes,
        }
    }
}

/// One signer's entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePair {
    /// Raw public key bytes (32 for Ed25519, 33 for compressed secp256k1).
    pub public_key: Vec<u8>,
    pub signature: Signature,
}

impl SignaturePair {
    pub fn new(public_key: &PublicKey, signature: Vec<u8>) -> Self {
        Self {
            public_key: public_key.to_bytes_raw(),
            signature: Signature::new(public_key.scheme(), signature),
        }
    }

    /// The signer, if the stored bytes are a valid key for the tagged scheme.
    pub fn signer(&self) -> Option<PublicKey> {
        match self.signature {
            Signature::Ed25519(_) => PublicKey::from_bytes_ed25519(&self.public_key).ok(),
            Signature::EcdsaSecp256k1(_) => PublicKey::from_bytes_ecdsa(&self.public_key).ok(),
        }
    }
}

/// All signatures over one node-specific body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureMap {
    pairs: Vec<SignaturePair>,
}

impl SignatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `public_key` already has an entry.
    pub fn contains(&self, public_key: &PublicKey) -> bool {
        let raw = public_key.to_bytes_raw();
        self.pairs.iter().any(|pair| pair.public_key == raw)
    }

    /// Adds an entry unless the key already signed. Returns whether anything
    /// was added.
    pub fn push(&mut self, public_key: &PublicKey, signature: Vec<u8>) -> bool {
        if self.contains(public_key) {
            return false;
        }
        self.pairs.push(SignaturePair::new(public_key, signature));
        true
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignaturePair> {
        self.pairs.iter()
    }

    /// Checks every entry against `body_bytes`. An unparseable key counts as
    /// a failed signature.
    pub fn verify_all(&self, body_bytes: &[u8]) -> bool {
        self.pairs.iter().all(|pair| {
            pair.signer()
                .is_some_and(|key| key.verify(body_bytes, pair.signature.as_bytes()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;

    #[test]
    fn push_deduplicates_by_signer() {
        let key = PrivateKey::generate_ed25519();
        let mut map = SignatureMap::new();

        assert!(map.push(&key.public_key(), key.sign(b"body")));
        assert!(!map.push(&key.public_key(), key.sign(b"body")));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn entries_carry_scheme_tags() {
        let ed = PrivateKey::generate_ed25519();
        let ec = PrivateKey::generate_ecdsa();
        let mut map = SignatureMap::new();
        map.push(&ed.public_key(), ed.sign(b"body"));
        map.push(&ec.public_key(), ec.sign(b"body"));

        let tags: Vec<_> = map
            .iter()
            .map(|pair| matches!(pair.signature, Signature::Ed25519(_)))
            .collect();
        assert_eq!(tags, [true, false]);
        assert_eq!(map.iter().nth(1).unwrap().public_key.len(), 33);
        assert!(map.verify_all(b"body"));
        assert!(!map.verify_all(b"other body"));
    }

    #[test]
    fn signer_round_trips_through_raw_bytes() {
        let key = PrivateKey::generate_ecdsa();
        let pair = SignaturePair::new(&key.public_key(), key.sign(b"x"));
        assert_eq!(pair.signer(), Some(key.public_key()));
    }
}

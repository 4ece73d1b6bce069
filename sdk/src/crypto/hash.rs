//! # Hashing Utilities
//!
//! The three digests the SDK actually needs, and no more:
//!
//! - **SHA-384** — the network identifies a submitted transaction by the
//!   SHA-384 of its signed bytes. Also keys the keystore MAC.
//! - **Keccak-256** — ECDSA signing prehash and EVM address derivation.
//!   Note: this is the original Keccak padding, *not* FIPS-202 SHA3-256.
//!   Mixing them up produces valid-looking but wrong addresses.
//! - **SHA-256** — general-purpose fingerprints (tests, tooling).

use sha2::{Digest, Sha256, Sha384};
use sha3::Keccak256;

/// SHA-256 digest as a fixed-size array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-384 digest as a fixed-size array.
pub fn sha384(data: &[u8]) -> [u8; 48] {
    Sha384::digest(data).into()
}

/// Keccak-256 digest (Ethereum flavor).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha384_of_empty_input() {
        assert_eq!(
            hex::encode(sha384(b"")),
            "38b060a751ac96384cd9327eb1b1e36a21fdb71114be07434c0cc7bf63f6e1da\
             274edebfe76f65fbd51ad2f14898b95b"
        );
    }

    #[test]
    fn keccak_is_not_sha3() {
        // Keccak-256("") differs from SHA3-256("") (a7ffc6f8...).
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }
}

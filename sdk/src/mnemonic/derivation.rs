//! Deterministic child-key derivation.
//!
//! Two schemes live here, both pure functions of their inputs:
//!
//! - **Standard**: SLIP-10 for Ed25519. Hardened-only, because Ed25519 has
//!   no public-parent-to-public-child derivation.
//! - **Legacy**: the scheme the first generation of wallets shipped with.
//!   It is a PBKDF2 stretch over the parent key and an oddly encoded index.
//!   The encoding quirks are load-bearing: accounts created years ago were
//!   derived this way and must keep resolving to the same keys.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroizing;

use crate::config::{
    HARDENED, LEGACY_RESERVED_INDEX, MNEMONIC_PBKDF2_ROUNDS, SLIP10_ED25519_SEED,
};
use crate::crypto::keys::KeyError;

type HmacSha512 = Hmac<Sha512>;

/// A 32-byte private key paired with its 32-byte chain code.
pub type ExtendedKey = (Zeroizing<[u8; 32]>, [u8; 32]);

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<Zeroizing<[u8; 64]>, KeyError> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|_| KeyError::NotDerivable("HMAC rejected the chain key"))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

fn split(i: &[u8; 64]) -> ExtendedKey {
    let mut key = Zeroizing::new([0u8; 32]);
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&i[..32]);
    chain_code.copy_from_slice(&i[32..]);
    (key, chain_code)
}

// ---------------------------------------------------------------------------
// Standard (SLIP-10)
// ---------------------------------------------------------------------------

/// Master key and chain code from a BIP-39 seed.
pub fn slip10_master(seed: &[u8]) -> Result<ExtendedKey, KeyError> {
    Ok(split(&*hmac_sha512(SLIP10_ED25519_SEED, &[seed])?))
}

/// One hardened derivation step. The hardened bit is forced on, so callers
/// may pass either `5` or `5 | 0x8000_0000`.
pub fn slip10_child(
    key: &[u8; 32],
    chain_code: &[u8; 32],
    index: u32,
) -> Result<ExtendedKey, KeyError> {
    let index = (index | HARDENED).to_be_bytes();
    Ok(split(&*hmac_sha512(chain_code, &[&[0u8], key, &index])?))
}

/// Walks a full path from the seed.
pub fn slip10_derive_path(seed: &[u8], path: &[u32]) -> Result<ExtendedKey, KeyError> {
    let (mut key, mut chain_code) = slip10_master(seed)?;
    for &index in path {
        (key, chain_code) = slip10_child(&key, &chain_code, index)?;
    }
    Ok((key, chain_code))
}

// ---------------------------------------------------------------------------
// Legacy
// ---------------------------------------------------------------------------

/// Encodes a legacy index into the 8 bytes mixed into the PBKDF2 password.
///
/// The reserved index `0xff_ffff_ffff` becomes five trailing `0xff` bytes.
/// For everything else the high word is a sign fill and the low word
/// repeats the least-significant byte four times.
fn legacy_index_bytes(index: i64) -> Result<[u8; 8], KeyError> {
    if index == LEGACY_RESERVED_INDEX {
        return Ok([0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0xff]);
    }
    if index > u32::MAX as i64 {
        return Err(KeyError::IndexOutOfRange(index));
    }

    let fill = if index < 0 { 0xff } else { 0x00 };
    let low = index as u8;
    Ok([fill, fill, fill, fill, low, low, low, low])
}

/// Legacy child key: PBKDF2-HMAC-SHA512 over `parent ‖ index_bytes` with a
/// single `0xff` salt byte.
pub fn legacy_child(parent: &[u8; 32], index: i64) -> Result<Zeroizing<[u8; 32]>, KeyError> {
    let index_bytes = legacy_index_bytes(index)?;

    let mut password = Zeroizing::new(Vec::with_capacity(40));
    password.extend_from_slice(parent);
    password.extend_from_slice(&index_bytes);

    let mut out = Zeroizing::new([0u8; 32]);
    pbkdf2::pbkdf2_hmac::<Sha512>(&password, &[0xff], MNEMONIC_PBKDF2_ROUNDS, &mut out[..]);
    Ok(out)
}

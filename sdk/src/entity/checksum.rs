//! Network-bound entity checksums.
//!
//! A checksum is five lowercase letters derived from the `shard.realm.num`
//! digit string and a per-network salt. The same entity has a different
//! checksum on every network, so pasting a testnet address into a mainnet
//! wallet fails loudly instead of paying the wrong account.
//!
//! The arithmetic is fixed by the published address format; do not tune it.

use super::NetworkName;

const P3: u64 = 26 * 26 * 26;
const P5: u64 = 26 * 26 * 26 * 26 * 26;
const MULTIPLIER: u64 = 1_000_003;
const WEIGHT: u64 = 31;

/// Length of a well-formed checksum.
pub const CHECKSUM_LEN: usize = 5;

/// Computes the checksum of `shard.realm.num` on `network`.
pub fn checksum(network: NetworkName, shard: u64, realm: u64, num: u64) -> String {
    let address = format!("{shard}.{realm}.{num}");
    let digits: Vec<u64> = address
        .bytes()
        .map(|b| if b == b'.' { 10 } else { u64::from(b - b'0') })
        .collect();

    // Weighted running sum, plus digit sums at even and odd positions.
    let mut s = 0;
    let mut s0 = 0;
    let mut s1 = 0;
    for (i, &d) in digits.iter().enumerate() {
        s = (WEIGHT * s + d) % P3;
        if i % 2 == 0 {
            s0 = (s0 + d) % 11;
        } else {
            s1 = (s1 + d) % 11;
        }
    }

    let sh = network
        .checksum_salt()
        .iter()
        .fold(0, |acc, &b| (WEIGHT * acc + u64::from(b)) % P5);

    let mut c = ((((digits.len() as u64 % 5) * 11 + s0) * 11 + s1) * P3 + s + sh) % P5;
    c = (c * MULTIPLIER) % P5;

    let mut letters = [0u8; CHECKSUM_LEN];
    for slot in letters.iter_mut().rev() {
        *slot = b'a' + (c % 26) as u8;
        c /= 26;
    }
    letters.iter().map(|&b| b as char).collect()
}

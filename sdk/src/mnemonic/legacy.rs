//! The 22-word legacy mnemonic codec.
//!
//! Before BIP-39 phrases were adopted, wallets exported keys as 22 words
//! drawn from a 4096-entry table. Each word carries 12 bits, so 22 words
//! hold 264 bits: a 32-byte entropy XOR-masked with a CRC-8 byte, followed
//! by that CRC byte.
//!
//! The SDK does not embed the table. Callers load it from wherever they keep
//! it ([`LegacyWordList::from_text`]) and hand it to
//! [`Mnemonic::to_legacy_private_key_with`](super::Mnemonic::to_legacy_private_key_with).

use std::collections::HashMap;

use zeroize::Zeroizing;

use super::MnemonicError;

/// Number of entries in a legacy word table.
pub const LEGACY_WORD_LIST_LEN: usize = 4096;

/// Number of words in a legacy phrase.
pub const LEGACY_WORD_COUNT: usize = 22;

/// A 4096-word lookup table for legacy phrases.
#[derive(Clone)]
pub struct LegacyWordList {
    words: Vec<String>,
    index: HashMap<String, u32>,
}

impl LegacyWordList {
    /// Builds a table from whitespace- or newline-separated words, in table
    /// order. Fails unless there are exactly 4096 distinct entries.
    pub fn from_text(text: &str) -> Result<Self, MnemonicError> {
        Self::from_words(text.split_whitespace().map(str::to_owned))
    }

    /// Builds a table from an iterator of words, in table order.
    pub fn from_words<I>(words: I) -> Result<Self, MnemonicError>
    where
        I: IntoIterator<Item = String>,
    {
        let words: Vec<String> = words.into_iter().map(|w| w.to_lowercase()).collect();
        if words.len() != LEGACY_WORD_LIST_LEN {
            return Err(MnemonicError::InvalidWordList(words.len()));
        }

        let mut index = HashMap::with_capacity(words.len());
        for (i, word) in words.iter().enumerate() {
            if index.insert(word.clone(), i as u32).is_some() {
                return Err(MnemonicError::InvalidWordList(words.len()));
            }
        }

        Ok(Self { words, index })
    }

    /// Decodes 22 words into the 32-byte entropy, verifying the CRC.
    pub fn decode(&self, words: &[String]) -> Result<Zeroizing<[u8; 32]>, MnemonicError> {
        if words.len() != LEGACY_WORD_COUNT {
            return Err(MnemonicError::InvalidWordCount(words.len()));
        }

        let indices = words
            .iter()
            .map(|w| {
                self.index
                    .get(w.as_str())
                    .copied()
                    .ok_or_else(|| MnemonicError::UnknownWord(w.clone()))
            })
            .collect::<Result<Vec<u32>, _>>()?;

        let data = Zeroizing::new(convert_radix(&indices, 4096, 256, 33));
        let crc = data[32] as u8;

        let mut entropy = Zeroizing::new([0u8; 32]);
        for (out, byte) in entropy.iter_mut().zip(data.iter()) {
            *out = (*byte as u8) ^ crc;
        }

        if crc8(entropy.as_slice()) != crc {
            return Err(MnemonicError::InvalidChecksum);
        }
        Ok(entropy)
    }

    /// Encodes 32 bytes of entropy as 22 words.
    pub fn encode(&self, entropy: &[u8; 32]) -> Vec<String> {
        let crc = crc8(entropy);
        let mut data: Vec<u32> = entropy.iter().map(|b| (b ^ crc) as u32).collect();
        data.push(crc as u32);

        convert_radix(&data, 256, 4096, LEGACY_WORD_COUNT)
            .into_iter()
            .map(|i| self.words[i as usize].clone())
            .collect()
    }
}

impl std::fmt::Debug for LegacyWordList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LegacyWordList({} words)", self.words.len())
    }
}

/// CRC-8 with reflected polynomial `0xb2`, init and final XOR `0xff`.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xff;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = (crc >> 1) ^ if crc & 1 == 1 { 0xb2 } else { 0 };
        }
    }
    crc ^ 0xff
}

/// Re-expresses a big-endian number given in `from` digits as exactly
/// `len` big-endian digits in base `to`. High digits that don't fit are
/// dropped.
fn convert_radix(digits: &[u32], from: u32, to: u32, len: usize) -> Vec<u32> {
    let mut num: Vec<u32> = digits.to_vec();
    let mut out = vec![0u32; len];

    for slot in out.iter_mut().rev() {
        let mut rem: u64 = 0;
        for digit in num.iter_mut() {
            let acc = rem * from as u64 + *digit as u64;
            *digit = (acc / to as u64) as u32;
            rem = acc % to as u64;
        }
        *slot = rem as u32;
    }

    out
}

//! # Mnemonic Phrases
//!
//! Human-transcribable backups for Ed25519 account keys. Two generations of
//! phrase are in circulation and both have to keep working:
//!
//! - **Standard** (12 or 24 words): BIP-39 English list. The seed is the
//!   PBKDF2-HMAC-SHA512 stretch of the phrase plus an optional passphrase,
//!   and the account key sits at `m/44'/3030'/0'/0'` under SLIP-10.
//! - **Legacy** (22 words, or 24 words read the old way): the entropy *is*
//!   the key. No passphrase, no path. Children come from
//!   [`PrivateKey::legacy_derive`].
//!
//! ## Security considerations
//!
//! The phrase is the key. It is zeroized on drop, never logged, and `Debug`
//! prints only the word count. `Display` exists because showing the words to
//! the user is the whole point of a mnemonic; treat its output accordingly.

pub mod derivation;
pub mod legacy;

use std::fmt;
use std::str::FromStr;

use bip39::{ErrorKind as Bip39ErrorKind, Language, MnemonicType, Seed};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::config::STANDARD_DERIVATION_PATH;
use crate::crypto::keys::{KeyError, PrivateKey};

pub use legacy::LegacyWordList;

/// Errors from parsing or converting a mnemonic.
#[derive(Debug, Error)]
pub enum MnemonicError {
    /// The checksum bits don't match the words.
    #[error("mnemonic checksum mismatch")]
    InvalidChecksum,

    /// A word isn't in the list the phrase claims to use.
    #[error("unknown mnemonic word: {0:?}")]
    UnknownWord(String),

    /// Only 12, 22 and 24 words are meaningful.
    #[error("invalid mnemonic length: {0} words")]
    InvalidWordCount(usize),

    /// A legacy word table did not have exactly 4096 distinct entries.
    #[error("legacy word list must have 4096 distinct words, got {0}")]
    InvalidWordList(usize),

    /// A 22-word phrase can only be decoded with a legacy word table.
    #[error("22-word legacy phrase requires a legacy word list to decode")]
    LegacyWordListRequired,

    /// Standard derivation was requested on a 22-word legacy phrase.
    #[error("22-word phrases only support legacy derivation")]
    RequiresLegacyDerivation,

    /// The underlying BIP-39 implementation rejected the phrase for a
    /// reason not covered above.
    #[error("malformed mnemonic: {0}")]
    Malformed(String),

    /// The decoded entropy did not make a valid key.
    #[error(transparent)]
    Key(#[from] KeyError),
}

#[derive(Clone)]
enum Phrase {
    Standard(bip39::Mnemonic),
    Legacy(Zeroizing<Vec<String>>),
}

/// A validated mnemonic phrase.
///
/// # Examples
///
/// ```
/// use ledger_sdk::mnemonic::Mnemonic;
///
/// let mnemonic = Mnemonic::generate_24();
/// let key = mnemonic.to_private_key("").unwrap();
/// assert!(key.is_derivable());
/// ```
#[derive(Clone)]
pub struct Mnemonic {
    phrase: Phrase,
}

impl Mnemonic {
    /// Fresh 24-word phrase from the OS RNG.
    pub fn generate_24() -> Self {
        Self::standard(bip39::Mnemonic::new(MnemonicType::Words24, Language::English))
    }

    /// Fresh 12-word phrase from the OS RNG.
    pub fn generate_12() -> Self {
        Self::standard(bip39::Mnemonic::new(MnemonicType::Words12, Language::English))
    }

    /// Phrase encoding the given entropy (16 or 32 bytes).
    pub fn from_entropy(entropy: &[u8]) -> Result<Self, MnemonicError> {
        bip39::Mnemonic::from_entropy(entropy, Language::English)
            .map(Self::standard)
            .map_err(|err| MnemonicError::Malformed(err.to_string()))
    }

    fn standard(inner: bip39::Mnemonic) -> Self {
        Self {
            phrase: Phrase::Standard(inner),
        }
    }

    /// Parses a 12, 22 or 24-word phrase from individual words.
    pub fn from_words<I, S>(words: I) -> Result<Self, MnemonicError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Zeroizing<Vec<String>> = Zeroizing::new(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .collect(),
        );

        match words.len() {
            12 | 24 => {
                let phrase = Zeroizing::new(words.join(" "));
                match bip39::Mnemonic::from_phrase(&phrase, Language::English) {
                    Ok(inner) => Ok(Self::standard(inner)),
                    Err(err) => Err(classify_bip39_error(err, &words)),
                }
            }
            // Words are checked against the table at decode time.
            legacy::LEGACY_WORD_COUNT => Ok(Self {
                phrase: Phrase::Legacy(words),
            }),
            n => Err(MnemonicError::InvalidWordCount(n)),
        }
    }

    /// The words, in order.
    pub fn words(&self) -> Vec<&str> {
        match &self.phrase {
            Phrase::Standard(inner) => inner.phrase().split(' ').collect(),
            Phrase::Legacy(words) => words.iter().map(String::as_str).collect(),
        }
    }

    /// Whether this is a 22-word legacy phrase.
    pub fn is_legacy(&self) -> bool {
        matches!(self.phrase, Phrase::Legacy(_))
    }

    /// The 64-byte BIP-39 seed for `passphrase`.
    pub fn to_seed(&self, passphrase: &str) -> Result<Zeroizing<[u8; 64]>, MnemonicError> {
        let Phrase::Standard(inner) = &self.phrase else {
            return Err(MnemonicError::RequiresLegacyDerivation);
        };
        let seed = Seed::new(inner, passphrase);
        let mut out = Zeroizing::new([0u8; 64]);
        out.copy_from_slice(seed.as_bytes());
        Ok(out)
    }

    /// The standard account key at `m/44'/3030'/0'/0'`. The returned key
    /// carries its chain code, so it can be [`derive`](PrivateKey::derive)d
    /// further.
    pub fn to_private_key(&self, passphrase: &str) -> Result<PrivateKey, MnemonicError> {
        let seed = self.to_seed(passphrase)?;
        let (key, chain_code) = derivation::slip10_derive_path(&*seed, &STANDARD_DERIVATION_PATH)?;
        Ok(PrivateKey::from_ed25519_seed(&key).with_chain_code(chain_code))
    }

    /// The legacy root key of a 24-word phrase: the phrase's raw entropy.
    ///
    /// 22-word phrases need the legacy table; see
    /// [`to_legacy_private_key_with`](Self::to_legacy_private_key_with).
    pub fn to_legacy_private_key(&self) -> Result<PrivateKey, MnemonicError> {
        match &self.phrase {
            Phrase::Standard(inner) => {
                let entropy = inner.entropy();
                if entropy.len() != 32 {
                    return Err(MnemonicError::InvalidWordCount(self.words().len()));
                }
                Ok(PrivateKey::from_bytes_ed25519(entropy)?)
            }
            Phrase::Legacy(_) => Err(MnemonicError::LegacyWordListRequired),
        }
    }

    /// Like [`to_legacy_private_key`](Self::to_legacy_private_key), but able
    /// to decode 22-word phrases against `table`.
    pub fn to_legacy_private_key_with(
        &self,
        table: &LegacyWordList,
    ) -> Result<PrivateKey, MnemonicError> {
        match &self.phrase {
            Phrase::Standard(_) => self.to_legacy_private_key(),
            Phrase::Legacy(words) => {
                let entropy = table.decode(words)?;
                Ok(PrivateKey::from_ed25519_seed(&entropy))
            }
        }
    }
}

/// Maps a BIP-39 parse failure onto our error, naming the offending word
/// when there is one.
fn classify_bip39_error(err: anyhow::Error, words: &[String]) -> MnemonicError {
    match err.downcast_ref::<Bip39ErrorKind>() {
        Some(Bip39ErrorKind::InvalidChecksum) => MnemonicError::InvalidChecksum,
        Some(Bip39ErrorKind::InvalidWord) => words
            .iter()
            .find(|w| !is_standard_word(w))
            .map(|w| MnemonicError::UnknownWord(w.clone()))
            .unwrap_or_else(|| MnemonicError::Malformed(err.to_string())),
        Some(Bip39ErrorKind::InvalidWordLength(n)) => MnemonicError::InvalidWordCount(*n),
        _ => MnemonicError::Malformed(err.to_string()),
    }
}

/// Word lookup happens before the length check, so a lone word parses to
/// `InvalidWordLength` when it's in the list and `InvalidWord` when not.
fn is_standard_word(word: &str) -> bool {
    match bip39::Mnemonic::from_phrase(word, Language::English) {
        Ok(_) => true,
        Err(err) => !matches!(
            err.downcast_ref::<Bip39ErrorKind>(),
            Some(Bip39ErrorKind::InvalidWord)
        ),
    }
}

impl FromStr for Mnemonic {
    type Err = MnemonicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_words(s.split_whitespace())
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.words().join(" "))
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_legacy() { "legacy" } else { "standard" };
        write!(f, "Mnemonic({kind}, {} words)", self.words().len())
    }
}

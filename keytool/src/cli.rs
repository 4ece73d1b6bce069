//! # CLI Interface
//!
//! Defines the command-line argument structure for `ledger-keytool` using
//! `clap` derive. Five subcommand families: `generate`, `mnemonic`,
//! `keystore`, `pem`, and `checksum`.
//!
//! Secrets (passphrases, phrases) can come from the environment so they
//! stay out of shell history.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ledger_sdk::{AccountId, KeyScheme, NetworkName};

use crate::logging::LogFormat;

/// Key, mnemonic and keystore utility for the ledger SDK.
///
/// Everything runs offline. No command talks to a network.
#[derive(Parser, Debug)]
#[command(
    name = "ledger-keytool",
    about = "Key, mnemonic and keystore utility for the ledger SDK",
    version,
    propagate_version = true
)]
pub struct KeytoolCli {
    /// Log output format. Logs go to stderr; results go to stdout.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a fresh random private key.
    Generate(GenerateArgs),
    /// Create mnemonics and recover keys from them.
    #[command(subcommand)]
    Mnemonic(MnemonicCommand),
    /// Encrypt keys into, or decrypt them out of, JSON keystores.
    #[command(subcommand)]
    Keystore(KeystoreCommand),
    /// Convert keys to and from PKCS#8 PEM.
    #[command(subcommand)]
    Pem(PemCommand),
    /// Compute or verify an entity ID checksum.
    Checksum(ChecksumArgs),
}

/// Signature scheme selector.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeArg {
    Ed25519,
    Ecdsa,
}

impl From<SchemeArg> for KeyScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Ed25519 => KeyScheme::Ed25519,
            SchemeArg::Ecdsa => KeyScheme::EcdsaSecp256k1,
        }
    }
}

/// Arguments for `generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Signature scheme of the new key.
    #[arg(long, short = 's', value_enum, default_value_t = SchemeArg::Ed25519)]
    pub scheme: SchemeArg,
}

/// `mnemonic` subcommands.
#[derive(Subcommand, Debug)]
pub enum MnemonicCommand {
    /// Generate a new random phrase.
    Generate {
        /// Phrase length.
        #[arg(long, short = 'w', value_enum, default_value_t = WordCount::TwentyFour)]
        words: WordCount,
    },
    /// Recover a private key from a phrase.
    ToKey(ToKeyArgs),
}

/// Supported phrase lengths for new mnemonics.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCount {
    #[value(name = "12")]
    Twelve,
    #[value(name = "24")]
    TwentyFour,
}

/// Arguments for `mnemonic to-key`.
#[derive(Args, Debug)]
pub struct ToKeyArgs {
    /// The phrase, space separated.
    #[arg(long, env = "LEDGER_MNEMONIC", hide_env_values = true)]
    pub phrase: String,

    /// Optional BIP-39 passphrase. Ignored with `--legacy`.
    #[arg(long, env = "LEDGER_MNEMONIC_PASSPHRASE", hide_env_values = true, default_value = "")]
    pub passphrase: String,

    /// Use the legacy derivation instead of SLIP-10.
    #[arg(long)]
    pub legacy: bool,

    /// Word table for 22-word legacy phrases, one word per line.
    #[arg(long, requires = "legacy")]
    pub word_list: Option<PathBuf>,

    /// Derive this child index from the recovered root.
    #[arg(long, short = 'i', allow_negative_numbers = true)]
    pub index: Option<i64>,
}

/// `keystore` subcommands.
#[derive(Subcommand, Debug)]
pub enum KeystoreCommand {
    /// Encrypt a private key into a JSON keystore file.
    Encrypt {
        /// Private key, hex (raw Ed25519 or DER).
        #[arg(long, env = "LEDGER_PRIVATE_KEY", hide_env_values = true)]
        key: String,

        /// Keystore file to write.
        #[arg(long, short = 'o')]
        out: PathBuf,

        /// Passphrase protecting the keystore.
        #[arg(long, env = "LEDGER_KEYSTORE_PASSPHRASE", hide_env_values = true)]
        passphrase: String,

        /// PBKDF2 iteration count. Defaults to the SDK's setting.
        #[arg(long)]
        rounds: Option<u32>,
    },
    /// Decrypt a JSON keystore file and print the key.
    Decrypt {
        /// Keystore file to read.
        #[arg(long, short = 'f')]
        file: PathBuf,

        /// Passphrase protecting the keystore.
        #[arg(long, env = "LEDGER_KEYSTORE_PASSPHRASE", hide_env_values = true)]
        passphrase: String,
    },
}

/// `pem` subcommands.
#[derive(Subcommand, Debug)]
pub enum PemCommand {
    /// Write a private key as PEM, encrypted when a passphrase is given.
    Export {
        /// Private key, hex (raw Ed25519 or DER).
        #[arg(long, env = "LEDGER_PRIVATE_KEY", hide_env_values = true)]
        key: String,

        /// PEM file to write. Prints to stdout when omitted.
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        /// Passphrase for an encrypted PEM.
        #[arg(long, env = "LEDGER_PEM_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
    },
    /// Read a PEM private key and print it.
    Import {
        /// PEM file to read.
        #[arg(long, short = 'f')]
        file: PathBuf,

        /// Passphrase for an encrypted PEM.
        #[arg(long, env = "LEDGER_PEM_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
    },
}

/// Arguments for `checksum`.
#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// Entity ID, `shard.realm.num` with an optional `-checksum` suffix.
    /// A suffix is verified; without one, the checksum is printed.
    pub id: AccountId,

    /// Network the checksum belongs to.
    #[arg(long, short = 'n', default_value = "mainnet")]
    pub network: NetworkName,
}

// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Ledger Keytool
//!
//! Entry point for the `ledger-keytool` binary. Parses CLI arguments,
//! initializes logging, and runs one offline key-management command:
//!
//! - `generate`  — fresh Ed25519 or ECDSA key
//! - `mnemonic`  — new phrases, and key recovery from old ones
//! - `keystore`  — JSON keystore encrypt / decrypt
//! - `pem`       — PKCS#8 PEM export / import
//! - `checksum`  — entity ID checksums per network
//!
//! Results go to stdout, as text or (with `--json`) as a single JSON
//! object. Logs go to stderr.

mod cli;
mod logging;

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use ledger_sdk::mnemonic::LegacyWordList;
use ledger_sdk::{KeyScheme, KeystoreParams, Mnemonic, PrivateKey};

use cli::{
    ChecksumArgs, Commands, KeystoreCommand, KeytoolCli, MnemonicCommand, PemCommand, ToKeyArgs,
    WordCount,
};

fn main() -> Result<()> {
    let cli = KeytoolCli::parse();
    logging::init_logging("ledger_keytool=info,ledger_sdk=warn", cli.log_format);

    let output = match cli.command {
        Commands::Generate(args) => {
            let key = match KeyScheme::from(args.scheme) {
                KeyScheme::Ed25519 => PrivateKey::generate_ed25519(),
                KeyScheme::EcdsaSecp256k1 => PrivateKey::generate_ecdsa(),
            };
            tracing::info!(scheme = %key.scheme(), "generated private key");
            Output::Key(KeyReport::new(&key))
        }
        Commands::Mnemonic(MnemonicCommand::Generate { words }) => {
            let mnemonic = match words {
                WordCount::Twelve => Mnemonic::generate_12(),
                WordCount::TwentyFour => Mnemonic::generate_24(),
            };
            Output::Mnemonic(MnemonicReport {
                mnemonic: mnemonic.to_string(),
            })
        }
        Commands::Mnemonic(MnemonicCommand::ToKey(args)) => {
            Output::Key(KeyReport::new(&mnemonic_to_key(&args)?))
        }
        Commands::Keystore(command) => keystore(command)?,
        Commands::Pem(command) => pem(command)?,
        Commands::Checksum(args) => Output::Checksum(checksum(args)?),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{output}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Recovers a key from a phrase, then optionally derives a child.
fn mnemonic_to_key(args: &ToKeyArgs) -> Result<PrivateKey> {
    let mnemonic: Mnemonic = args.phrase.parse().context("invalid mnemonic")?;

    if !args.legacy {
        let root = mnemonic
            .to_private_key(&args.passphrase)
            .context("failed to derive key from mnemonic")?;
        return match args.index {
            Some(index) => {
                let index = u32::try_from(index)
                    .context("SLIP-10 child index must be between 0 and 2^32 - 1")?;
                root.derive(index).context("failed to derive child key")
            }
            None => Ok(root),
        };
    }

    let root = match &args.word_list {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read word list {}", path.display()))?;
            let table = LegacyWordList::from_text(&text).context("invalid legacy word list")?;
            mnemonic.to_legacy_private_key_with(&table)
        }
        None => mnemonic.to_legacy_private_key(),
    }
    .context("failed to recover legacy key")?;

    match args.index {
        Some(index) => root
            .legacy_derive(index)
            .context("failed to derive legacy child key"),
        None => Ok(root),
    }
}

fn keystore(command: KeystoreCommand) -> Result<Output> {
    match command {
        KeystoreCommand::Encrypt {
            key,
            out,
            passphrase,
            rounds,
        } => {
            let key = parse_key(&key)?;
            let mut params = KeystoreParams::default();
            if let Some(rounds) = rounds {
                params.rounds = rounds;
            }
            let bytes = key
                .to_keystore_with(&passphrase, &params)
                .context("failed to encrypt keystore")?;
            write_secret(&out, &bytes)?;
            tracing::info!(path = %out.display(), rounds = params.rounds, "keystore written");
            Ok(Output::Written(WrittenReport {
                path: out.display().to_string(),
                public_key: key.public_key().to_string(),
            }))
        }
        KeystoreCommand::Decrypt { file, passphrase } => {
            let bytes = fs::read(&file)
                .with_context(|| format!("failed to read keystore {}", file.display()))?;
            let key = PrivateKey::from_keystore(&bytes, &passphrase)
                .with_context(|| format!("failed to decrypt keystore {}", file.display()))?;
            Ok(Output::Key(KeyReport::new(&key)))
        }
    }
}

fn pem(command: PemCommand) -> Result<Output> {
    match command {
        PemCommand::Export {
            key,
            out,
            passphrase,
        } => {
            let key = parse_key(&key)?;
            let text = match passphrase.as_deref() {
                Some(passphrase) => key
                    .to_encrypted_pem(passphrase)
                    .context("failed to encrypt PEM")?,
                None => key.to_pem(),
            };
            match out {
                Some(out) => {
                    write_secret(&out, text.as_bytes())?;
                    tracing::info!(path = %out.display(), "PEM written");
                    Ok(Output::Written(WrittenReport {
                        path: out.display().to_string(),
                        public_key: key.public_key().to_string(),
                    }))
                }
                None => Ok(Output::Pem(PemReport { pem: text })),
            }
        }
        PemCommand::Import { file, passphrase } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed to read PEM {}", file.display()))?;
            let key = PrivateKey::from_pem(&text, passphrase.as_deref())
                .with_context(|| format!("failed to load PEM {}", file.display()))?;
            Ok(Output::Key(KeyReport::new(&key)))
        }
    }
}

fn checksum(args: ChecksumArgs) -> Result<ChecksumReport> {
    let expected = args.id.checksum_for(args.network);
    if let Some(given) = &args.id.checksum {
        if *given != expected {
            bail!(
                "checksum {given} does not match {} on {} (expected {expected})",
                args.id,
                args.network
            );
        }
    }
    Ok(ChecksumReport {
        id: args.id.to_string_with_checksum(args.network),
        network: args.network.to_string(),
        checksum: expected,
    })
}

fn parse_key(text: &str) -> Result<PrivateKey> {
    text.trim().parse().context("invalid private key")
}

/// Writes key material, readable by the owner only on Unix.
fn write_secret(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to restrict permissions on {}", path.display()))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(untagged)]
enum Output {
    Key(KeyReport),
    Mnemonic(MnemonicReport),
    Written(WrittenReport),
    Pem(PemReport),
    Checksum(ChecksumReport),
}

#[derive(Serialize)]
struct KeyReport {
    scheme: KeyScheme,
    private_key: String,
    public_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    evm_address: Option<String>,
}

impl KeyReport {
    fn new(key: &PrivateKey) -> Self {
        let public_key = key.public_key();
        Self {
            scheme: key.scheme(),
            private_key: key.to_string_der(),
            public_key: public_key.to_string(),
            evm_address: public_key.to_evm_address(),
        }
    }
}

#[derive(Serialize)]
struct MnemonicReport {
    mnemonic: String,
}

#[derive(Serialize)]
struct WrittenReport {
    path: String,
    public_key: String,
}

#[derive(Serialize)]
struct PemReport {
    pem: String,
}

#[derive(Serialize)]
struct ChecksumReport {
    id: String,
    network: String,
    checksum: String,
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(report) => {
                writeln!(f, "Scheme      : {}", report.scheme)?;
                writeln!(f, "Private key : {}", report.private_key)?;
                write!(f, "Public key  : {}", report.public_key)?;
                if let Some(address) = &report.evm_address {
                    write!(f, "\nEVM address : {address}")?;
                }
                Ok(())
            }
            Self::Mnemonic(report) => f.write_str(&report.mnemonic),
            Self::Written(report) => {
                writeln!(f, "Wrote       : {}", report.path)?;
                write!(f, "Public key  : {}", report.public_key)
            }
            Self::Pem(report) => f.write_str(report.pem.trim_end()),
            Self::Checksum(report) => write!(f, "{}", report.id),
        }
    }
}

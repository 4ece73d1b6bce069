//! # SDK Configuration & Constants
//!
//! Every tunable and every magic number the SDK depends on lives here. If a
//! constant shows up inline somewhere else, it should probably move here.
//!
//! Some of these values are knobs (retry budgets, timeouts). Others are
//! compatibility contracts with the network and with keys generated by older
//! wallets (DER prefixes, derivation paths). The knobs can be overridden on a
//! [`Client`](crate::network::Client); the contracts cannot.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Retry & Timing
// ---------------------------------------------------------------------------

/// How many times a request is dispatched before giving up with
/// `MaxAttemptsExceeded`.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// First backoff step after a transient failure.
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_millis(250);

/// Backoff never grows past this, no matter how many attempts have failed.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Total wall-clock budget for one logical request, retries included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Budget for a single send/receive round trip against one node.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed to open a TCP connection to a node.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Readmission delay after the first failure of a node. Doubles on each
/// consecutive failure up to [`NODE_MAX_READMIT_BACKOFF`].
pub const NODE_MIN_READMIT_BACKOFF: Duration = Duration::from_secs(8);

/// Ceiling for the per-node readmission delay.
pub const NODE_MAX_READMIT_BACKOFF: Duration = Duration::from_secs(60 * 60);

// ---------------------------------------------------------------------------
// Transaction Defaults
// ---------------------------------------------------------------------------

/// How long a transaction stays valid after its valid-start timestamp.
pub const DEFAULT_TRANSACTION_VALID_DURATION: Duration = Duration::from_secs(120);

/// Generated transaction IDs start this far in the past, plus jitter, so a
/// node with a slightly slow clock doesn't reject them as "from the future".
pub const TRANSACTION_ID_BACKDATE_SECS: i64 = 8;

/// Upper bound (exclusive) on the extra random backdating, in seconds.
pub const TRANSACTION_ID_JITTER_SECS: i64 = 5;

/// How many nodes a frozen transaction is prepared for when the caller
/// doesn't pin an explicit node list.
pub const DEFAULT_MAX_NODES_PER_TRANSACTION: usize = 3;

/// Memo length limit enforced by the network, in bytes.
pub const MAX_MEMO_BYTES: usize = 100;

/// Tinybars per hbar.
pub const TINYBARS_PER_HBAR: i64 = 100_000_000;

/// Default max fee for a crypto transfer, in tinybars (1 hbar).
pub const DEFAULT_TRANSFER_MAX_FEE: i64 = TINYBARS_PER_HBAR;

/// Default cap for paid query payments, in tinybars (1 hbar).
pub const DEFAULT_MAX_QUERY_PAYMENT: i64 = TINYBARS_PER_HBAR;

// ---------------------------------------------------------------------------
// Wire Framing
// ---------------------------------------------------------------------------

/// Frames larger than this are rejected before allocation. A signed
/// transaction is a few kilobytes; anything near this limit is garbage.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Key Encodings
// ---------------------------------------------------------------------------

/// PKCS#8 header for an Ed25519 private key. Followed by the 32-byte seed.
pub const ED25519_PRIVATE_KEY_DER_PREFIX: &str = "302e020100300506032b657004220420";

/// SPKI header for an Ed25519 public key. Followed by the 32-byte point.
pub const ED25519_PUBLIC_KEY_DER_PREFIX: &str = "302a300506032b6570032100";

/// Compact PKCS#8 header for a secp256k1 private key. Followed by the
/// 32-byte scalar.
pub const ECDSA_PRIVATE_KEY_DER_PREFIX: &str = "3030020100300706052b8104000a04220420";

/// Compact SPKI header for a compressed secp256k1 public key. Followed by
/// the 33-byte SEC1 point.
pub const ECDSA_PUBLIC_KEY_DER_PREFIX: &str = "302f300706052b8104000a0324000421";

// ---------------------------------------------------------------------------
// Mnemonics & Derivation
// ---------------------------------------------------------------------------

/// SLIP-10 master key HMAC label for Ed25519.
pub const SLIP10_ED25519_SEED: &[u8] = b"ed25519 seed";

/// Hardened index bit.
pub const HARDENED: u32 = 0x8000_0000;

/// Standard account path `m/44'/3030'/0'/0'`. Every component is hardened.
pub const STANDARD_DERIVATION_PATH: [u32; 4] = [44, 3030, 0, 0];

/// PBKDF2 rounds used by both the standard seed stretch and the legacy
/// child derivation.
pub const MNEMONIC_PBKDF2_ROUNDS: u32 = 2048;

/// Reserved legacy index that encodes as five bytes of `0xff`.
pub const LEGACY_RESERVED_INDEX: i64 = 0xff_ffff_ffff;

// ---------------------------------------------------------------------------
// Keystore
// ---------------------------------------------------------------------------

/// Keystore format version written by this SDK.
pub const KEYSTORE_VERSION: u32 = 1;

/// PBKDF2-HMAC-SHA256 rounds for new keystores. Deliberately slow.
pub const KEYSTORE_KDF_ROUNDS: u32 = 262_144;

/// Derived key length. The first half keys AES-128-CTR, the second half
/// keys the HMAC-SHA384 integrity tag.
pub const KEYSTORE_DK_LEN: usize = 32;

/// Salt length for new keystores.
pub const KEYSTORE_SALT_LEN: usize = 32;

/// PBKDF2 rounds when wrapping a key into an encrypted PEM document.
pub const PEM_PBKDF2_ROUNDS: u32 = 2048;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

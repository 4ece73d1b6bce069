//! # Transaction Module
//!
//! Building, freezing, signing and submitting transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs     — Hbar amounts and TransactionId
//! builder.rs   — Transaction<D>: the Mutable → Frozen → Executed state machine
//! signing.rs   — Per-node signature maps, deduplicated by signer
//! transfer.rs  — TransferTransaction: hbar and token transfers
//! response.rs  — TransactionResponse and receipt lookup
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build** — Create a transaction and call setters. Each returns
//!    `Result<&mut Self>`.
//! 2. **Freeze** — [`Transaction::freeze_with`] fills in the payer, node
//!    list and fee from the client and serializes one body per node.
//! 3. **Sign** — [`Transaction::sign`] with each required key. Freezes
//!    implicitly if you skipped step 2.
//! 4. **Execute** — [`Transaction::execute`] adds the operator's signature
//!    when the operator pays, then hands off to the execution engine.
//! 5. **Receipt** — [`TransactionResponse::get_receipt`] waits for
//!    consensus.
//!
//! ## Design Decisions
//!
//! - The per-node bodies and their signature maps live together in one
//!   ordered list. They can't drift out of step.
//! - Setters fail instead of panicking once frozen. Changing a signed body
//!   would silently invalidate every signature on it.
//! - Amounts are integer tinybars. No floating point near money.

pub mod builder;
pub mod response;
pub mod signing;
pub mod transfer;
pub mod types;

pub use builder::{NodeTransaction, Transaction, TransactionData};
pub use response::TransactionResponse;
pub use signing::{Signature, SignatureMap, SignaturePair};
pub use transfer::{
    HbarTransfer, TokenTransfer, TokenTransferList, TransferTransaction, TransferTransactionData,
};
pub use types::{Hbar, TransactionId};

//! # Consensus Nodes
//!
//! A [`Node`] is one endpoint the client can submit to: its account ID (the
//! one embedded in node-specific transaction bodies), its address, and how
//! much we currently trust it.
//!
//! ## Health
//!
//! A node that fails at the transport level, or answers `BUSY`, is benched.
//! The bench time starts at 8 seconds and doubles on every consecutive
//! failure, capped at an hour. One success resets it.
//!
//! ```text
//! healthy ──fail──► unhealthy(8s) ──fail──► unhealthy(16s) ── ... ──► unhealthy(1h)
//!    ▲                    │
//!    └──────success───────┘  (or readmit time passes)
//! ```
//!
//! Benched nodes are not forgotten. If every candidate is benched the engine
//! still tries them; a slow answer beats no answer.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::config::{NODE_MAX_READMIT_BACKOFF, NODE_MIN_READMIT_BACKOFF};
use crate::entity::AccountId;

#[derive(Debug, Default)]
struct Health {
    consecutive_failures: u32,
    readmit_at: Option<Instant>,
}

/// A consensus node as seen by the client.
#[derive(Debug)]
pub struct Node {
    account_id: AccountId,
    address: String,
    health: Mutex<Health>,
}

impl Node {
    pub fn new(account_id: AccountId, address: impl Into<String>) -> Self {
        Self {
            account_id,
            address: address.into(),
            health: Mutex::new(Health::default()),
        }
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether the node is currently eligible for selection.
    pub fn is_healthy(&self) -> bool {
        self.health
            .lock()
            .readmit_at
            .map_or(true, |at| Instant::now() >= at)
    }

    /// Benches the node and returns how long for.
    pub fn mark_unhealthy(&self) -> Duration {
        let mut health = self.health.lock();
        let backoff = readmit_backoff(health.consecutive_failures);
        health.consecutive_failures = health.consecutive_failures.saturating_add(1);
        health.readmit_at = Some(Instant::now() + backoff);
        debug!(node = %self.account_id, ?backoff, "node marked unhealthy");
        backoff
    }

    pub fn mark_healthy(&self) {
        let mut health = self.health.lock();
        health.consecutive_failures = 0;
        health.readmit_at = None;
    }
}

/// `min * 2^failures`, capped.
fn readmit_backoff(failures: u32) -> Duration {
    NODE_MIN_READMIT_BACKOFF
        .checked_mul(1u32.checked_shl(failures).unwrap_or(u32::MAX))
        .map_or(NODE_MAX_READMIT_BACKOFF, |d| d.min(NODE_MAX_READMIT_BACKOFF))
}

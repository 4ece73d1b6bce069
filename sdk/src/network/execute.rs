//! # Execution Engine
//!
//! The one retry loop behind every transaction and query. A request type
//! plugs in by implementing [`Execute`]: how to build the per-node request,
//! how to classify a response, and how to turn a good response into a
//! result. Everything else lives here.
//!
//! ## Algorithm
//!
//! ```text
//!  validate checksums ──mismatch──► Err (no I/O)
//!          │
//!  resolve candidate nodes
//!          │
//!  ┌─► cancelled / deadline? ──yes──► Err(Cancelled | DeadlineExceeded)
//!  │       │
//!  │   pick node (round robin, healthy first)
//!  │       │
//!  │   send ──transport error──┐
//!  │       │                   │
//!  │   classify                │
//!  │     ├─ Success ──► map_response ──► Ok
//!  │     ├─ Permanent ──► Err(Protocol)
//!  │     └─ Retry ─────────────┤
//!  │                           ▼
//!  │              attempts left? budget left? ──no──► Err(MaxAttemptsExceeded | Timeout)
//!  │                           │
//!  └───────── backoff sleep (interruptible) ◄──┘
//! ```
//!
//! ## Guarantees
//!
//! - At most one attempt is in flight per request. Retries are sequential.
//! - Cancellation and deadlines are honored between attempts and during
//!   backoff, never in the middle of a send.
//! - Nothing is spawned. The calling thread does all the work.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::cancel::CancellationToken;
use super::client::Client;
use super::node::Node;
use super::wire::{self, Status, WireRequest, WireResponse};
use crate::entity::{AccountId, ValidateChecksums};
use crate::error::{Error, Result};
use crate::transaction::TransactionId;

/// Caller controls for one execution.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Hard wall-clock limit. Checked between attempts and bounds backoff
    /// sleeps.
    pub deadline: Option<Instant>,
    /// External abort signal.
    pub cancel: Option<CancellationToken>,
}

impl ExecuteOptions {
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// How a node's answer should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Worth asking again, possibly another node.
    Retry(Status),
    /// Final.
    Permanent(Status),
}

/// A request the engine can drive.
pub(crate) trait Execute: ValidateChecksums {
    /// Per-attempt data carried from `make_request` to `map_response`.
    type Context;
    type Response;

    /// Pinned nodes. `None` lets the client pick.
    fn pinned_node_account_ids(&self) -> Option<&[AccountId]>;

    /// The transaction this request is about, for error context.
    fn request_transaction_id(&self) -> Option<&TransactionId>;

    fn make_request(&self, node_account_id: &AccountId) -> Result<(WireRequest, Self::Context)>;

    fn classify(&self, response: &WireResponse) -> Outcome;

    fn map_response(
        &self,
        response: WireResponse,
        node_account_id: &AccountId,
        context: Self::Context,
    ) -> Result<Self::Response>;
}

/// Runs `request` against `client` until it succeeds, fails permanently, or
/// runs out of attempts, time, or patience.
pub(crate) fn execute<E: Execute>(
    client: &Client,
    request: &E,
    options: &ExecuteOptions,
) -> Result<E::Response> {
    let settings = client.settings();

    if settings.auto_validate_checksums {
        if let Some(network) = client.network_name() {
            request.validate_checksums(network)?;
        }
    }

    let nodes = match request.pinned_node_account_ids() {
        Some(ids) => client.nodes_for(ids)?,
        None => client.sample_nodes(settings.max_nodes_per_transaction),
    };
    if nodes.is_empty() {
        return Err(Error::NoNodes);
    }

    let cancel = options.cancel.clone().unwrap_or_default();
    let start = Instant::now();
    let mut attempt = 0usize;

    loop {
        attempt += 1;
        check_abort(&cancel, options.deadline)?;

        let node = pick_node(&nodes, attempt - 1);
        let node_id = node.account_id();
        let (message, context) = request.make_request(node_id)?;
        let bytes = wire::encode(&message)?;

        let remaining = settings.request_timeout.saturating_sub(start.elapsed());
        let timeout = settings
            .attempt_timeout
            .min(remaining)
            .max(Duration::from_millis(1));

        debug!(node = %node_id, attempt, "dispatching request");

        let err = match send(client, node, &bytes, timeout) {
            Ok(response) => match request.classify(&response) {
                Outcome::Success => {
                    node.mark_healthy();
                    debug!(node = %node_id, attempt, "request succeeded");
                    return request.map_response(response, node_id, context);
                }
                Outcome::Permanent(status) => {
                    return Err(Error::Protocol {
                        status,
                        node: node_id.clone(),
                        transaction_id: request.request_transaction_id().cloned(),
                    });
                }
                Outcome::Retry(status) => {
                    if matches!(status, Status::Busy | Status::PlatformNotActive) {
                        node.mark_unhealthy();
                    }
                    Error::Protocol {
                        status,
                        node: node_id.clone(),
                        transaction_id: request.request_transaction_id().cloned(),
                    }
                }
            },
            Err(err) => {
                node.mark_unhealthy();
                client.pool().evict(node.address());
                err
            }
        };

        if attempt >= settings.max_attempts {
            warn!(attempts = attempt, error = %err, "retry budget exhausted");
            return Err(Error::MaxAttemptsExceeded {
                attempts: attempt,
                last: Box::new(err),
            });
        }

        let delay = backoff_delay(attempt, settings.min_backoff, settings.max_backoff);
        let elapsed = start.elapsed();
        if elapsed + delay >= settings.request_timeout {
            warn!(attempts = attempt, ?elapsed, error = %err, "request timeout exhausted");
            return Err(Error::Timeout {
                elapsed,
                last: Box::new(err),
            });
        }

        warn!(node = %node_id, attempt, ?delay, error = %err, "transient failure, backing off");
        sleep(&cancel, options.deadline, delay)?;
    }
}

/// One round trip. Transport and decode failures both come back as
/// retryable errors.
fn send(client: &Client, node: &Node, request: &[u8], timeout: Duration) -> Result<WireResponse> {
    let channel = client.pool().get(node.address())?;
    let response = channel.send(request, timeout)?;
    wire::decode(&response)
}

/// Round robin from `turn`, skipping benched nodes while a healthy one
/// remains.
fn pick_node(nodes: &[Arc<Node>], turn: usize) -> &Node {
    let start = turn % nodes.len();
    (0..nodes.len())
        .map(|offset| &nodes[(start + offset) % nodes.len()])
        .find(|node| node.is_healthy())
        .unwrap_or(&nodes[start])
}

/// `min * 2^(attempt - 1)`, capped at `max`.
fn backoff_delay(attempt: usize, min: Duration, max: Duration) -> Duration {
    let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
    min.checked_mul(factor).map_or(max, |delay| delay.min(max))
}

fn check_abort(cancel: &CancellationToken, deadline: Option<Instant>) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
        return Err(Error::DeadlineExceeded);
    }
    Ok(())
}

/// Backoff sleep, cut short by cancellation or the deadline.
fn sleep(cancel: &CancellationToken, deadline: Option<Instant>, delay: Duration) -> Result<()> {
    let (delay, hits_deadline) = match deadline {
        Some(deadline) => {
            let remaining = deadline.saturating_duration_since(Instant::now());
            (delay.min(remaining), remaining <= delay)
        }
        None => (delay, false),
    };

    if cancel.wait_timeout(delay) {
        return Err(Error::Cancelled);
    }
    if hits_deadline {
        return Err(Error::DeadlineExceeded);
    }
    Ok(())
}

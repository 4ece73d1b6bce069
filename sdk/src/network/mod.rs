//! # Network Module
//!
//! Everything between a frozen request and a node's answer: the client
//! context, node health, pooled channels, the wire codec, and the retry
//! engine that ties them together.
//!
//! ## Architecture
//!
//! ```text
//! client.rs   — Client context: nodes, operator, network name, settings
//! node.rs     — Per-node health with exponential readmission backoff
//! channel.rs  — Channel/Connector traits, TCP transport, per-address pool
//! wire.rs     — bincode-encoded request/response messages and status codes
//! execute.rs  — The retry/backoff/failover loop shared by every request
//! cancel.rs   — Cancellation token observed between attempts
//! ```
//!
//! ## Design Decisions
//!
//! - Synchronous and blocking. A request blocks its caller on I/O and on
//!   backoff sleeps, and nothing runs in the background. Callers who want
//!   concurrency bring their own threads.
//! - Node state sits behind `parking_lot` locks and the channel pool is a
//!   `DashMap`, so one `Client` can serve many threads without a global
//!   lock on the hot path.
//! - Transport is pluggable through [`Connector`]. The built-in TCP
//!   transport is deliberately plain; TLS belongs in a connector.

pub mod cancel;
pub mod channel;
pub mod client;
pub mod execute;
pub mod node;
pub mod wire;

pub use cancel::CancellationToken;
pub use channel::{Channel, ChannelPool, Connector, TcpConnector, TransportError};
pub use client::{Client, ClientConfig, Operator, OperatorConfig};
pub use execute::{ExecuteOptions, Outcome};
pub use node::Node;
pub use wire::Status;

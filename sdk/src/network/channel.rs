//! # Node Channels
//!
//! A [`Channel`] is one long-lived connection to one node: bytes in, bytes
//! out, with a per-call timeout. A [`Connector`] knows how to open one.
//! [`ChannelPool`] opens them lazily, one per address, and hands out shared
//! references to every request that needs that node.
//!
//! The default transport is [`TcpConnector`]: plain TCP with a 4-byte
//! big-endian length prefix on every frame. TLS or anything fancier plugs
//! in as another `Connector`.
//!
//! ## Thread Safety
//!
//! Channels are shared across concurrent requests. A channel guarantees its
//! own exclusion (the TCP channel holds its stream under a mutex), so one
//! request/response exchange is never interleaved with another.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::config::MAX_FRAME_BYTES;

/// Errors from moving bytes to and from a node.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not open a connection.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// Node address.
        address: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The node didn't answer within the attempt timeout.
    #[error("timed out waiting for node response")]
    Timeout,

    /// The peer closed the connection mid-exchange.
    #[error("connection closed by node")]
    Closed,

    /// A frame length above [`MAX_FRAME_BYTES`].
    #[error("frame of {0} bytes exceeds the limit")]
    FrameTooLarge(usize),

    /// Any other socket error.
    #[error("transport I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::Closed,
            _ => Self::Io(err),
        }
    }
}

/// One connection to one node.
pub trait Channel: Send + Sync {
    /// Sends a request frame and waits up to `timeout` for the response
    /// frame.
    fn send(&self, request: &[u8], timeout: Duration) -> Result<Vec<u8>, TransportError>;
}

/// Opens channels.
pub trait Connector: Send + Sync {
    /// Opens a channel to `address`, giving up after `timeout`.
    fn connect(&self, address: &str, timeout: Duration) -> Result<Arc<dyn Channel>, TransportError>;
}

// ---------------------------------------------------------------------------
// TCP
// ---------------------------------------------------------------------------

/// Plain TCP with length-prefixed frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    fn connect(&self, address: &str, timeout: Duration) -> Result<Arc<dyn Channel>, TransportError> {
        let connect_err = |source| TransportError::Connect {
            address: address.to_string(),
            source,
        };

        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "address resolved to nothing");
        for addr in address.to_socket_addrs().map_err(connect_err)? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true).map_err(connect_err)?;
                    debug!(%address, "opened node channel");
                    return Ok(Arc::new(TcpChannel {
                        stream: Mutex::new(stream),
                    }));
                }
                Err(err) => last_err = err,
            }
        }
        Err(connect_err(last_err))
    }
}

/// A TCP connection. Exchanges are serialized by the mutex.
#[derive(Debug)]
pub struct TcpChannel {
    stream: Mutex<TcpStream>,
}

impl Channel for TcpChannel {
    fn send(&self, request: &[u8], timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let mut stream = self.stream.lock();
        stream.set_write_timeout(Some(timeout))?;
        stream.set_read_timeout(Some(timeout))?;

        write_frame(&mut *stream, request)?;
        read_frame(&mut *stream)
    }
}

/// Writes `payload` with a 4-byte big-endian length prefix.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), TransportError> {
    if payload.len() > MAX_FRAME_BYTES {
        return Err(TransportError::FrameTooLarge(payload.len()));
    }
    writer.write_all(&(payload.len() as u32).to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Reads one length-prefixed frame. Oversized lengths are rejected before
/// anything is allocated.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, TransportError> {
    let mut len = [0u8; 4];
    reader.read_exact(&mut len)?;
    let len = u32::from_be_bytes(len) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(TransportError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// Lazily established channels, one per node address.
pub struct ChannelPool {
    connector: Arc<dyn Connector>,
    channels: DashMap<String, Arc<dyn Channel>>,
    connect_timeout: Duration,
}

impl ChannelPool {
    pub fn new(connector: Arc<dyn Connector>, connect_timeout: Duration) -> Self {
        Self {
            connector,
            channels: DashMap::new(),
            connect_timeout,
        }
    }

    /// The channel for `address`, connecting on first use.
    pub fn get(&self, address: &str) -> Result<Arc<dyn Channel>, TransportError> {
        if let Some(channel) = self.channels.get(address) {
            return Ok(Arc::clone(channel.value()));
        }

        // Connect without holding a shard lock. Two racing callers may both
        // connect; the first insert wins and the loser's channel is dropped.
        let channel = self.connector.connect(address, self.connect_timeout)?;
        Ok(Arc::clone(
            self.channels
                .entry(address.to_string())
                .or_insert(channel)
                .value(),
        ))
    }

    /// Drops the pooled channel for `address` so the next request reconnects.
    pub fn evict(&self, address: &str) {
        if self.channels.remove(address).is_some() {
            debug!(%address, "evicted node channel");
        }
    }

    /// Number of open channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl std::fmt::Debug for ChannelPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelPool")
            .field("channels", &self.channels.len())
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

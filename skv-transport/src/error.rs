//! Transport-level failures.
//!
//! Every variant means the connection that produced it can no longer be
//! trusted; callers drop it and reconnect on their next command.

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors raised while connecting, writing a command, or reading a reply.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network or IO failure while connecting, reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// RESP2 framing violated by the peer.
    #[error("protocol error: {0}")]
    Protocol(&'static str),
    /// Peer closed the stream before a full reply arrived.
    #[error("connection closed by peer")]
    Closed,
    /// Host name resolved to no usable socket address.
    #[error("no address resolved for {0}")]
    Unresolved(String),
}

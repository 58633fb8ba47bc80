use skv_transport::{ReplyKind, TransportError};
use thiserror::Error;

/// Result type for the sync client.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the sync client.
///
/// Negative-but-valid outcomes (a conditional SET that did not apply, an
/// EXPIRE on a missing key) are not errors; they come back as `Ok` values.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Address could not be parsed into host and port.
    #[error("invalid address [{0}]")]
    InvalidAddress(String),
    /// No connection could be established.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: TransportError,
    },
    /// The connection broke while running a command. It has been dropped.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Server returned an error reply.
    #[error("server error: {0}")]
    Server(String),
    /// Reply type did not match the expected command response.
    #[error("unexpected reply type {actual}, expected {expected}")]
    UnexpectedReply {
        expected: &'static str,
        actual: ReplyKind,
    },
    /// Array reply carried a different number of elements than requested.
    #[error("invalid number of elements returned: expected {expected}, returned {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    /// Expiration resolved to a non-positive number of seconds.
    #[error("invalid expire time: {0}s remaining")]
    InvalidExpiration(i64),
    /// SET op type could not be recognized.
    #[error("unsupported set op type {0}")]
    UnsupportedSetOp(String),
}

impl ClientError {
    /// True when the failure came from the connection rather than the server
    /// or the caller's input.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, ClientError::Connect { .. } | ClientError::Transport(_))
    }
}

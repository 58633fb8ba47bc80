//! # SyncKV Client
//!
//! Purpose: Provide a lightweight, synchronous Redis-compatible client that
//! maps typed calls onto RESP2 commands and typed results back out of replies.
//!
//! ## Design Principles
//! 1. **Single Connection**: One lazily-dialed connection per client, dropped
//!    on any transport failure and re-dialed by the next call.
//! 2. **Binary-Safe**: Keys, values, members and fields are raw bytes.
//! 3. **One Classifier**: Every command states its expected reply shape and an
//!    extractor; mismatches become typed errors.
//! 4. **Explicit Results**: Each call returns its own `ClientResult`; there is
//!    no stored "last error".
//!
//! ```no_run
//! use skv_client::{SetOpType, SyncClient};
//!
//! # fn main() -> skv_client::ClientResult<()> {
//! let mut client = SyncClient::new("127.0.0.1:6379")?;
//! client.set(b"greeting", b"hello", None, SetOpType::Anyhow)?;
//! assert_eq!(client.get(b"greeting")?, Some(b"hello".to_vec()));
//! # Ok(())
//! # }
//! ```

mod address;
mod classify;
mod client;
mod config;
mod error;
mod expiration;
mod set_op;

pub use address::{Address, DEFAULT_PORT};
pub use client::SyncClient;
pub use config::{ClientConfig, DEFAULT_CONNECT_TIMEOUT};
pub use error::{ClientError, ClientResult};
pub use expiration::ExpirationTime;
pub use set_op::{SetOpType, SetOutcome};
pub use skv_transport::{
    Command, Connector, Execute, Reply, ReplyKind, TcpConnector, TransportError, TransportResult,
};

//! # SyncKV Transport
//!
//! Purpose: Provide the blocking RESP2 transport the SyncKV client runs on:
//! typed replies, a binary-safe command builder, and a TCP connection.
//!
//! ## Design Principles
//! 1. **Single Connection**: One stream, one command in flight.
//! 2. **Binary-Safe**: Every argument travels as a length-prefixed bulk string.
//! 3. **Protocol Clarity**: Encode/parse RESP2 explicitly for correctness.
//! 4. **Pluggable**: The client depends on the `Connector` trait, not on TCP.

mod command;
mod connection;
mod error;
mod reply;
pub mod resp;

pub use command::Command;
pub use connection::{Connection, Connector, Execute, TcpConnector};
pub use error::{TransportError, TransportResult};
pub use reply::{Reply, ReplyKind};

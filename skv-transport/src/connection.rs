//! # Blocking Connection
//!
//! Purpose: Own one TCP stream to the server and run one command at a time
//! over it.
//!
//! ## Design Principles
//! 1. **Strategy Seam**: `Connector`/`Execute` let the client run over any
//!    transport, including scripted in-memory ones in tests.
//! 2. **Buffer Reuse**: Each connection keeps its own read and write buffers.
//! 3. **Bounded Connect**: Connecting always honors the caller's timeout.
//! 4. **Fail Fast**: Any IO or framing error is returned; the caller decides
//!    whether the connection survives (the client never reuses it).

use std::io::{BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::command::Command;
use crate::error::{TransportError, TransportResult};
use crate::reply::Reply;
use crate::resp::read_reply;

/// Runs commands over an established connection.
pub trait Execute {
    /// Sends one command and blocks until its reply has been read.
    fn execute(&mut self, command: &Command<'_>) -> TransportResult<Reply>;
}

/// Establishes connections.
pub trait Connector {
    type Connection: Execute;

    fn connect(&self, host: &str, port: u16, timeout: Duration) -> TransportResult<Self::Connection>;
}

/// Connector opening plain TCP streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector {
    /// Optional TCP read timeout applied to every new stream.
    pub read_timeout: Option<Duration>,
    /// Optional TCP write timeout applied to every new stream.
    pub write_timeout: Option<Duration>,
}

impl Connector for TcpConnector {
    type Connection = Connection;

    fn connect(&self, host: &str, port: u16, timeout: Duration) -> TransportResult<Connection> {
        let stream = connect_stream(host, port, timeout)?;
        if let Some(timeout) = self.read_timeout {
            stream.set_read_timeout(Some(timeout))?;
        }
        if let Some(timeout) = self.write_timeout {
            stream.set_write_timeout(Some(timeout))?;
        }
        // Disable Nagle to keep request latency low for small payloads.
        stream.set_nodelay(true)?;

        Ok(Connection {
            reader: BufReader::new(stream),
            line_buf: Vec::with_capacity(128),
            write_buf: BytesMut::with_capacity(256),
        })
    }
}

/// Single TCP connection with reusable buffers.
pub struct Connection {
    // Buffered reader reduces syscalls while still allowing direct writes.
    reader: BufReader<TcpStream>,
    line_buf: Vec<u8>,
    write_buf: BytesMut,
}

impl Execute for Connection {
    fn execute(&mut self, command: &Command<'_>) -> TransportResult<Reply> {
        self.write_buf.clear();
        command.encode(&mut self.write_buf);
        trace!(command = command.name(), bytes = self.write_buf.len(), "sending command");

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buf)?;
        stream.flush()?;

        read_reply(&mut self.reader, &mut self.line_buf)
    }
}

fn connect_stream(host: &str, port: u16, timeout: Duration) -> TransportResult<TcpStream> {
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                debug!(%addr, "tcp connection established");
                return Ok(stream);
            }
            Err(err) => {
                debug!(%addr, error = %err, "tcp connect attempt failed");
                last_err = Some(err);
            }
        }
    }
    match last_err {
        Some(err) => Err(TransportError::Io(err)),
        None => Err(TransportError::Unresolved(format!("{host}:{port}"))),
    }
}

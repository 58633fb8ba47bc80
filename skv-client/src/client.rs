//! # Synchronous Client API
//!
//! Purpose: Expose a compact, blocking API for issuing Redis-compatible
//! commands over a single lazily-established connection.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `SyncClient` hides connection and protocol details.
//! 2. **Borrow-Friendly API**: Accept `&[u8]` to avoid unnecessary copies.
//! 3. **Lazy Reconnect**: A broken connection is dropped; the next call dials again.
//! 4. **Typed Outcomes**: Server-side "not applied" answers are `Ok` values,
//!    execution failures are `Err`.

use std::collections::BTreeMap;
use std::time::Duration;

use skv_transport::{Command, Connector, Execute, Reply, TcpConnector};
use tracing::{debug, trace, warn};

use crate::address::Address;
use crate::classify::{expect_array, expect_integer, expect_reply, expect_status, into_byte_strings};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::expiration::ExpirationTime;
use crate::set_op::{SetOpType, SetOutcome};

/// Single-connection synchronous client.
///
/// Constructing a client never touches the network. The first command
/// connects; a transport failure drops the connection and the following
/// command connects again. There is no retry within a call.
///
/// Every operation takes `&mut self`. Share one client across threads by
/// wrapping it in a `Mutex`, or give each worker its own.
pub struct SyncClient<C: Connector = TcpConnector> {
    address: Address,
    connect_timeout: Duration,
    connector: C,
    conn: Option<C::Connection>,
}

impl SyncClient<TcpConnector> {
    /// Creates a client for `addr` (`host[:port]`) with default configuration.
    pub fn new(addr: &str) -> ClientResult<Self> {
        Self::with_config(ClientConfig {
            addr: addr.to_string(),
            ..ClientConfig::default()
        })
    }

    /// Creates a client with a custom configuration.
    pub fn with_config(config: ClientConfig) -> ClientResult<Self> {
        let connector = TcpConnector {
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        };
        Self::with_connector(config, connector)
    }
}

impl<C: Connector> SyncClient<C> {
    /// Creates a client that opens connections through `connector`.
    ///
    /// Only `addr` and `connect_timeout` are read from `config`; socket
    /// options are the connector's business.
    pub fn with_connector(config: ClientConfig, connector: C) -> ClientResult<Self> {
        let address: Address = config.addr.parse()?;
        Ok(SyncClient {
            address,
            connect_timeout: config.connect_timeout,
            connector,
            conn: None,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// True while a connection is held. It may still turn out to be dead.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Drops the current connection, if any. The next command reconnects.
    pub fn disconnect(&mut self) {
        if self.conn.take().is_some() {
            debug!(addr = %self.address, "connection released");
        }
    }

    /// Pings the server. Returns the echoed payload, or `PONG`.
    pub fn ping(&mut self, payload: Option<&[u8]>) -> ClientResult<Vec<u8>> {
        let command = match payload {
            Some(data) => Command::new("PING").arg(data),
            None => Command::new("PING"),
        };
        let reply = self.execute(command)?;
        expect_reply(reply, "status or bulk string", |reply| match reply {
            Reply::Status(text) => Ok(text.into_bytes()),
            Reply::Bulk(data) => Ok(data),
            other => Err(other),
        })
    }

    /// Switches the connection to database `index`.
    ///
    /// The selection belongs to the connection; after a reconnect the server
    /// default applies again.
    pub fn select_db(&mut self, index: u32) -> ClientResult<()> {
        let reply = self.execute(Command::new("SELECT").int(i64::from(index)))?;
        expect_status(reply)
    }

    /// Sets a timeout of `seconds` on a key.
    ///
    /// Returns `Ok(false)` when the key is missing or the timeout could not
    /// be set.
    pub fn expire(&mut self, key: &[u8], seconds: u32) -> ClientResult<bool> {
        let reply = self.execute(Command::new("EXPIRE").arg(key).int(i64::from(seconds)))?;
        applied(reply)
    }

    /// Sets a timeout from an [`ExpirationTime`], resolved now.
    ///
    /// An expiry that is already due fails with
    /// [`ClientError::InvalidExpiration`] without contacting the server.
    pub fn expire_in(&mut self, key: &[u8], expiry: &ExpirationTime) -> ClientResult<bool> {
        let ttl = checked_ttl(expiry)?;
        let reply = self.execute(Command::new("EXPIRE").arg(key).int(ttl))?;
        applied(reply)
    }

    /// Expires a key at the given Unix timestamp.
    ///
    /// Returns `Ok(false)` when the key is missing or the timeout could not
    /// be set.
    pub fn expire_at(&mut self, key: &[u8], unix_time: i64) -> ClientResult<bool> {
        let reply = self.execute(Command::new("EXPIREAT").arg(key).int(unix_time))?;
        applied(reply)
    }

    /// Returns the raw TTL in seconds.
    ///
    /// Negative server sentinels (no expiry, no key) are passed through.
    pub fn ttl(&mut self, key: &[u8]) -> ClientResult<i64> {
        let reply = self.execute(Command::new("TTL").arg(key))?;
        expect_integer(reply)
    }

    /// Writes a value, optionally with an expiry and an existence condition.
    ///
    /// A condition that was not met is `Ok` with the matching [`SetOutcome`].
    pub fn set(
        &mut self,
        key: &[u8],
        value: &[u8],
        expiry: Option<&ExpirationTime>,
        op_type: SetOpType,
    ) -> ClientResult<SetOutcome> {
        let mut command = Command::new("SET").arg(key).arg(value);
        if let Some(expiry) = expiry {
            command = command.word("EX").int(checked_ttl(expiry)?);
        }
        if let Some(flag) = op_type.flag() {
            command = command.word(flag);
        }

        let reply = self.execute(command)?;
        expect_reply(reply, "status or nil", |reply| match reply {
            Reply::Status(_) => Ok(SetOutcome::Stored),
            Reply::Nil => Ok(op_type.not_applied()),
            other => Err(other),
        })
    }

    /// Fetches a value by key.
    ///
    /// Returns `Ok(None)` when the key is missing.
    pub fn get(&mut self, key: &[u8]) -> ClientResult<Option<Vec<u8>>> {
        let reply = self.execute(Command::new("GET").arg(key))?;
        expect_reply(reply, "bulk string or nil", |reply| match reply {
            Reply::Bulk(data) => Ok(Some(data)),
            Reply::Nil => Ok(None),
            other => Err(other),
        })
    }

    /// Adds members to a set. Returns how many were newly added.
    pub fn sadd<M: AsRef<[u8]>>(&mut self, key: &[u8], members: &[M]) -> ClientResult<i64> {
        let reply = self.execute(Command::new("SADD").arg(key).args(members))?;
        expect_integer(reply)
    }

    /// Returns the cardinality of a set.
    pub fn scard(&mut self, key: &[u8]) -> ClientResult<i64> {
        let reply = self.execute(Command::new("SCARD").arg(key))?;
        expect_integer(reply)
    }

    pub fn sismember(&mut self, key: &[u8], member: &[u8]) -> ClientResult<bool> {
        let reply = self.execute(Command::new("SISMEMBER").arg(key).arg(member))?;
        Ok(expect_integer(reply)? != 0)
    }

    /// Members of the first set that are in none of the others.
    pub fn sdiff<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> ClientResult<Vec<Vec<u8>>> {
        let reply = self.execute(Command::new("SDIFF").args(keys))?;
        into_byte_strings(expect_array(reply)?)
    }

    /// Stores `SDIFF keys` into `dest`. Returns the size of the result.
    pub fn sdiff_store<K: AsRef<[u8]>>(&mut self, dest: &[u8], keys: &[K]) -> ClientResult<i64> {
        let reply = self.execute(Command::new("SDIFFSTORE").arg(dest).args(keys))?;
        expect_integer(reply)
    }

    /// Members present in every given set.
    pub fn sinter<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> ClientResult<Vec<Vec<u8>>> {
        let reply = self.execute(Command::new("SINTER").args(keys))?;
        into_byte_strings(expect_array(reply)?)
    }

    /// Stores `SINTER keys` into `dest`. Returns the size of the result.
    pub fn sinter_store<K: AsRef<[u8]>>(&mut self, dest: &[u8], keys: &[K]) -> ClientResult<i64> {
        let reply = self.execute(Command::new("SINTERSTORE").arg(dest).args(keys))?;
        expect_integer(reply)
    }

    /// Fills `fields` with the hash values stored under `key`.
    ///
    /// Every key of `fields` is requested; missing fields are set to an empty
    /// value. On error `fields` may be partially updated.
    pub fn hget(&mut self, key: &[u8], fields: &mut BTreeMap<Vec<u8>, Vec<u8>>) -> ClientResult<()> {
        let reply = self.execute(Command::new("HMGET").arg(key).args(fields.keys()))?;
        let items = expect_array(reply)?;
        if items.len() != fields.len() {
            return Err(ClientError::ArityMismatch {
                expected: fields.len(),
                actual: items.len(),
            });
        }

        // BTreeMap iterates in the same sorted order the request was built in.
        for (slot, item) in fields.values_mut().zip(items) {
            *slot = expect_reply(item, "bulk string or nil", |item| match item {
                Reply::Bulk(data) => Ok(data),
                Reply::Nil => Ok(Vec::new()),
                other => Err(other),
            })?;
        }
        Ok(())
    }

    /// Writes every field/value pair of `fields` into the hash at `key`.
    pub fn hset(&mut self, key: &[u8], fields: &BTreeMap<Vec<u8>, Vec<u8>>) -> ClientResult<()> {
        let mut command = Command::new("HMSET").arg(key);
        for (field, value) in fields {
            command = command.arg(field).arg(value);
        }
        let reply = self.execute(command)?;
        expect_status(reply)
    }

    fn ensure_connected(&mut self) -> ClientResult<&mut C::Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                let conn = self
                    .connector
                    .connect(self.address.host(), self.address.port(), self.connect_timeout)
                    .map_err(|source| {
                        warn!(addr = %self.address, error = %source, "connect failed");
                        ClientError::Connect {
                            addr: self.address.to_string(),
                            source,
                        }
                    })?;
                debug!(addr = %self.address, "connected");
                conn
            }
        };
        Ok(self.conn.insert(conn))
    }

    fn execute(&mut self, command: Command<'_>) -> ClientResult<Reply> {
        let conn = self.ensure_connected()?;
        trace!(command = command.name(), args = command.len(), "execute");
        match conn.execute(&command) {
            Ok(reply) => Ok(reply),
            Err(err) => {
                warn!(
                    addr = %self.address,
                    command = command.name(),
                    error = %err,
                    "transport failure, dropping connection"
                );
                self.disconnect();
                Err(ClientError::Transport(err))
            }
        }
    }
}

/// EXPIRE/EXPIREAT answer 1 when the timeout was set, 0 otherwise.
fn applied(reply: Reply) -> ClientResult<bool> {
    Ok(expect_integer(reply)? == 1)
}

fn checked_ttl(expiry: &ExpirationTime) -> ClientResult<i64> {
    let ttl = expiry.remaining_seconds();
    if ttl <= 0 {
        return Err(ClientError::InvalidExpiration(ttl));
    }
    Ok(ttl)
}

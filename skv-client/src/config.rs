use std::time::Duration;

use serde::Deserialize;

/// Default bound on connection establishment.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for the synchronous client.
///
/// Deserializable so it can sit inside a host application's config file;
/// every field is optional there.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server address, e.g. "127.0.0.1:6379". The port is optional.
    pub addr: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Optional TCP read timeout. Unset means a stalled server blocks the call.
    pub read_timeout: Option<Duration>,
    /// Optional TCP write timeout.
    pub write_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            addr: "127.0.0.1:6379".to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

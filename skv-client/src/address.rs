//! Server address parsing.
//!
//! Accepts `host`, `host:port`, `host:` and `[v6]:port`. A missing port
//! means [`DEFAULT_PORT`].

use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

/// Port used when the address string does not carry one.
pub const DEFAULT_PORT: u16 = 6379;

/// Validated server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    host: String,
    port: u16,
}

impl Address {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for Address {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ClientError::InvalidAddress(s.to_string());

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            let port = match tail {
                "" => None,
                _ => Some(tail.strip_prefix(':').ok_or_else(invalid)?),
            };
            (host, port)
        } else {
            match s.rsplit_once(':') {
                // Bare IPv6 literals are ambiguous without brackets.
                Some((host, _)) if host.contains(':') => return Err(invalid()),
                Some((host, port)) => (host, Some(port)),
                None => (s, None),
            }
        };

        if host.is_empty() {
            return Err(invalid());
        }
        let port = match port {
            None | Some("") => DEFAULT_PORT,
            Some(text) => match text.parse::<u16>() {
                Ok(0) | Err(_) => return Err(invalid()),
                Ok(port) => port,
            },
        };

        Ok(Address {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

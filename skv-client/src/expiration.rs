//! # Expiration Time
//!
//! A key expiry expressed either relative to the moment of use or as an
//! absolute wall-clock instant. Remaining seconds are always computed when
//! the command is built, never cached.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Absolute or relative expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationTime {
    /// Expires this long after the command is issued.
    After(Duration),
    /// Expires at this Unix timestamp, in seconds.
    AtUnix(i64),
}

impl ExpirationTime {
    pub fn after(ttl: Duration) -> Self {
        ExpirationTime::After(ttl)
    }

    pub fn after_secs(secs: u64) -> Self {
        ExpirationTime::After(Duration::from_secs(secs))
    }

    /// Expires at `deadline`. Instants before the epoch clamp to negative
    /// timestamps and are therefore always in the past.
    pub fn at(deadline: SystemTime) -> Self {
        ExpirationTime::AtUnix(unix_seconds(deadline))
    }

    pub fn at_unix(secs: i64) -> Self {
        ExpirationTime::AtUnix(secs)
    }

    /// Seconds left until expiry, measured against the current wall clock.
    ///
    /// Zero or negative means the expiry is already due.
    pub fn remaining_seconds(&self) -> i64 {
        self.remaining_seconds_from(SystemTime::now())
    }

    /// Seconds left until expiry, measured against `now`.
    pub fn remaining_seconds_from(&self, now: SystemTime) -> i64 {
        match *self {
            ExpirationTime::After(ttl) => i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
            ExpirationTime::AtUnix(deadline) => deadline.saturating_sub(unix_seconds(now)),
        }
    }
}

impl From<Duration> for ExpirationTime {
    fn from(ttl: Duration) -> Self {
        ExpirationTime::After(ttl)
    }
}

impl From<SystemTime> for ExpirationTime {
    fn from(deadline: SystemTime) -> Self {
        ExpirationTime::at(deadline)
    }
}

fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
        Err(err) => -i64::try_from(err.duration().as_secs()).unwrap_or(i64::MAX),
    }
}

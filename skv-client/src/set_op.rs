//! SET condition flags and their outcomes.

use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

/// Which conditional-write flag a SET carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SetOpType {
    /// Plain SET, overwrites any existing value.
    #[default]
    Anyhow,
    /// `NX`: only set when the key does not exist.
    IfNotExist,
    /// `XX`: only set when the key already exists.
    IfExist,
}

impl SetOpType {
    /// Wire flag appended after the value (and after `EX ttl` if present).
    pub fn flag(self) -> Option<&'static str> {
        match self {
            SetOpType::Anyhow => None,
            SetOpType::IfNotExist => Some("NX"),
            SetOpType::IfExist => Some("XX"),
        }
    }

    /// Outcome reported when the server answers nil for this op type.
    pub(crate) fn not_applied(self) -> SetOutcome {
        match self {
            SetOpType::Anyhow => SetOutcome::Rejected,
            SetOpType::IfNotExist => SetOutcome::KeyExists,
            SetOpType::IfExist => SetOutcome::KeyMissing,
        }
    }
}

/// Numeric codes: 0 = anyhow, 1 = if-not-exist, 2 = if-exist.
impl TryFrom<i32> for SetOpType {
    type Error = ClientError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(SetOpType::Anyhow),
            1 => Ok(SetOpType::IfNotExist),
            2 => Ok(SetOpType::IfExist),
            other => Err(ClientError::UnsupportedSetOp(other.to_string())),
        }
    }
}

impl FromStr for SetOpType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anyhow" => Ok(SetOpType::Anyhow),
            "nx" | "if_not_exist" => Ok(SetOpType::IfNotExist),
            "xx" | "if_exist" => Ok(SetOpType::IfExist),
            _ => Err(ClientError::UnsupportedSetOp(s.to_string())),
        }
    }
}

/// Result of a SET that executed successfully on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Value written.
    Stored,
    /// `NX` given and the key already existed.
    KeyExists,
    /// `XX` given and the key did not exist.
    KeyMissing,
    /// Server answered nil to an unconditional SET.
    Rejected,
}

impl SetOutcome {
    pub fn is_stored(self) -> bool {
        self == SetOutcome::Stored
    }
}

impl fmt::Display for SetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SetOutcome::Stored => "stored",
            SetOutcome::KeyExists => "key already exists",
            SetOutcome::KeyMissing => "key does not exist",
            SetOutcome::Rejected => "unknown error",
        };
        f.write_str(text)
    }
}

//! # Reply Values
//!
//! Typed view of one RESP2 reply. A reply is produced per executed command
//! and moved into whoever interprets it, so it never outlives the call.

use std::fmt;

/// One reply from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK` style status line.
    Status(String),
    /// `:42` integer.
    Integer(i64),
    /// `$n` bulk string. Binary safe.
    Bulk(Vec<u8>),
    /// `$-1` or `*-1`.
    Nil,
    /// `*n` array of nested replies.
    Array(Vec<Reply>),
    /// `-ERR ...` error line.
    Error(String),
}

/// Discriminant of a [`Reply`], used when reporting shape mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyKind {
    Status,
    Integer,
    Bulk,
    Nil,
    Array,
    Error,
}

impl Reply {
    /// Returns the variant tag of this reply.
    pub fn kind(&self) -> ReplyKind {
        match self {
            Reply::Status(_) => ReplyKind::Status,
            Reply::Integer(_) => ReplyKind::Integer,
            Reply::Bulk(_) => ReplyKind::Bulk,
            Reply::Nil => ReplyKind::Nil,
            Reply::Array(_) => ReplyKind::Array,
            Reply::Error(_) => ReplyKind::Error,
        }
    }
}

impl fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReplyKind::Status => "status",
            ReplyKind::Integer => "integer",
            ReplyKind::Bulk => "bulk string",
            ReplyKind::Nil => "nil",
            ReplyKind::Array => "array",
            ReplyKind::Error => "error",
        };
        f.write_str(name)
    }
}

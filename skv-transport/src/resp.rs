//! # RESP2 Reply Reader
//!
//! Purpose: Turn the bytes of one server reply into a [`Reply`]. Command
//! encoding lives on [`crate::Command`].
//!
//! ## Design Principles
//! 1. **Untrusted Input**: Length headers are validated before anything is
//!    allocated; buffers grow from bytes actually received.
//! 2. **Bounded Work**: Lines, bulk strings and nesting depth all have limits.
//! 3. **Binary-Safe**: Bulk strings are kept as raw bytes.
//! 4. **Fail Fast**: Framing violations surface as `Protocol`, a short read as
//!    `Closed`; either way the caller discards the connection.

use std::io::{BufRead, Read};

use crate::error::{TransportError, TransportResult};
use crate::reply::Reply;

/// Largest bulk string accepted, matching the server's `proto-max-bulk-len`
/// default of 512 MiB.
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Longest header or status line accepted, CRLF included.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Deepest array nesting accepted.
pub const MAX_DEPTH: usize = 32;

// Upper bounds on up-front reservations; anything larger grows as data arrives.
const BULK_PREALLOC: usize = 64 * 1024;
const ARRAY_PREALLOC: usize = 1024;

/// Reads one reply. `line_buf` is scratch space reused across calls.
pub fn read_reply<R: BufRead>(reader: &mut R, line_buf: &mut Vec<u8>) -> TransportResult<Reply> {
    read_nested(reader, line_buf, 0)
}

fn read_nested<R: BufRead>(reader: &mut R, line_buf: &mut Vec<u8>, depth: usize) -> TransportResult<Reply> {
    read_line(reader, line_buf)?;
    let (&tag, body) = line_buf
        .split_first()
        .ok_or(TransportError::Protocol("empty reply line"))?;

    match tag {
        b'+' => Ok(Reply::Status(String::from_utf8_lossy(body).into_owned())),
        b'-' => Ok(Reply::Error(String::from_utf8_lossy(body).into_owned())),
        b':' => parse_integer(body).map(Reply::Integer),
        b'$' => match parse_length(body)? {
            None => Ok(Reply::Nil),
            Some(len) => read_bulk(reader, len),
        },
        b'*' => match parse_length(body)? {
            None => Ok(Reply::Nil),
            Some(count) => {
                if depth >= MAX_DEPTH {
                    return Err(TransportError::Protocol("arrays nested too deeply"));
                }
                let mut items = Vec::with_capacity(count.min(ARRAY_PREALLOC));
                for _ in 0..count {
                    items.push(read_nested(reader, line_buf, depth + 1)?);
                }
                Ok(Reply::Array(items))
            }
        },
        _ => Err(TransportError::Protocol("unknown reply type byte")),
    }
}

fn read_bulk<R: BufRead>(reader: &mut R, len: usize) -> TransportResult<Reply> {
    if len > MAX_BULK_LEN {
        return Err(TransportError::Protocol("bulk string exceeds size limit"));
    }
    let framed = len + 2;
    let mut data = Vec::with_capacity(framed.min(BULK_PREALLOC));
    reader.by_ref().take(framed as u64).read_to_end(&mut data)?;
    if data.len() < framed {
        return Err(TransportError::Closed);
    }
    if !data.ends_with(b"\r\n") {
        return Err(TransportError::Protocol("bulk string not terminated by CRLF"));
    }
    data.truncate(len);
    Ok(Reply::Bulk(data))
}

/// Reads up to and including the next `\n`, leaving the line without CRLF.
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> TransportResult<()> {
    buf.clear();
    let read = reader.by_ref().take(MAX_LINE_LEN as u64).read_until(b'\n', buf)?;
    if read == 0 {
        return Err(TransportError::Closed);
    }
    if !buf.ends_with(b"\r\n") {
        return Err(match buf.last() {
            Some(b'\n') => TransportError::Protocol("line not terminated by CRLF"),
            _ if read == MAX_LINE_LEN => TransportError::Protocol("line exceeds size limit"),
            _ => TransportError::Closed,
        });
    }
    buf.truncate(buf.len() - 2);
    Ok(())
}

fn parse_integer(text: &[u8]) -> TransportResult<i64> {
    std::str::from_utf8(text)
        .ok()
        .filter(|digits| !digits.starts_with('+'))
        .and_then(|digits| digits.parse::<i64>().ok())
        .ok_or(TransportError::Protocol("invalid integer"))
}

/// `-1` is the nil marker; any other negative length is malformed.
fn parse_length(text: &[u8]) -> TransportResult<Option<usize>> {
    match parse_integer(text)? {
        -1 => Ok(None),
        len => usize::try_from(len)
            .map(Some)
            .map_err(|_| TransportError::Protocol("invalid length")),
    }
}

//! # Command Builder
//!
//! Purpose: Assemble one RESP2 command from typed argument tokens instead of
//! a format string, so the argument count always matches what was appended.
//!
//! ## Design Principles
//! 1. **Builder Pattern**: Each call appends exactly one token.
//! 2. **Borrow-Friendly**: Byte arguments borrow the caller's buffers.
//! 3. **Binary-Safe**: Every token is written as a length-prefixed bulk string.
//! 4. **Allocation-Light**: Integers render through a stack buffer.

use bytes::{BufMut, BytesMut};

/// One argument of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arg<'a> {
    /// Command name or flag such as `EX` or `NX`.
    Word(&'static str),
    /// Integer parameter, sent as decimal text.
    Int(i64),
    /// Key, value, member or field, sent verbatim.
    Bytes(&'a [u8]),
}

/// A command ready to be written to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    args: Vec<Arg<'a>>,
}

impl<'a> Command<'a> {
    /// Starts a command with its name as the first token.
    pub fn new(name: &'static str) -> Self {
        let mut args = Vec::with_capacity(4);
        args.push(Arg::Word(name));
        Command { args }
    }

    /// Appends a binary-safe argument.
    pub fn arg(mut self, data: &'a [u8]) -> Self {
        self.args.push(Arg::Bytes(data));
        self
    }

    /// Appends every item in order. An empty iterator appends nothing.
    pub fn args<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        T: AsRef<[u8]> + ?Sized + 'a,
    {
        self.args
            .extend(items.into_iter().map(|item| Arg::Bytes(item.as_ref())));
        self
    }

    /// Appends an integer parameter.
    pub fn int(mut self, value: i64) -> Self {
        self.args.push(Arg::Int(value));
        self
    }

    /// Appends a flag word.
    pub fn word(mut self, word: &'static str) -> Self {
        self.args.push(Arg::Word(word));
        self
    }

    /// Command name, e.g. `"SET"`.
    pub fn name(&self) -> &'static str {
        match self.args.first() {
            Some(Arg::Word(name)) => *name,
            _ => "",
        }
    }

    /// Number of tokens including the command name.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Materializes every token as owned bytes, as the server would see them.
    pub fn to_vec(&self) -> Vec<Vec<u8>> {
        self.args
            .iter()
            .map(|arg| match *arg {
                Arg::Word(word) => word.as_bytes().to_vec(),
                Arg::Int(value) => {
                    let (buf, len) = format_i64(value);
                    buf[..len].to_vec()
                }
                Arg::Bytes(data) => data.to_vec(),
            })
            .collect()
    }

    /// Encodes the command as a RESP2 array of bulk strings.
    pub fn encode(&self, out: &mut BytesMut) {
        out.put_u8(b'*');
        push_usize(out, self.args.len());
        out.put_slice(b"\r\n");
        for arg in &self.args {
            match *arg {
                Arg::Word(word) => push_bulk(out, word.as_bytes()),
                Arg::Int(value) => {
                    let (buf, len) = format_i64(value);
                    push_bulk(out, &buf[..len]);
                }
                Arg::Bytes(data) => push_bulk(out, data),
            }
        }
    }
}

fn push_bulk(out: &mut BytesMut, data: &[u8]) {
    out.reserve(data.len() + 16);
    out.put_u8(b'$');
    push_usize(out, data.len());
    out.put_slice(b"\r\n");
    out.put_slice(data);
    out.put_slice(b"\r\n");
}

fn push_usize(out: &mut BytesMut, value: usize) {
    let (buf, len) = format_u64(value as u64);
    out.put_slice(&buf[..len]);
}

/// Renders a signed integer into a stack buffer, returning the used length.
fn format_i64(value: i64) -> ([u8; 20], usize) {
    if value >= 0 {
        return format_u64(value as u64);
    }
    // 19 digits of i64::MIN magnitude plus the sign fit in 20 bytes.
    let (digits, len) = format_u64(value.unsigned_abs());
    let mut buf = [0u8; 20];
    buf[0] = b'-';
    buf[1..=len].copy_from_slice(&digits[..len]);
    (buf, len + 1)
}

fn format_u64(mut value: u64) -> ([u8; 20], usize) {
    let mut buf = [0u8; 20];
    let mut len = 0;
    if value == 0 {
        buf[0] = b'0';
        return (buf, 1);
    }
    while value > 0 {
        buf[len] = b'0' + (value % 10) as u8;
        value /= 10;
        len += 1;
    }
    buf[..len].reverse();
    (buf, len)
}

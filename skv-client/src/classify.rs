//! # Reply Classification
//!
//! Every command expects one reply shape. [`expect_reply`] turns error
//! replies into [`ClientError::Server`], hands everything else to an
//! extractor, and reports whatever the extractor refuses as a shape
//! mismatch. The per-shape helpers below cover the common cases.

use skv_transport::Reply;

use crate::error::{ClientError, ClientResult};

/// Runs `extract` on a non-error reply.
///
/// The extractor returns `Err(reply)` to reject a shape; `expected` names the
/// accepted shapes in the resulting error.
pub(crate) fn expect_reply<T, F>(reply: Reply, expected: &'static str, extract: F) -> ClientResult<T>
where
    F: FnOnce(Reply) -> Result<T, Reply>,
{
    match reply {
        Reply::Error(message) => Err(ClientError::Server(message)),
        other => extract(other).map_err(|rejected| ClientError::UnexpectedReply {
            expected,
            actual: rejected.kind(),
        }),
    }
}

pub(crate) fn expect_status(reply: Reply) -> ClientResult<()> {
    expect_reply(reply, "status", |reply| match reply {
        Reply::Status(_) => Ok(()),
        other => Err(other),
    })
}

pub(crate) fn expect_integer(reply: Reply) -> ClientResult<i64> {
    expect_reply(reply, "integer", |reply| match reply {
        Reply::Integer(value) => Ok(value),
        other => Err(other),
    })
}

pub(crate) fn expect_array(reply: Reply) -> ClientResult<Vec<Reply>> {
    expect_reply(reply, "array", |reply| match reply {
        Reply::Array(items) => Ok(items),
        other => Err(other),
    })
}

/// Converts array elements into byte strings, preserving order.
pub(crate) fn into_byte_strings(items: Vec<Reply>) -> ClientResult<Vec<Vec<u8>>> {
    items
        .into_iter()
        .map(|item| {
            expect_reply(item, "bulk string", |item| match item {
                Reply::Bulk(data) => Ok(data),
                Reply::Status(text) => Ok(text.into_bytes()),
                other => Err(other),
            })
        })
        .collect()
}

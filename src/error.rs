//! Decode error type.

use thiserror::Error;

/// Error produced while decoding a Thrift message.
///
/// Every variant is terminal for the decode in progress: a single
/// malformed byte aborts the whole message and no partial [`Message`]
/// is ever returned. Variants carry the byte offset at which the
/// problem was detected where one is available.
///
/// [`Message`]: crate::Message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer too short: {0} bytes")]
    BufferTooShort(usize),
    #[error("bad binary protocol version at offset {0}")]
    BadVersion(usize),
    #[error("bad compact protocol id at offset {0}")]
    BadProtocolId(usize),
    #[error("bad compact protocol version at offset {0}")]
    BadCompactVersion(usize),
    #[error("decoder state violated at offset {0}")]
    WrongDecoderState(usize),
    #[error("too many fields in struct (limit {0})")]
    TooManyFields(usize),
    #[error("container of size {size} exceeds limit {limit}")]
    ContainerTooLarge { size: u32, limit: u32 },
    #[error("invalid size at offset {0}")]
    InvalidSize(usize),
    #[error("invalid method name")]
    InvalidMethodName,
    #[error("method name too long: {0} bytes")]
    MethodTooLong(usize),
    #[error("unexpected end of input at offset {0}")]
    Truncated(usize),
    #[error("unexpected JSON character {ch:?} at offset {offset}")]
    UnexpectedJsonChar { ch: char, offset: usize },
    #[error("unterminated JSON string at offset {0}")]
    UnterminatedString(usize),
    #[error("bad surrogate pair at offset {0}")]
    BadSurrogatePair(usize),
    #[error("unescaped control character at offset {0}")]
    UnescapedControlChar(usize),
    #[error("unknown type code at offset {0}")]
    UnknownTypeCode(usize),
    #[error("invalid UTF-8 at offset {0}")]
    InvalidUtf8(usize),
    #[error("varint longer than 10 bytes at offset {0}")]
    VarintTooLong(usize),
    #[error("nesting deeper than {0} levels")]
    DepthLimitExceeded(usize),
}

//! Byte cursor over an in-memory message buffer.

use crate::error::DecodeError;

/// Sequential reader over an immutable byte slice.
///
/// Tracks the number of bytes pulled from the buffer and supports a
/// one-byte lookahead: a peeked byte counts as read immediately, and
/// the next [`next`](ByteCursor::next) call returns the cached byte
/// instead of advancing again. Only the JSON protocol peeks.
///
/// A cursor is owned by exactly one protocol instance for the duration
/// of one decode call; nothing is shared across decodes.
pub struct ByteCursor<'a> {
    data: &'a [u8],
    x: usize,
    peeked: Option<u8>,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            x: 0,
            peeked: None,
        }
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of bytes pulled from the buffer so far. A byte sitting in
    /// the peek cache has already been pulled and is counted.
    pub fn bytes_read(&self) -> usize {
        self.x
    }

    /// Reads the next byte, consuming the peek cache first.
    #[inline]
    pub fn next(&mut self) -> Result<u8, DecodeError> {
        if let Some(b) = self.peeked.take() {
            return Ok(b);
        }
        if self.x >= self.data.len() {
            return Err(DecodeError::Truncated(self.x));
        }
        let b = self.data[self.x];
        self.x += 1;
        Ok(b)
    }

    /// Returns the next byte without consuming it.
    #[inline]
    pub fn peek(&mut self) -> Result<u8, DecodeError> {
        if let Some(b) = self.peeked {
            return Ok(b);
        }
        if self.x >= self.data.len() {
            return Err(DecodeError::Truncated(self.x));
        }
        let b = self.data[self.x];
        self.x += 1;
        self.peeked = Some(b);
        Ok(b)
    }

    /// Reads `size` bytes into an owned buffer.
    pub fn take(&mut self, size: usize) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::with_capacity(size);
        for _ in 0..size {
            out.push(self.next()?);
        }
        Ok(out)
    }
}

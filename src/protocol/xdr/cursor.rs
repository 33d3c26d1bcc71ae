//! Bounds-checked read cursor over an XDR encoded reply.
//!
//! Every read goes through [`XdrCursor::decode`], which hands out the next `n`
//! bytes and then steps over their padding to the following 4-byte boundary.
//! There is no way to move the cursor without naming the field being consumed,
//! so every length read from the wire is checked against the buffer end.

use thiserror::Error;

use super::utils::padded_len;

/// Longest directory entry name this client accepts.
pub const NAME_MAX: usize = 255;

/// Errors raised while decoding XDR data received from a server.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended before the field did.
    #[error("premature end of packet: needed {needed} bytes, {remaining} left")]
    Truncated { needed: usize, remaining: usize },

    /// A directory entry name is longer than [`NAME_MAX`].
    #[error("returned a too long filename: {len} bytes")]
    NameTooLong { len: usize },

    /// A file handle is longer than `NFS3_FHSIZE`.
    #[error("file handle too big: {len} bytes")]
    HandleTooBig { len: usize },

    /// A variable-length field is longer than its declared maximum.
    #[error("opaque field of {len} bytes exceeds the maximum of {max}")]
    OpaqueTooLong { len: usize, max: usize },

    /// A boolean discriminant other than 0 or 1.
    #[error("invalid value for bool: {0}")]
    InvalidBool(u32),

    /// An enum discriminant this client does not know.
    #[error("invalid enum value: {0}")]
    InvalidEnum(u32),
}

/// A read cursor over a borrowed byte buffer.
#[derive(Debug, Clone)]
pub struct XdrCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> XdrCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Resumes decoding `buf` at a position previously returned by
    /// [`XdrCursor::position`].
    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos: pos.min(buf.len()) }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Everything from the current position to the end of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Returns the next `n` bytes and advances past them and their padding.
    ///
    /// Padding missing at the very end of the buffer is tolerated; the data
    /// itself never is.
    pub fn decode(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(DecodeError::Truncated { needed: n, remaining });
        }
        let start = self.pos;
        self.pos = (start + padded_len(n)).min(self.buf.len());
        Ok(&self.buf[start..start + n])
    }

    pub fn decode_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.decode(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn decode_u64(&mut self) -> Result<u64, DecodeError> {
        let mut word = [0_u8; 8];
        word.copy_from_slice(self.decode(8)?);
        Ok(u64::from_be_bytes(word))
    }

    pub fn decode_bool(&mut self) -> Result<bool, DecodeError> {
        match self.decode_u32()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidBool(other)),
        }
    }

    /// Fixed-length opaque data (`opaque identifier[N]`).
    pub fn decode_fixed<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0_u8; N];
        out.copy_from_slice(self.decode(N)?);
        Ok(out)
    }

    /// Variable-length opaque data with an upper bound (`opaque identifier<max>`).
    pub fn decode_opaque(&mut self, max: usize) -> Result<&'a [u8], DecodeError> {
        let len = self.decode_u32()? as usize;
        if len > max {
            return Err(DecodeError::OpaqueTooLong { len, max });
        }
        self.decode(len)
    }

    /// A directory entry name, at most [`NAME_MAX`] bytes.
    pub fn decode_name(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.decode_u32()? as usize;
        if len > NAME_MAX {
            return Err(DecodeError::NameTooLong { len });
        }
        self.decode(len)
    }
}

//! Bounded scratch buffer for outgoing RPC arguments.
//!
//! A [`RequestBuf`] is sized once, at construction, to the largest request the
//! client is going to issue. Appending never grows the allocation: a field that
//! does not fit is rejected as a whole with [`Error::RequestTooLarge`] and the
//! buffer is left as it was before the failed append.

use std::io::{self, Write};

use super::nfs3::nfs_fh3;
use super::rpc::{auth_flavor, auth_unix, opaque_auth, AUTH_UNIX_BODY_LEN};
use super::utils::ALIGNMENT;
use super::Serialize;
use crate::error::{Error, Result};

/// Default request capacity, in 32-bit words.
pub const MAX_REQUEST_WORDS: usize = 1024;

#[derive(Debug, Clone)]
pub struct RequestBuf {
    buf: Vec<u8>,
    limit: usize,
}

impl Default for RequestBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuf {
    /// Buffer holding up to [`MAX_REQUEST_WORDS`] words.
    pub fn new() -> Self {
        Self::with_capacity(MAX_REQUEST_WORDS)
    }

    /// Buffer holding up to `words` 32-bit words.
    pub fn with_capacity(words: usize) -> Self {
        let limit = words * ALIGNMENT;
        Self { buf: Vec::with_capacity(limit), limit }
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Appends any serializable value, all or nothing.
    pub fn add<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self> {
        let mark = self.buf.len();
        if let Err(err) = value.serialize(self) {
            self.buf.truncate(mark);
            return Err(match err.kind() {
                io::ErrorKind::WriteZero => Error::RequestTooLarge { capacity: self.limit },
                _ => Error::Encode(err),
            });
        }
        Ok(self)
    }

    pub fn add_uint32(&mut self, val: u32) -> Result<&mut Self> {
        self.add(&val)
    }

    /// Eight bytes, big-endian.
    pub fn add_uint64(&mut self, val: u64) -> Result<&mut Self> {
        self.add(&val)
    }

    /// Length word, handle bytes, zero padding.
    pub fn add_file_handle(&mut self, fh: &nfs_fh3) -> Result<&mut Self> {
        self.add(fh)
    }

    /// Length word, name bytes, zero padding.
    pub fn add_opaque_name(&mut self, name: &[u8]) -> Result<&mut Self> {
        self.add(name)
    }

    /// Fixed-length opaque data with no length word, e.g. a cookie verifier.
    pub fn add_fixed<const N: usize>(&mut self, data: &[u8; N]) -> Result<&mut Self> {
        self.add(data)
    }

    /// AUTH_UNIX credential followed by an AUTH_NONE verifier.
    ///
    /// The credential body is exactly 20 bytes: stamp 0, a zero-length
    /// machine name, uid 0, gid 0 and an empty auxiliary group list.
    pub fn add_credentials(&mut self) -> Result<&mut Self> {
        let mut body = Vec::with_capacity(AUTH_UNIX_BODY_LEN as usize);
        auth_unix::default().serialize(&mut body).map_err(Error::Encode)?;
        let cred = opaque_auth { flavor: auth_flavor::AUTH_UNIX as u32, body };
        self.add_auth_pair(&cred)
    }

    /// AUTH_NONE credential and AUTH_NONE verifier.
    pub fn add_auth_none(&mut self) -> Result<&mut Self> {
        self.add_auth_pair(&opaque_auth::default())
    }

    /// `cred` and an AUTH_NONE verifier, both or neither.
    fn add_auth_pair(&mut self, cred: &opaque_auth) -> Result<&mut Self> {
        let mark = self.buf.len();
        let added = self.add(cred).and_then(|buf| buf.add(&opaque_auth::default())).map(|_| ());
        if let Err(err) = added {
            self.buf.truncate(mark);
            return Err(err);
        }
        Ok(self)
    }
}

impl Write for RequestBuf {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let room = self.limit - self.buf.len();
        if room == 0 && !data.is_empty() {
            return Ok(0);
        }
        let n = data.len().min(room);
        self.buf.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

//! Streaming reads of a regular file.

use std::collections::VecDeque;
use std::io::{self, Read, Seek, SeekFrom};

use tracing::trace;

use crate::attr::Attrs;
use crate::protocol::nfs::v3::{nfsproc3_getattr, nfsproc3_read};
use crate::protocol::rpc::{RpcClient, Transport};
use crate::protocol::xdr::nfs3::file::READ_CHUNK;
use crate::protocol::xdr::nfs3::nfs_fh3;

/// FIFO of bytes fetched from the server but not yet handed to the caller.
#[derive(Debug)]
struct ByteRing {
    bytes: VecDeque<u8>,
}

impl ByteRing {
    fn new() -> Self {
        Self { bytes: VecDeque::with_capacity(READ_CHUNK as usize) }
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn fill(&mut self, data: &[u8]) {
        self.bytes.extend(data);
    }

    fn drain_into(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.bytes.len());
        for (dst, src) in buf.iter_mut().zip(self.bytes.drain(..n)) {
            *dst = src;
        }
        n
    }

    fn clear(&mut self) {
        self.bytes.clear();
    }
}

/// An open regular file.
///
/// Reads are served from a buffer of at most one READ reply. An empty
/// buffer triggers one READ of `min(len, 1024)` bytes at the current
/// position; a zero-length result means end of file.
pub struct NfsFile<'a, T: Transport> {
    rpc: &'a mut RpcClient<T>,
    handle: nfs_fh3,
    attrs: Option<Attrs>,
    pos: u64,
    ring: ByteRing,
    eof: bool,
}

impl<'a, T: Transport> NfsFile<'a, T> {
    pub fn new(rpc: &'a mut RpcClient<T>, handle: nfs_fh3, attrs: Option<Attrs>) -> Self {
        Self { rpc, handle, attrs, pos: 0, ring: ByteRing::new(), eof: false }
    }

    pub fn handle(&self) -> &nfs_fh3 {
        &self.handle
    }

    /// The most recent attributes returned by the server.
    pub fn attrs(&self) -> Option<&Attrs> {
        self.attrs.as_ref()
    }

    /// Offset of the next byte [`Read::read`] returns.
    pub fn position(&self) -> u64 {
        self.pos
    }

    fn size(&mut self) -> crate::Result<u64> {
        if let Some(attrs) = &self.attrs {
            return Ok(attrs.size);
        }
        let attrs = nfsproc3_getattr(self.rpc, &self.handle)?;
        self.attrs = Some(attrs);
        Ok(attrs.size)
    }

    fn refill(&mut self, want: usize) -> crate::Result<()> {
        let count = want.min(READ_CHUNK as usize) as u32;
        let result = nfsproc3_read(self.rpc, &self.handle, self.pos, count)?;
        trace!(offset = self.pos, count, got = result.data.len(), eof = result.eof, "refill");
        if result.attributes.is_some() {
            self.attrs = result.attributes;
        }
        self.ring.fill(&result.data);
        self.eof = result.eof;
        Ok(())
    }
}

impl<T: Transport> Read for NfsFile<'_, T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.ring.is_empty() {
            if self.eof {
                return Ok(0);
            }
            self.refill(buf.len())?;
        }
        let n = self.ring.drain_into(buf);
        self.pos += n as u64;
        Ok(n)
    }
}

impl<T: Transport> Seek for NfsFile<'_, T> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
            SeekFrom::End(delta) => self.size()?.checked_add_signed(delta),
        };
        let Some(target) = target else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "invalid seek to a negative or overflowing position"));
        };
        if target != self.pos || !self.ring.is_empty() {
            trace!(from = self.pos, to = target, dropped = self.ring.len(), "seek");
        }
        self.ring.clear();
        self.eof = false;
        self.pos = target;
        Ok(target)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.pos)
    }
}

impl<T: Transport> std::fmt::Debug for NfsFile<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NfsFile")
            .field("handle", &self.handle)
            .field("pos", &self.pos)
            .field("buffered", &self.ring.len())
            .field("eof", &self.eof)
            .finish()
    }
}

//! Directory enumeration over READDIR.
//!
//! A [`DirCursor`] walks a directory page by page:
//!
//! ```text
//! Start --fetch--> Paging --(no more entries, eof)--> Done
//!                    ^  |
//!                    +--+ (no more entries, not eof: fetch next page)
//! ```
//!
//! Each page is decoded lazily out of the reply packet. The cookie of the last
//! entry handed out, together with the page's cookie verifier, is what the
//! next request resumes from. A cursor cannot be rewound.

use std::borrow::Cow;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::nfs::v3::{nfsproc3_readdir, ReaddirPage};
use crate::protocol::rpc::{RpcClient, Transport};
use crate::protocol::xdr::nfs3::{cookie3, cookieverf3, dir::entry3, nfs_fh3};
use crate::protocol::xdr::deserialize;

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Raw entry name, at most 255 bytes.
    pub name: Vec<u8>,
    /// Position of the entry within the directory.
    pub cookie: cookie3,
}

impl DirEntry {
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }
}

#[derive(Debug)]
enum State {
    Start,
    Paging {
        page: ReaddirPage,
        pos: usize,
        /// Entries handed out from this page so far.
        yielded: usize,
    },
    Done,
}

#[derive(Debug)]
pub struct DirCursor {
    dir: nfs_fh3,
    cookie: cookie3,
    verifier: cookieverf3,
    state: State,
}

impl DirCursor {
    pub fn new(dir: nfs_fh3) -> Self {
        Self { dir, cookie: 0, verifier: [0; 8], state: State::Start }
    }

    pub fn cookie(&self) -> cookie3 {
        self.cookie
    }

    pub fn verifier(&self) -> &cookieverf3 {
        &self.verifier
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Returns the next entry, fetching pages as needed, or `None` once the
    /// server has reported the end of the directory.
    ///
    /// An error ends the enumeration.
    pub fn next_entry<T: Transport>(&mut self, rpc: &mut RpcClient<T>) -> Result<Option<DirEntry>> {
        let next = self.advance(rpc);
        if next.is_err() {
            self.state = State::Done;
        }
        next
    }

    fn advance<T: Transport>(&mut self, rpc: &mut RpcClient<T>) -> Result<Option<DirEntry>> {
        loop {
            let (page, pos, yielded) = match &mut self.state {
                State::Done => return Ok(None),
                State::Start => {
                    self.fetch(rpc)?;
                    continue;
                }
                State::Paging { page, pos, yielded } => (page, pos, yielded),
            };

            let mut src = page.cursor_at(*pos);
            if !src.decode_bool()? {
                let eof = src.decode_bool()?;
                if eof {
                    trace!(cookie = self.cookie, "end of directory");
                    self.state = State::Done;
                    return Ok(None);
                }
                if *yielded == 0 {
                    return Err(Error::ProtocolViolation("READDIR page without entries or EOF"));
                }
                self.fetch(rpc)?;
                continue;
            }

            let entry = deserialize::<entry3>(&mut src)?;
            *pos = src.position();
            *yielded += 1;
            self.cookie = entry.cookie;
            trace!(name = %String::from_utf8_lossy(&entry.name), cookie = entry.cookie, "dirent");
            return Ok(Some(DirEntry { name: entry.name, cookie: entry.cookie }));
        }
    }

    fn fetch<T: Transport>(&mut self, rpc: &mut RpcClient<T>) -> Result<()> {
        let page = nfsproc3_readdir(rpc, &self.dir, self.cookie, &self.verifier)?;
        if self.cookie != 0 && page.verifier != self.verifier {
            debug!(cookie = self.cookie, "cookie verifier changed between pages");
        }
        self.verifier = page.verifier;
        let pos = page.start();
        self.state = State::Paging { page, pos, yielded: 0 };
        Ok(())
    }
}

/// Iterator over the entries of a directory.
///
/// Yields at most one error, after which it is exhausted.
pub struct ReadDir<'a, T: Transport> {
    rpc: &'a mut RpcClient<T>,
    cursor: DirCursor,
}

impl<'a, T: Transport> ReadDir<'a, T> {
    pub fn new(rpc: &'a mut RpcClient<T>, dir: nfs_fh3) -> Self {
        Self { rpc, cursor: DirCursor::new(dir) }
    }

    pub fn cursor(&self) -> &DirCursor {
        &self.cursor
    }
}

impl<T: Transport> std::fmt::Debug for ReadDir<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadDir").field("cursor", &self.cursor).finish()
    }
}

impl<T: Transport> Iterator for ReadDir<'_, T> {
    type Item = Result<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next_entry(self.rpc).transpose()
    }
}

impl<T: Transport> std::iter::FusedIterator for ReadDir<'_, T> {}

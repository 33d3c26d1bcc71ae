//! Client side of the `READDIR` procedure (procedure 16) for NFS version 3 protocol
//! as defined in RFC 1813 section 3.3.16.
//!
//! One call returns one page of directory entries. The caller resumes with
//! the cookie of the last entry it consumed and the cookie verifier of the
//! page, until the server reports EOF.
//!
//! The `dirlist3` part of the reply is kept undecoded in a [`ReaddirPage`];
//! entries are pulled from it one at a time.

use tracing::debug;

use super::decode_post_op_attr;
use crate::attr::Attrs;
use crate::error::{Error, Result};
use crate::protocol::rpc::{Program, RpcClient, Transport};
use crate::protocol::xdr::nfs3::dir::{READDIR3args, READDIR_COUNT};
use crate::protocol::xdr::nfs3::{cookie3, cookieverf3, nfs_fh3, NFSProgram};
use crate::protocol::xdr::XdrCursor;

/// One READDIR result, positioned at its `dirlist3`.
#[derive(Debug)]
pub struct ReaddirPage {
    /// Directory attributes, if the server sent them.
    pub dir_attributes: Option<Attrs>,
    /// Cookie verifier to send with the next request.
    pub verifier: cookieverf3,
    packet: Vec<u8>,
    offset: usize,
}

impl ReaddirPage {
    /// Cursor at the first `entry3` discriminant of the page.
    pub fn entries(&self) -> XdrCursor<'_> {
        XdrCursor::at(&self.packet, self.offset)
    }

    /// Packet offset of the first entry discriminant.
    pub fn start(&self) -> usize {
        self.offset
    }

    /// Cursor at an absolute packet offset previously taken from
    /// [`XdrCursor::position`] on this page.
    pub fn cursor_at(&self, pos: usize) -> XdrCursor<'_> {
        XdrCursor::at(&self.packet, pos.max(self.offset))
    }

    /// Size of the undecoded entry list.
    pub fn len(&self) -> usize {
        self.packet.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Calls `NFSPROC3_READDIR` with a directory count of 1024.
///
/// # Arguments
///
/// * `rpc` - Client with the NFS port configured
/// * `dir` - File handle of the directory
/// * `cookie` - 0 for the first page, otherwise the cookie of the last entry read
/// * `verifier` - zeroes for the first page, otherwise the previous page's verifier
pub fn nfsproc3_readdir<T: Transport>(
    rpc: &mut RpcClient<T>,
    dir: &nfs_fh3,
    cookie: cookie3,
    verifier: &cookieverf3,
) -> Result<ReaddirPage> {
    debug!("nfsproc3_readdir({:?},{})", dir, cookie);
    let reply = rpc.call_with(Program::Nfs, NFSProgram::NFSPROC3_READDIR as u32, |req| {
        let args = READDIR3args {
            dir: dir.clone(),
            cookie,
            cookieverf: *verifier,
            count: READDIR_COUNT,
        };
        req.add_credentials()?.add(&args)?;
        Ok(())
    })?;

    let mut src = reply.cursor();
    let dir_attributes = decode_post_op_attr(&mut src)?;
    let verifier = src.decode_fixed::<8>()?;
    if src.is_empty() {
        return Err(Error::ProtocolViolation("READDIR reply has no directory list"));
    }

    let offset = src.position();
    let (packet, _) = reply.into_parts();
    Ok(ReaddirPage { dir_attributes, verifier, packet, offset })
}

//! Client side of the `READ` procedure (procedure 6) for NFS version 3 protocol
//! as defined in RFC 1813 section 3.3.6.
//!
//! The client specifies the file handle, the offset in the file to start
//! reading, and the amount of data to read. The server answers with the
//! file attributes after the read, the bytes actually read, and an EOF flag.

use tracing::{debug, trace};

use super::decode_post_op_attr;
use crate::attr::Attrs;
use crate::error::{Error, Result};
use crate::protocol::rpc::{Program, RpcClient, Transport};
use crate::protocol::xdr::nfs3::file::READ3args;
use crate::protocol::xdr::nfs3::{count3, nfs_fh3, offset3, NFSProgram};

/// Outcome of one READ call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResult {
    /// Bytes returned by the server, at most the requested count.
    pub data: Vec<u8>,
    /// The server reached the end of the file.
    pub eof: bool,
    /// File attributes after the read, if the server sent them.
    pub attributes: Option<Attrs>,
}

/// Calls `NFSPROC3_READ`.
///
/// A reply carrying neither data nor EOF for a non-zero `count` would make
/// a reader loop forever and is rejected as a protocol violation.
///
/// # Arguments
///
/// * `rpc` - Client with the NFS port configured
/// * `file` - File handle of the file to read
/// * `offset` - Position within the file
/// * `count` - Maximum number of bytes wanted
pub fn nfsproc3_read<T: Transport>(
    rpc: &mut RpcClient<T>,
    file: &nfs_fh3,
    offset: offset3,
    count: count3,
) -> Result<ReadResult> {
    debug!("nfsproc3_read({:?},{},{})", file, offset, count);
    let reply = rpc.call_with(Program::Nfs, NFSProgram::NFSPROC3_READ as u32, |req| {
        req.add_credentials()?.add(&READ3args { file: file.clone(), offset, count })?;
        Ok(())
    })?;

    let mut src = reply.cursor();
    let attributes = decode_post_op_attr(&mut src)?;
    let rlen = src.decode_u32()?;
    let eof = src.decode_bool()?;
    let data = src.decode_opaque(count as usize)?;
    trace!(rlen, eof, len = data.len(), "read reply");

    if count > 0 && data.is_empty() && !eof {
        return Err(Error::ProtocolViolation("READ returned no data and no EOF"));
    }

    Ok(ReadResult { data: data.to_vec(), eof, attributes })
}

//! Client side of the `READLINK` procedure (procedure 5) for NFS version 3 protocol
//! as defined in RFC 1813 section 3.3.5.

use tracing::debug;

use super::decode_post_op_attr;
use crate::error::Result;
use crate::protocol::rpc::{Program, RpcClient, Transport};
use crate::protocol::xdr::nfs3::file::NFS3_MAXPATHLEN;
use crate::protocol::xdr::nfs3::{nfs_fh3, NFSProgram};

/// Calls `NFSPROC3_READLINK` and returns the link target.
///
/// A target longer than [`NFS3_MAXPATHLEN`], or one that runs past the end of
/// the packet, fails the call.
pub fn nfsproc3_readlink<T: Transport>(rpc: &mut RpcClient<T>, symlink: &nfs_fh3) -> Result<String> {
    debug!("nfsproc3_readlink({:?})", symlink);
    let reply = rpc.call_with(Program::Nfs, NFSProgram::NFSPROC3_READLINK as u32, |req| {
        req.add_credentials()?.add_file_handle(symlink)?;
        Ok(())
    })?;

    let mut src = reply.cursor();
    decode_post_op_attr(&mut src)?;
    let target = String::from_utf8_lossy(src.decode_opaque(NFS3_MAXPATHLEN)?).into_owned();
    debug!("\t--> {:?}", target);
    Ok(target)
}

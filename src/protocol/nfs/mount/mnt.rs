//! Client side of the MNT procedure (procedure 1) for MOUNT version 3 protocol
//! as defined in RFC 1813 Appendix I section I.4.2.
//!
//! MNT takes a directory path on the server and returns the file handle of
//! that directory along with the authentication flavors the server accepts
//! for it. The flavor list is not inspected: this client always sends
//! AUTH_UNIX.

use num_traits::cast::FromPrimitive;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::protocol::rpc::{Program, RpcClient, Transport};
use crate::protocol::xdr::mount::{mountstat3, MountProgram, MNTPATHLEN};
use crate::protocol::xdr::nfs3::nfs_fh3;
use crate::protocol::xdr::deserialize;

/// Calls MOUNTPROC3_MNT for `dirpath`.
///
/// # Arguments
///
/// * `rpc` - Client with the MOUNT port configured
/// * `dirpath` - Exported directory on the server
///
/// # Returns
///
/// * `Result<nfs_fh3>` - root file handle of the export
pub fn mountproc3_mnt<T: Transport>(rpc: &mut RpcClient<T>, dirpath: &str) -> Result<nfs_fh3> {
    debug!("mountproc3_mnt({:?})", dirpath);
    if dirpath.len() > MNTPATHLEN {
        return Err(Error::InvalidPath(dirpath.to_string()));
    }

    let proc = MountProgram::MOUNTPROC3_MNT as u32;
    let reply = rpc.call_with(Program::Mount, proc, |req| {
        req.add_credentials()?.add_opaque_name(dirpath.as_bytes())?;
        Ok(())
    })?;

    let mut src = reply.cursor();
    let stat = src.decode_u32()?;
    if stat != mountstat3::MNT3_OK as u32 {
        let err = match mountstat3::from_u32(stat) {
            Some(stat) => Error::Mount(stat),
            None => Error::MountUnknown(stat),
        };
        error!("mount of {:?} failed: {}", dirpath, err);
        return Err(err);
    }

    let root = deserialize::<nfs_fh3>(&mut src)?;
    debug!("\t{:?} --> {:?}", dirpath, root);
    Ok(root)
}

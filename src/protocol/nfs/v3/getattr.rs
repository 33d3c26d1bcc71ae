//! Client side of the `GETATTR` procedure (procedure 1) for NFS version 3 protocol
//! as defined in RFC 1813 section 3.3.1.
//!
//! `GETATTR` takes a file handle and returns the complete file attribute
//! structure defined in RFC 1813 section 2.3.5 (fattr3).

use tracing::debug;

use crate::attr::Attrs;
use crate::error::Result;
use crate::protocol::rpc::{Program, RpcClient, Transport};
use crate::protocol::xdr::nfs3::{fattr3, nfs_fh3, NFSProgram};
use crate::protocol::xdr::deserialize;

/// Calls `NFSPROC3_GETATTR` for `object`.
///
/// # Arguments
///
/// * `rpc` - Client with the NFS port configured
/// * `object` - File handle of the object to query
///
/// # Returns
///
/// * `Result<Attrs>` - the object's current attributes
pub fn nfsproc3_getattr<T: Transport>(rpc: &mut RpcClient<T>, object: &nfs_fh3) -> Result<Attrs> {
    debug!("nfsproc3_getattr({:?})", object);
    let reply = rpc.call_with(Program::Nfs, NFSProgram::NFSPROC3_GETATTR as u32, |req| {
        req.add_credentials()?.add_file_handle(object)?;
        Ok(())
    })?;

    let attr = deserialize::<fattr3>(&mut reply.cursor())?;
    Ok(attr.into())
}

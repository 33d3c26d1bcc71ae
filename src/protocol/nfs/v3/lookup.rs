//! Client side of the `LOOKUP` procedure (procedure 3) for NFS version 3 protocol
//! as defined in RFC 1813 section 3.3.3.
//!
//! `LOOKUP` searches a directory for a single name and returns the file
//! handle of the object found. Path walking is done by the caller, one
//! component at a time.

use tracing::debug;

use crate::attr::Attrs;
use crate::error::Result;
use crate::protocol::rpc::{Program, RpcClient, Transport};
use crate::protocol::xdr::deserialize;
use crate::protocol::xdr::nfs3::dir::LOOKUP3resok;
use crate::protocol::xdr::nfs3::{diropargs3, nfs_fh3, NFSProgram};

/// Calls `NFSPROC3_LOOKUP` for `name` in `dir`.
///
/// # Arguments
///
/// * `rpc` - Client with the NFS port configured
/// * `dir` - File handle of the directory to search
/// * `name` - A single path component
///
/// # Returns
///
/// * `Result<(nfs_fh3, Option<Attrs>)>` - handle of the object found and its
///   attributes when the server included them
pub fn nfsproc3_lookup<T: Transport>(
    rpc: &mut RpcClient<T>,
    dir: &nfs_fh3,
    name: &[u8],
) -> Result<(nfs_fh3, Option<Attrs>)> {
    debug!("nfsproc3_lookup({:?},{:?})", dir, String::from_utf8_lossy(name));
    let reply = rpc.call_with(Program::Nfs, NFSProgram::NFSPROC3_LOOKUP as u32, |req| {
        req.add_credentials()?.add(&diropargs3 { dir: dir.clone(), name: name.to_vec() })?;
        Ok(())
    })?;

    let resok = deserialize::<LOOKUP3resok>(&mut reply.cursor())?;
    debug!("\t--> {:?}", resok.object);
    Ok((resok.object, resok.obj_attributes.into_option().map(Attrs::from)))
}

//! Client side of the UMNT procedure (procedure 3) for MOUNT version 3 protocol
//! as defined in RFC 1813 Appendix I section I.4.3.
//!
//! UMNT removes the mount list entry for a directory. The reply carries no
//! data, and servers are free to forget mount entries anyway.

use tracing::debug;

use crate::error::Result;
use crate::protocol::rpc::{Program, RpcClient, Transport};
use crate::protocol::xdr::mount::MountProgram;

/// Calls MOUNTPROC3_UMNT for `dirpath`.
pub fn mountproc3_umnt<T: Transport>(rpc: &mut RpcClient<T>, dirpath: &str) -> Result<()> {
    debug!("mountproc3_umnt({:?})", dirpath);
    let proc = MountProgram::MOUNTPROC3_UMNT as u32;
    rpc.call_with(Program::Mount, proc, |req| {
        req.add_credentials()?.add_opaque_name(dirpath.as_bytes())?;
        Ok(())
    })?;
    Ok(())
}

//! Client side of the GETPORT procedure (procedure 3) of the port mapper protocol
//! as defined in RFC 1833 section 3.
//! https://datatracker.ietf.org/doc/rfc1833/

use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::rpc::{Program, RpcClient, Transport};
use crate::protocol::xdr::portmap::{self, mapping, PortmapProgram};

/// Calls PMAPPROC_GETPORT.
///
/// GETPORT maps an RPC program and version to the UDP port the server has
/// registered it on. The call is made with AUTH_NONE credentials.
///
/// # Arguments
///
/// * `rpc` - Client connected to the server's portmapper
/// * `prog` - RPC program number to look up
/// * `vers` - Version of that program
///
/// # Returns
///
/// * `Result<u16>` - the port, or [`Error::NoUdpPort`] when the program has
///   no UDP registration
pub fn pmapproc_getport<T: Transport>(rpc: &mut RpcClient<T>, prog: u32, vers: u32) -> Result<u16> {
    let query = mapping { prog, vers, prot: portmap::IPPROTO_UDP, port: 0 };
    debug!("pmapproc_getport({:?})", query);

    let proc = PortmapProgram::PMAPPROC_GETPORT as u32;
    let reply = rpc.call_with(Program::Portmap, proc, |req| {
        req.add_auth_none()?.add(&query)?;
        Ok(())
    })?;

    let port = reply.cursor().decode_u32()?;
    debug!("\t{:?} --> {:?}", prog, port);
    match port {
        0 => Err(Error::NoUdpPort { program: prog }),
        port => u16::try_from(port).map_err(|_| Error::ProtocolViolation("port number out of range")),
    }
}

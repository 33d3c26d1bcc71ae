//! Synchronous RPC transaction engine.
//!
//! [`RpcClient::call`] sends one call and waits for the reply carrying the
//! same xid, retransmitting the identical datagram every [`RPC_TIMEOUT`]
//! until [`MAX_ATTEMPTS`] transmissions have gone unanswered. Replies to
//! anything other than the outstanding call are dropped as they are found.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, trace, warn};

use super::clock::{Clock, MonotonicClock};
use super::packet_queue::{Packet, PacketQueue};
use super::transport::Transport;
use super::{Program, MAX_ATTEMPTS, RPC_TIMEOUT};
use crate::error::{Error, Result};
use crate::protocol::xdr::nfs3::nfsstat3;
use crate::protocol::xdr::rpc::{accept_body, call_header, msg_type, reply_body};
use crate::protocol::xdr::{deserialize, RequestBuf, Serialize, XdrCursor};

/// Size of the call header preceding the credential block.
const CALL_HEADER_LEN: usize = 24;

/// An accepted reply, positioned after the RPC envelope and, for NFS
/// replies, after the status word.
#[derive(Debug)]
pub struct Reply {
    packet: Packet,
    offset: usize,
}

impl Reply {
    /// The procedure result.
    pub fn payload(&self) -> &[u8] {
        &self.packet.data[self.offset..]
    }

    /// A cursor over [`Reply::payload`].
    pub fn cursor(&self) -> XdrCursor<'_> {
        XdrCursor::at(&self.packet.data, self.offset)
    }

    /// Gives up the datagram, keeping the payload offset.
    pub fn into_parts(self) -> (Vec<u8>, usize) {
        (self.packet.data, self.offset)
    }
}

/// RPC client for one server.
///
/// Owns the transport, the transaction id counter and the destination ports
/// for the MOUNT and NFS programs. At most one call is in flight at a time.
pub struct RpcClient<T: Transport> {
    transport: T,
    clock: Box<dyn Clock>,
    queue: PacketQueue,
    xid: u32,
    mount_port: u16,
    nfs_port: u16,
    scratch: RequestBuf,
    datagram: Vec<u8>,
}

impl<T: Transport> RpcClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_clock(transport, Box::new(MonotonicClock::new()))
    }

    pub fn with_clock(transport: T, clock: Box<dyn Clock>) -> Self {
        // xids must not repeat across reboots of the same client
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
            .unwrap_or(0);
        let scratch = RequestBuf::new();
        let datagram = Vec::with_capacity(CALL_HEADER_LEN + scratch.capacity());
        Self {
            transport,
            clock,
            queue: PacketQueue::new(),
            xid: seed,
            mount_port: 0,
            nfs_port: 0,
            scratch,
            datagram,
        }
    }

    /// Replaces the request scratch buffer with one of `words` 32-bit words.
    pub fn with_request_capacity(mut self, words: usize) -> Self {
        self.scratch = RequestBuf::with_capacity(words);
        self.datagram = Vec::with_capacity(CALL_HEADER_LEN + self.scratch.capacity());
        self
    }

    /// Overrides the next transaction id handed out, minus one.
    pub fn set_xid(&mut self, xid: u32) {
        self.xid = xid;
    }

    /// The transaction id of the most recent call.
    pub fn xid(&self) -> u32 {
        self.xid
    }

    pub fn set_mount_port(&mut self, port: u16) {
        self.mount_port = port;
    }

    pub fn set_nfs_port(&mut self, port: u16) {
        self.nfs_port = port;
    }

    pub fn mount_port(&self) -> u16 {
        self.mount_port
    }

    pub fn nfs_port(&self) -> u16 {
        self.nfs_port
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn port_for(&self, program: Program) -> Result<u16> {
        let port = match program {
            Program::Portmap => return Ok(crate::protocol::xdr::portmap::PORT),
            Program::Mount => self.mount_port,
            Program::Nfs => self.nfs_port,
        };
        if port == 0 {
            return Err(Error::NoUdpPort { program: program.number() });
        }
        Ok(port)
    }

    /// Encodes the arguments with `encode` into the client's scratch buffer
    /// and performs the call.
    pub fn call_with<F>(&mut self, program: Program, procedure: u32, encode: F) -> Result<Reply>
    where
        F: FnOnce(&mut RequestBuf) -> Result<()>,
    {
        let mut args = std::mem::replace(&mut self.scratch, RequestBuf::with_capacity(0));
        args.clear();
        let result = encode(&mut args).and_then(|()| self.call(program, procedure, &args));
        self.scratch = args;
        result
    }

    /// Performs one RPC call.
    ///
    /// `args` holds everything after the call header: the credential block
    /// followed by the procedure arguments.
    pub fn call(&mut self, program: Program, procedure: u32, args: &RequestBuf) -> Result<Reply> {
        let port = self.port_for(program)?;

        self.xid = self.xid.wrapping_add(1);
        let xid = self.xid;
        let header = call_header::new(xid, program.number(), program.version(), procedure);

        self.datagram.clear();
        header.serialize(&mut self.datagram).map_err(Error::Encode)?;
        self.datagram.extend_from_slice(args.as_bytes());

        debug!(xid, prog = program.number(), proc = procedure, port, "rpc call");

        let mut attempts = 0;
        loop {
            attempts += 1;
            if let Err(err) = self.transport.send(port, &self.datagram) {
                warn!(xid, attempts, %err, "send failed");
            }
            let start = self.clock.now();

            loop {
                self.transport.poll(&mut self.queue).map_err(Error::Transport)?;
                while let Some(packet) = self.queue.pop() {
                    if let Some(offset) = check_reply(&packet.data, xid, program)? {
                        trace!(xid, len = packet.data.len(), "rpc reply");
                        return Ok(Reply { packet, offset });
                    }
                }
                if self.clock.now().saturating_sub(start) >= RPC_TIMEOUT {
                    break;
                }
            }

            if attempts >= MAX_ATTEMPTS {
                warn!(xid, attempts, "rpc call timed out");
                return Err(Error::Timeout { attempts });
            }
            warn!(xid, attempts, "no reply, retransmitting");
        }
    }
}

/// Validates a received datagram against the outstanding call.
///
/// Returns `Ok(None)` for packets that belong to some other exchange, and the
/// offset of the procedure result for the matching reply.
fn check_reply(data: &[u8], xid: u32, program: Program) -> Result<Option<usize>> {
    let mut src = XdrCursor::new(data);
    let (Ok(rxid), Ok(mtype)) = (src.decode_u32(), src.decode_u32()) else {
        trace!(len = data.len(), "discarding short packet");
        return Ok(None);
    };
    if rxid != xid {
        trace!(rxid, xid, "discarding reply with stale xid");
        return Ok(None);
    }
    if mtype != msg_type::REPLY as u32 {
        trace!(rxid, mtype, "discarding non-reply message");
        return Ok(None);
    }

    match deserialize::<reply_body>(&mut src)? {
        reply_body::MSG_DENIED(reason) => return Err(Error::RpcDenied(reason.stat())),
        reply_body::MSG_ACCEPTED(reply) => {
            if reply.reply_data != accept_body::SUCCESS {
                return Err(Error::RpcRejected { stat: reply.reply_data.stat() });
            }
        }
    }

    if program == Program::Nfs {
        let stat = src.decode_u32()?;
        if stat != nfsstat3::NFS3_OK as u32 {
            debug!(xid, stat, "nfs error status");
            return Err(nfs_status_error(stat));
        }
    }

    Ok(Some(src.position()))
}

fn nfs_status_error(stat: u32) -> Error {
    match num_traits::FromPrimitive::from_u32(stat) {
        Some(stat) => Error::Nfs(stat),
        None => Error::NfsUnknown(stat),
    }
}

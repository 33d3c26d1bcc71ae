//! RPC (Remote Procedure Call) protocol implementation as specified in RFC 5531 (previously RFC 1057).
//!
//! The RPC protocol enables programs to call procedures on remote systems as if
//! they were local calls. It forms the foundation for all NFS operations by
//! providing a standard mechanism for client-server communication.
//!
//! This module implements the client side of RPC version 2 over UDP:
//!
//! 1. Call envelopes with AUTH_UNIX credentials
//! 2. Reply matching by transaction id
//! 3. Retransmission on timeout with a bounded number of attempts
//! 4. Validation of reply, accept and NFS status words
//!
//! Everything is synchronous. A call polls the transport until its reply
//! arrives or the retry budget is spent.

use std::time::Duration;

mod client;
mod clock;
mod packet_queue;
mod transport;

pub use client::{Reply, RpcClient};
pub use clock::{Clock, MonotonicClock};
pub use packet_queue::{Packet, PacketQueue};
pub use transport::{Transport, UdpTransport, DEFAULT_SOURCE_PORT, POLL_INTERVAL};

use super::xdr::{mount, nfs3, portmap};

/// Time to wait for a reply before retransmitting.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(2);

/// Total transmissions of one call, the first one included.
pub const MAX_ATTEMPTS: u32 = 5;

/// The RPC programs this client talks to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Program {
    Portmap,
    Mount,
    Nfs,
}

impl Program {
    pub fn number(self) -> u32 {
        match self {
            Program::Portmap => portmap::PROGRAM,
            Program::Mount => mount::PROGRAM,
            Program::Nfs => nfs3::PROGRAM,
        }
    }

    pub fn version(self) -> u32 {
        match self {
            Program::Portmap => portmap::VERSION,
            Program::Mount => mount::VERSION,
            Program::Nfs => nfs3::VERSION,
        }
    }
}

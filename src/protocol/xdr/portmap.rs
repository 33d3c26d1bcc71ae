//! This module implements the Portmap protocol (RFC 1833, previously RFC 1057 Appendix A) data structures
//! for XDR serialization and deserialization.
//!
//! Portmap (also known as Portmapper) is a service that maps RPC program numbers
//! to network port numbers. Clients use the Portmapper to locate the port number
//! for a specific RPC service they wish to use.

// Keep original RFC naming conventions for consistency with the RFC
#![allow(non_camel_case_types)]

use num_derive::{FromPrimitive, ToPrimitive};

use super::*;

/// Represents a mapping between an RPC program and a network port.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct mapping {
    /// The RPC program number
    pub prog: u32,
    /// The RPC program version number
    pub vers: u32,
    /// The transport protocol, [`IPPROTO_UDP`] for this client
    pub prot: u32,
    /// The port number where the service is listening
    pub port: u32,
}
DeserializeStruct!(mapping, prog, vers, prot, port);
SerializeStruct!(mapping, prog, vers, prot, port);

/// Protocol number for UDP/IP
pub const IPPROTO_UDP: u32 = 17;
/// Portmap RPC program number
pub const PROGRAM: u32 = 100000;
/// Portmap RPC version number
pub const VERSION: u32 = 2;
/// Well-known port of the portmapper
pub const PORT: u16 = 111;

/// Procedure numbers for the Portmap RPC service used by this client.
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum PortmapProgram {
    /// Look up the port for a program
    PMAPPROC_GETPORT = 3,
}

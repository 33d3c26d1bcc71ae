//! Protocol module implements the client side of the NFS version 3 protocol suite.
//!
//! This module contains three main components:
//!
//! - `xdr`: External Data Representation (XDR) for serialization of requests and
//!   bounds-checked decoding of replies according to RFC 4506.
//!
//! - `rpc`: Remote Procedure Call (RPC) client for sending calls over UDP, matching
//!   replies by transaction id, and retransmitting lost requests, as defined in RFC 5531.
//!
//! - `nfs`: The procedures this client calls: NFSv3 (RFC 1813), the MOUNT protocol
//!   (RFC 1813 Appendix I), and the PORTMAP protocol (RFC 1833).
//!
//! NFS is stateless: every object is named by an opaque file handle issued by the
//! server, and a client only has to remember handles and directory cookies between
//! calls.

pub mod nfs;
pub mod rpc;
pub mod xdr;

//! PORTMAP protocol client as specified in RFC 1833.
//! https://datatracker.ietf.org/doc/html/rfc1833
//!
//! Only GETPORT is needed: it tells the client where the MOUNT and NFS
//! programs listen when no port was configured explicitly.

mod get_port;

pub use get_port::pmapproc_getport;

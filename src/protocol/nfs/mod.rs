//! Client implementations of the NFS, MOUNT and PORTMAP programs.
//!
//! - `v3`: the NFS version 3 procedures a read-only client needs (RFC 1813):
//!   GETATTR, LOOKUP, READ, READLINK and READDIR.
//!
//! - `mount`: MNT and UMNT of the MOUNT protocol, which hand out and release
//!   the root file handle of an export.
//!
//! - `portmap`: GETPORT, used to find the MOUNT and NFS ports on the server.
//!
//! Each procedure lives in its own module, takes the [`RpcClient`] by mutable
//! reference, encodes its arguments, and decodes its result straight from the
//! reply packet.
//!
//! [`RpcClient`]: crate::protocol::rpc::RpcClient

pub mod mount;
pub mod portmap;
pub mod v3;

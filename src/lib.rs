//! nfs-boot - a read-only NFS version 3 client for boot-time environments
//!
//! This library mounts an NFS export over UDP and reads files, directories
//! and symbolic links from it, using nothing but a datagram socket. It is
//! meant for code running before a full operating system is up: boot
//! loaders, recovery images, provisioning tools.
//!
//! ## Supported Features
//!
//! - PORTMAP GETPORT for locating the MOUNT and NFS programs
//! - MOUNT version 3 MNT and UMNT
//! - NFSv3 GETATTR, LOOKUP, READLINK, READ and READDIR
//! - Synchronous RPC over UDP with transaction id matching and retransmission
//! - Path resolution with symbolic link following
//! - `std::io::Read` and `std::io::Seek` over remote files
//!
//! ## Main Components
//!
//! - [`NfsMount`]: a mounted export, the usual entry point.
//!
//! - [`NfsFile`] and [`ReadDir`]: streaming access to file contents and
//!   directory entries.
//!
//! - `protocol`: the RPC engine, the per-procedure clients, and XDR
//!   (External Data Representation) encoding and decoding.
//!
//! ## Standards Compliance
//!
//! This implementation follows these RFCs:
//! - RFC 1813: NFS Version 3 Protocol Specification
//! - RFC 5531: RPC: Remote Procedure Call Protocol Specification Version 2 (obsoletes RFC 1831)
//! - RFC 4506: XDR: External Data Representation Standard (obsoletes RFC 1832)
//! - RFC 1833: Binding Protocols for ONC RPC Version 2
//!
//! ## Usage
//!
//! ```no_run
//! use std::io::Read;
//!
//! let options = nfs_boot::MountOptions::default();
//! let mut mount = nfs_boot::NfsMount::mount_source("192.168.0.1:/srv/boot", options)?;
//! let mut kernel = Vec::new();
//! mount.open("/vmlinuz")?.read_to_end(&mut kernel)?;
//! mount.unmount()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod attr;
pub mod dir;
pub mod error;
pub mod file;
pub mod mount;
pub mod options;
pub mod protocol;

pub use attr::{Attrs, FileType, Permissions};
pub use dir::{DirCursor, DirEntry, ReadDir};
pub use error::{Error, Result};
pub use file::NfsFile;
pub use mount::NfsMount;
pub use options::{MountOptions, MountSource};
pub use protocol::rpc::{RpcClient, Transport, UdpTransport};
pub use protocol::xdr;
pub use protocol::xdr::nfs3::nfs_fh3 as FileHandle;

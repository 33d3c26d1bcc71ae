//! This module implements the `MOUNT` protocol (RFC 1813 Appendix I) data structures
//! for XDR serialization and deserialization.
//!
//! The `MOUNT` protocol is used to establish the initial connection between an NFS client
//! and server. It provides functions for mounting and unmounting file systems, and
//! obtaining the initial file handle that serves as the root of the mounted file system.

// Keep original RFC naming conventions for consistency with the RFC
#![allow(non_camel_case_types)]

use std::fmt;
use std::io;

use num_derive::{FromPrimitive, ToPrimitive};

use super::{DeserializeEnum, SerializeEnum};

/// MOUNT program number for RPC
pub const PROGRAM: u32 = 100005;
/// MOUNT protocol version 3
pub const VERSION: u32 = 3;

/// Maximum bytes in a path name
pub const MNTPATHLEN: usize = 1024;

/// Status codes returned by `MOUNT` protocol operations
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum mountstat3 {
    /// No error
    #[default]
    MNT3_OK = 0,
    /// Not owner
    MNT3ERR_PERM = 1,
    /// No such file or directory
    MNT3ERR_NOENT = 2,
    /// I/O error
    MNT3ERR_IO = 5,
    /// Permission denied
    MNT3ERR_ACCES = 13,
    /// Not a directory
    MNT3ERR_NOTDIR = 20,
    /// Invalid argument
    MNT3ERR_INVAL = 22,
    /// Filename too long
    MNT3ERR_NAMETOOLONG = 63,
    /// Operation not supported
    MNT3ERR_NOTSUPP = 10004,
    /// A failure on the server
    MNT3ERR_SERVERFAULT = 10006,
}
impl SerializeEnum for mountstat3 {}
impl DeserializeEnum for mountstat3 {}

impl mountstat3 {
    pub fn io_kind(self) -> io::ErrorKind {
        match self {
            mountstat3::MNT3ERR_PERM | mountstat3::MNT3ERR_ACCES => io::ErrorKind::PermissionDenied,
            mountstat3::MNT3ERR_NOENT => io::ErrorKind::NotFound,
            mountstat3::MNT3ERR_NOTDIR => io::ErrorKind::NotADirectory,
            mountstat3::MNT3ERR_INVAL | mountstat3::MNT3ERR_NAMETOOLONG => {
                io::ErrorKind::InvalidInput
            }
            mountstat3::MNT3ERR_NOTSUPP => io::ErrorKind::Unsupported,
            mountstat3::MNT3_OK | mountstat3::MNT3ERR_IO | mountstat3::MNT3ERR_SERVERFAULT => {
                io::ErrorKind::Other
            }
        }
    }
}

impl fmt::Display for mountstat3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            mountstat3::MNT3_OK => "success",
            mountstat3::MNT3ERR_PERM => "not owner",
            mountstat3::MNT3ERR_NOENT => "no such file or directory",
            mountstat3::MNT3ERR_IO => "I/O error",
            mountstat3::MNT3ERR_ACCES => "permission denied",
            mountstat3::MNT3ERR_NOTDIR => "not a directory",
            mountstat3::MNT3ERR_INVAL => "invalid argument",
            mountstat3::MNT3ERR_NAMETOOLONG => "filename too long",
            mountstat3::MNT3ERR_NOTSUPP => "operation not supported",
            mountstat3::MNT3ERR_SERVERFAULT => "server fault",
        };
        f.write_str(msg)
    }
}

/// Procedure numbers for the `MOUNT` version 3 protocol used by this client
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum MountProgram {
    /// Mount a file system
    MOUNTPROC3_MNT = 1,
    /// Unmount a file system
    MOUNTPROC3_UMNT = 3,
}

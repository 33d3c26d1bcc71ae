//! Module contains XDR data structures related to file operations for NFS version 3 protocol
//! as defined in RFC 1813.
//!
//! This module includes data structures for the following operations:
//! - READ: Read data from a file (procedure 6)
//! - READLINK: Read the target of a symbolic link (procedure 5)

// Preserve original RFC naming conventions (e.g. READ3args, READ3resok)
// for consistency with RFC 1813
#![allow(non_camel_case_types)]

use super::*;

/// Largest READ this client issues.
pub const READ_CHUNK: count3 = 1024;

/// Longest symbolic link target accepted from a server.
pub const NFS3_MAXPATHLEN: usize = 4096;

/// Arguments for the READ procedure (procedure 6) as defined in RFC 1813 section 3.3.6
/// Used to read data from a regular file
#[derive(Clone, Debug, Default)]
pub struct READ3args {
    /// File handle for the file to be read
    pub file: nfs_fh3,
    /// Position within the file to begin reading
    pub offset: offset3,
    /// Number of bytes of data to read
    pub count: count3,
}
DeserializeStruct!(READ3args, file, offset, count);
SerializeStruct!(READ3args, file, offset, count);

/// Successful response for the READ procedure as defined in RFC 1813 section 3.3.6
///
/// Only encoded here. The client decodes READ replies field by field so that
/// `data` is bounded by the requested count.
#[derive(Clone, Debug, Default)]
pub struct READ3resok {
    /// File attributes after the operation
    pub file_attributes: post_op_attr,
    /// Number of bytes actually read
    pub count: count3,
    /// True if the end of file was reached
    pub eof: bool,
    /// The data read from the file
    pub data: Vec<u8>,
}
SerializeStruct!(READ3resok, file_attributes, count, eof, data);

/// Successful response for the READLINK procedure as defined in RFC 1813 section 3.3.5
///
/// Only encoded here; the client bounds `data` by [`NFS3_MAXPATHLEN`].
#[derive(Clone, Debug, Default)]
pub struct READLINK3resok {
    /// Attributes of the symbolic link
    pub symlink_attributes: post_op_attr,
    /// The data associated with the symbolic link
    pub data: Vec<u8>,
}
SerializeStruct!(READLINK3resok, symlink_attributes, data);

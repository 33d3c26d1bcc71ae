//! Module contains XDR data structures related to directories for NFS version 3 protocol
//! as defined in RFC 1813.
//!
//! This module includes data structures for the following directory operations:
//! - LOOKUP: Look up a name in a directory (procedure 3)
//! - READDIR: Read entries from a directory (procedure 16)
//!
//! A READDIR reply is not decoded into a list up front. The caller walks the
//! `entry3` chain one element at a time straight out of the received packet.

// Preserve original RFC naming conventions for consistency with the RFC
#![allow(non_camel_case_types)]

use super::*;

/// Directory `count` sent with every READDIR call.
pub const READDIR_COUNT: count3 = 1024;

/// Successful response for the LOOKUP procedure as defined in RFC 1813 section 3.3.3
#[derive(Clone, Debug, Default)]
pub struct LOOKUP3resok {
    /// File handle of the object found
    pub object: nfs_fh3,
    /// Attributes of the object found
    pub obj_attributes: post_op_attr,
    /// Attributes of the directory searched
    pub dir_attributes: post_op_attr,
}
DeserializeStruct!(LOOKUP3resok, object, obj_attributes, dir_attributes);
SerializeStruct!(LOOKUP3resok, object, obj_attributes, dir_attributes);

/// Directory entry returned by READDIR operation
/// as defined in RFC 1813 section 3.3.16
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct entry3 {
    /// File identifier (inode number)
    pub fileid: fileid3,
    /// Name of the directory entry
    pub name: Vec<u8>,
    /// Cookie for the next READDIR operation
    pub cookie: cookie3,
}
SerializeStruct!(entry3, fileid, name, cookie);

impl Deserialize for entry3 {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        self.fileid = src.decode_u64()?;
        self.name = src.decode_name()?.to_vec();
        self.cookie = src.decode_u64()?;
        Ok(())
    }
}

/// Arguments for the READDIR procedure (procedure 16)
/// as defined in RFC 1813 section 3.3.16
/// Used to read entries from a directory. The server returns a variable number of directory entries,
/// up to the specified count limit.
#[derive(Clone, Debug, Default)]
pub struct READDIR3args {
    /// File handle for the directory to be read
    pub dir: nfs_fh3,
    /// Cookie indicating where to start reading directory entries
    /// A cookie value of 0 means start at beginning of directory
    pub cookie: cookie3,
    /// Cookie verifier to detect whether directory has changed
    pub cookieverf: cookieverf3,
    /// Maximum number of bytes of directory information to return
    pub count: count3,
}
DeserializeStruct!(READDIR3args, dir, cookie, cookieverf, count);
SerializeStruct!(READDIR3args, dir, cookie, cookieverf, count);

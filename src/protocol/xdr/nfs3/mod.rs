//! The module defines XDR data types and constants for Network File System (NFS)
//! version 3, as defined in RFC 1813.
//!
//! Only the subset a read-only client needs is modelled: file handles,
//! attributes, the status codes, and the argument and result shapes of
//! GETATTR, LOOKUP, READ, READLINK and READDIR.

// Preserve original RFC naming conventions for consistency with the RFC
#![allow(non_camel_case_types)]

use std::fmt;
use std::io::{self, Write};

use num_derive::{FromPrimitive, ToPrimitive};
use smallvec::SmallVec;

use super::{deserialize, Deserialize, DecodeError, DeserializeEnum, Serialize, SerializeEnum, XdrCursor};
use crate::{DeserializeStruct, SerializeStruct};

pub mod dir;
pub mod file;

// Section 2.2 Constants
/// The RPC program number for NFS version 3 service.
pub const PROGRAM: u32 = 100003;
/// The version number for NFS version 3 protocol.
pub const VERSION: u32 = 3;

// Section 2.4 Sizes
//
/// The maximum size in bytes of the opaque file handle.
pub const NFS3_FHSIZE: usize = 64;

/// The size in bytes of the opaque cookie verifier passed by READDIR.
pub const NFS3_COOKIEVERFSIZE: usize = 8;

/// Procedure numbers for NFS version 3 protocol used by this client.
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum NFSProgram {
    /// Get file attributes
    NFSPROC3_GETATTR = 1,
    /// Look up filename
    NFSPROC3_LOOKUP = 3,
    /// Read from symbolic link
    NFSPROC3_READLINK = 5,
    /// Read from file
    NFSPROC3_READ = 6,
    /// Read directory
    NFSPROC3_READDIR = 16,
}

/// File identifier, unique within a filesystem
pub type fileid3 = u64;
/// Directory entry position cookie used by READDIR
pub type cookie3 = u64;
/// Cookie verifier for directory operations, used to detect when a directory
/// being read has changed
pub type cookieverf3 = [u8; NFS3_COOKIEVERFSIZE];
/// User ID
pub type uid3 = u32;
/// Group ID
pub type gid3 = u32;
/// File size in bytes
pub type size3 = u64;
/// File offset in bytes
pub type offset3 = u64;
/// File mode bits
pub type mode3 = u32;
/// Count of bytes or entries
pub type count3 = u32;

/// Status codes returned by NFS version 3 operations
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum nfsstat3 {
    /// Indicates the call completed successfully.
    #[default]
    NFS3_OK = 0,
    /// Not owner. The operation was not allowed because the
    /// caller is either not a privileged user (root) or not the
    /// owner of the target of the operation.
    NFS3ERR_PERM = 1,
    /// No such file or directory.
    NFS3ERR_NOENT = 2,
    /// I/O error. A hard error occurred while processing the operation.
    NFS3ERR_IO = 5,
    /// I/O error. No such device or address.
    NFS3ERR_NXIO = 6,
    /// Permission denied.
    NFS3ERR_ACCES = 13,
    /// File exists.
    NFS3ERR_EXIST = 17,
    /// Attempt to do a cross-device hard link.
    NFS3ERR_XDEV = 18,
    /// No such device.
    NFS3ERR_NODEV = 19,
    /// Not a directory.
    NFS3ERR_NOTDIR = 20,
    /// Is a directory.
    NFS3ERR_ISDIR = 21,
    /// Invalid argument or unsupported argument for an operation, such as
    /// READLINK on an object other than a symbolic link.
    NFS3ERR_INVAL = 22,
    /// File too large.
    NFS3ERR_FBIG = 27,
    /// No space left on device.
    NFS3ERR_NOSPC = 28,
    /// Read-only file system.
    NFS3ERR_ROFS = 30,
    /// Too many hard links.
    NFS3ERR_MLINK = 31,
    /// The filename in an operation was too long.
    NFS3ERR_NAMETOOLONG = 63,
    /// An attempt was made to remove a directory that was not empty.
    NFS3ERR_NOTEMPTY = 66,
    /// Resource (quota) hard limit exceeded.
    NFS3ERR_DQUOT = 69,
    /// Invalid file handle. The file referred to by that file handle no
    /// longer exists or access to it has been revoked.
    NFS3ERR_STALE = 70,
    /// Too many levels of remote in path.
    NFS3ERR_REMOTE = 71,
    /// Illegal NFS file handle.
    NFS3ERR_BADHANDLE = 10001,
    /// Update synchronization mismatch was detected during a SETATTR operation.
    NFS3ERR_NOT_SYNC = 10002,
    /// READDIR cookie is stale
    NFS3ERR_BAD_COOKIE = 10003,
    /// Operation is not supported.
    NFS3ERR_NOTSUPP = 10004,
    /// Buffer or request is too small.
    NFS3ERR_TOOSMALL = 10005,
    /// An error occurred on the server which does not map to any
    /// of the legal NFS version 3 protocol error values.
    NFS3ERR_SERVERFAULT = 10006,
    /// An attempt was made to create an object of a type not
    /// supported by the server.
    NFS3ERR_BADTYPE = 10007,
    /// The server initiated the request, but was not able to
    /// complete it in a timely fashion.
    NFS3ERR_JUKEBOX = 10008,
}
impl SerializeEnum for nfsstat3 {}
impl DeserializeEnum for nfsstat3 {}

impl nfsstat3 {
    /// The closest portable I/O error kind, following the usual errno mapping
    /// of NFS status codes.
    pub fn io_kind(self) -> io::ErrorKind {
        use io::ErrorKind;
        match self {
            nfsstat3::NFS3_OK => ErrorKind::Other,
            nfsstat3::NFS3ERR_PERM | nfsstat3::NFS3ERR_ACCES => ErrorKind::PermissionDenied,
            nfsstat3::NFS3ERR_NOENT | nfsstat3::NFS3ERR_NXIO | nfsstat3::NFS3ERR_NODEV => {
                ErrorKind::NotFound
            }
            nfsstat3::NFS3ERR_EXIST => ErrorKind::AlreadyExists,
            nfsstat3::NFS3ERR_NOTDIR => ErrorKind::NotADirectory,
            nfsstat3::NFS3ERR_ISDIR => ErrorKind::IsADirectory,
            nfsstat3::NFS3ERR_FBIG => ErrorKind::FileTooLarge,
            nfsstat3::NFS3ERR_NOSPC | nfsstat3::NFS3ERR_DQUOT => ErrorKind::StorageFull,
            nfsstat3::NFS3ERR_ROFS => ErrorKind::ReadOnlyFilesystem,
            nfsstat3::NFS3ERR_MLINK => ErrorKind::TooManyLinks,
            nfsstat3::NFS3ERR_NOTEMPTY => ErrorKind::DirectoryNotEmpty,
            nfsstat3::NFS3ERR_STALE => ErrorKind::StaleNetworkFileHandle,
            nfsstat3::NFS3ERR_NOTSUPP => ErrorKind::Unsupported,
            nfsstat3::NFS3ERR_IO | nfsstat3::NFS3ERR_XDEV | nfsstat3::NFS3ERR_REMOTE => {
                ErrorKind::Other
            }
            nfsstat3::NFS3ERR_INVAL
            | nfsstat3::NFS3ERR_NAMETOOLONG
            | nfsstat3::NFS3ERR_BADHANDLE
            | nfsstat3::NFS3ERR_NOT_SYNC
            | nfsstat3::NFS3ERR_BAD_COOKIE
            | nfsstat3::NFS3ERR_TOOSMALL
            | nfsstat3::NFS3ERR_SERVERFAULT
            | nfsstat3::NFS3ERR_BADTYPE
            | nfsstat3::NFS3ERR_JUKEBOX => ErrorKind::InvalidInput,
        }
    }
}

impl fmt::Display for nfsstat3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            nfsstat3::NFS3_OK => "success",
            nfsstat3::NFS3ERR_PERM => "operation not permitted",
            nfsstat3::NFS3ERR_NOENT => "no such file or directory",
            nfsstat3::NFS3ERR_IO => "I/O error",
            nfsstat3::NFS3ERR_NXIO => "no such device or address",
            nfsstat3::NFS3ERR_ACCES => "permission denied",
            nfsstat3::NFS3ERR_EXIST => "file exists",
            nfsstat3::NFS3ERR_XDEV => "cross-device link",
            nfsstat3::NFS3ERR_NODEV => "no such device",
            nfsstat3::NFS3ERR_NOTDIR => "not a directory",
            nfsstat3::NFS3ERR_ISDIR => "is a directory",
            nfsstat3::NFS3ERR_INVAL => "invalid argument",
            nfsstat3::NFS3ERR_FBIG => "file too large",
            nfsstat3::NFS3ERR_NOSPC => "no space left on device",
            nfsstat3::NFS3ERR_ROFS => "read-only file system",
            nfsstat3::NFS3ERR_MLINK => "too many links",
            nfsstat3::NFS3ERR_NAMETOOLONG => "file name too long",
            nfsstat3::NFS3ERR_NOTEMPTY => "directory not empty",
            nfsstat3::NFS3ERR_DQUOT => "disk quota exceeded",
            nfsstat3::NFS3ERR_STALE => "stale file handle",
            nfsstat3::NFS3ERR_REMOTE => "object is remote",
            nfsstat3::NFS3ERR_BADHANDLE => "NFS3ERR_BADHANDLE",
            nfsstat3::NFS3ERR_NOT_SYNC => "NFS3ERR_NOT_SYNC",
            nfsstat3::NFS3ERR_BAD_COOKIE => "NFS3ERR_BAD_COOKIE",
            nfsstat3::NFS3ERR_NOTSUPP => "operation not supported",
            nfsstat3::NFS3ERR_TOOSMALL => "NFS3ERR_TOOSMALL",
            nfsstat3::NFS3ERR_SERVERFAULT => "NFS3ERR_SERVERFAULT",
            nfsstat3::NFS3ERR_BADTYPE => "NFS3ERR_BADTYPE",
            nfsstat3::NFS3ERR_JUKEBOX => "NFS3ERR_JUKEBOX",
        };
        f.write_str(msg)
    }
}

/// File type enumeration as defined in RFC 1813 section 2.3.5
/// Determines the type of a file system object
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum ftype3 {
    /// Regular File
    #[default]
    NF3REG = 1,
    /// Directory
    NF3DIR = 2,
    /// Block Special Device
    NF3BLK = 3,
    /// Character Special Device
    NF3CHR = 4,
    /// Symbolic Link
    NF3LNK = 5,
    /// Socket
    NF3SOCK = 6,
    /// Named Pipe
    NF3FIFO = 7,
}
impl SerializeEnum for ftype3 {}
impl DeserializeEnum for ftype3 {}

/// Special device information for character and block special devices
/// Contains the major and minor device numbers
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct specdata3 {
    /// Major device number
    pub specdata1: u32,
    /// Minor device number
    pub specdata2: u32,
}
DeserializeStruct!(specdata3, specdata1, specdata2);
SerializeStruct!(specdata3, specdata1, specdata2);

/// The NFS version 3 file handle.
///
/// The server is responsible for the internal format and interpretation of
/// the handle; the client only stores and echoes it. Handles never exceed
/// [`NFS3_FHSIZE`] bytes and are kept inline.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct nfs_fh3 {
    data: SmallVec<[u8; NFS3_FHSIZE]>,
}

impl nfs_fh3 {
    /// Copies `data` into a new handle, rejecting anything longer than
    /// [`NFS3_FHSIZE`].
    pub fn new(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() > NFS3_FHSIZE {
            return Err(DecodeError::HandleTooBig { len: data.len() });
        }
        Ok(Self { data: SmallVec::from_slice(data) })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for nfs_fh3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nfs_fh3(")?;
        for b in self.data.iter() {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

impl Serialize for nfs_fh3 {
    fn serialize<W: Write>(&self, dest: &mut W) -> io::Result<()> {
        self.data.as_slice().serialize(dest)
    }
}

impl Deserialize for nfs_fh3 {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        let len = src.decode_u32()? as usize;
        if len > NFS3_FHSIZE {
            return Err(DecodeError::HandleTooBig { len });
        }
        self.data = SmallVec::from_slice(src.decode(len)?);
        Ok(())
    }
}

/// NFS version 3 time structure
/// Used for file timestamps (access, modify, change)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct nfstime3 {
    /// Seconds since Unix epoch (January 1, 1970)
    pub seconds: u32,
    /// Nanoseconds (0-999999999)
    pub nseconds: u32,
}
DeserializeStruct!(nfstime3, seconds, nseconds);
SerializeStruct!(nfstime3, seconds, nseconds);

impl From<nfstime3> for filetime::FileTime {
    fn from(time: nfstime3) -> Self {
        filetime::FileTime::from_unix_time(time.seconds as i64, time.nseconds)
    }
}

/// File attributes in NFS version 3 as defined in RFC 1813 section 2.3.5.
///
/// 21 words on the wire.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct fattr3 {
    /// Type of the file (regular, directory, etc.)
    pub ftype: ftype3,
    /// Protection mode bits
    pub mode: mode3,
    /// Number of hard links to the file
    pub nlink: u32,
    /// User ID of the file owner
    pub uid: uid3,
    /// Group ID of the file's group
    pub gid: gid3,
    /// Size of the file in bytes
    pub size: size3,
    /// Disk space used by the file in bytes
    pub used: size3,
    /// Device ID information for special files
    pub rdev: specdata3,
    /// File system identifier
    pub fsid: u64,
    /// File identifier, unique within the file system
    pub fileid: fileid3,
    /// Time of last access
    pub atime: nfstime3,
    /// Time of last modification
    pub mtime: nfstime3,
    /// Time of last status change
    pub ctime: nfstime3,
}
DeserializeStruct!(
    fattr3, ftype, mode, nlink, uid, gid, size, used, rdev, fsid, fileid, atime, mtime, ctime
);
SerializeStruct!(
    fattr3, ftype, mode, nlink, uid, gid, size, used, rdev, fsid, fileid, atime, mtime, ctime
);

/// Optional attributes returned after an operation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum post_op_attr {
    #[default]
    Void,
    attributes(fattr3),
}

impl post_op_attr {
    pub fn into_option(self) -> Option<fattr3> {
        match self {
            post_op_attr::Void => None,
            post_op_attr::attributes(attr) => Some(attr),
        }
    }
}

impl From<Option<fattr3>> for post_op_attr {
    fn from(attr: Option<fattr3>) -> Self {
        attr.map_or(post_op_attr::Void, post_op_attr::attributes)
    }
}

impl Serialize for post_op_attr {
    fn serialize<W: Write>(&self, dest: &mut W) -> io::Result<()> {
        match self {
            post_op_attr::Void => false.serialize(dest),
            post_op_attr::attributes(attr) => {
                true.serialize(dest)?;
                attr.serialize(dest)
            }
        }
    }
}

impl Deserialize for post_op_attr {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        *self = match src.decode_bool()? {
            true => post_op_attr::attributes(deserialize(src)?),
            false => post_op_attr::Void,
        };
        Ok(())
    }
}

/// Arguments for operations taking a directory handle and a name.
#[derive(Clone, Debug, Default)]
pub struct diropargs3 {
    /// File handle for the directory
    pub dir: nfs_fh3,
    /// Name of the entry within the directory
    pub name: Vec<u8>,
}
SerializeStruct!(diropargs3, dir, name);
DeserializeStruct!(diropargs3, dir, name);

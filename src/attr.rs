//! Portable view of NFS file attributes.

use std::fmt;

use filetime::FileTime;

use crate::protocol::xdr::nfs3::{fattr3, ftype3};

/// Kind of file system object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FileType {
    Regular,
    Directory,
    BlockDevice,
    CharDevice,
    Symlink,
    Socket,
    Fifo,
}

impl FileType {
    pub fn is_dir(self) -> bool {
        self == FileType::Directory
    }

    pub fn is_file(self) -> bool {
        self == FileType::Regular
    }

    pub fn is_symlink(self) -> bool {
        self == FileType::Symlink
    }
}

impl From<ftype3> for FileType {
    fn from(ftype: ftype3) -> Self {
        match ftype {
            ftype3::NF3REG => FileType::Regular,
            ftype3::NF3DIR => FileType::Directory,
            ftype3::NF3BLK => FileType::BlockDevice,
            ftype3::NF3CHR => FileType::CharDevice,
            ftype3::NF3LNK => FileType::Symlink,
            ftype3::NF3SOCK => FileType::Socket,
            ftype3::NF3FIFO => FileType::Fifo,
        }
    }
}

/// Permission bits in the usual `0o7777` layout.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Permissions(u16);

impl Permissions {
    pub const OTHER_EXEC: u16 = 0o0001;
    pub const OTHER_WRITE: u16 = 0o0002;
    pub const OTHER_READ: u16 = 0o0004;
    pub const GROUP_EXEC: u16 = 0o0010;
    pub const GROUP_WRITE: u16 = 0o0020;
    pub const GROUP_READ: u16 = 0o0040;
    pub const OWNER_EXEC: u16 = 0o0100;
    pub const OWNER_WRITE: u16 = 0o0200;
    pub const OWNER_READ: u16 = 0o0400;
    pub const STICKY: u16 = 0o1000;
    pub const SETGID: u16 = 0o2000;
    pub const SETUID: u16 = 0o4000;

    /// NFS mode bit and the permission it grants.
    const NFS_MODE_BITS: [(u32, u16); 12] = [
        (0x0001, Self::OTHER_EXEC),
        (0x0002, Self::OTHER_WRITE),
        (0x0004, Self::OTHER_READ),
        (0x0008, Self::GROUP_EXEC),
        (0x0010, Self::GROUP_WRITE),
        (0x0020, Self::GROUP_READ),
        (0x0040, Self::OWNER_EXEC),
        (0x0080, Self::OWNER_WRITE),
        (0x0100, Self::OWNER_READ),
        (0x0200, Self::STICKY),
        (0x0400, Self::SETGID),
        (0x0800, Self::SETUID),
    ];

    /// Maps an NFS `mode3` value. Bits outside the twelve permission bits
    /// are ignored.
    pub fn from_nfs_mode(mode: u32) -> Self {
        let bits = Self::NFS_MODE_BITS
            .iter()
            .filter(|(nfs, _)| mode & nfs != 0)
            .fold(0, |acc, (_, bit)| acc | bit);
        Self(bits)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn contains(self, bit: u16) -> bool {
        self.0 & bit == bit
    }

    pub fn is_setuid(self) -> bool {
        self.contains(Self::SETUID)
    }

    pub fn is_setgid(self) -> bool {
        self.contains(Self::SETGID)
    }

    pub fn is_sticky(self) -> bool {
        self.contains(Self::STICKY)
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permissions({:#o})", self.0)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = *self;
        let triplet = |r: u16, w: u16, x: u16, special: u16, on: char, off: char| {
            [
                if p.contains(r) { 'r' } else { '-' },
                if p.contains(w) { 'w' } else { '-' },
                match (p.contains(x), p.contains(special)) {
                    (true, true) => on,
                    (false, true) => off,
                    (true, false) => 'x',
                    (false, false) => '-',
                },
            ]
        };
        let owner = triplet(Self::OWNER_READ, Self::OWNER_WRITE, Self::OWNER_EXEC, Self::SETUID, 's', 'S');
        let group = triplet(Self::GROUP_READ, Self::GROUP_WRITE, Self::GROUP_EXEC, Self::SETGID, 's', 'S');
        let other = triplet(Self::OTHER_READ, Self::OTHER_WRITE, Self::OTHER_EXEC, Self::STICKY, 't', 'T');
        for c in owner.iter().chain(group.iter()).chain(other.iter()) {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Attributes of a file as last reported by the server.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Attrs {
    pub file_type: FileType,
    pub permissions: Permissions,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub used: u64,
    pub fileid: u64,
    pub atime: FileTime,
    pub mtime: FileTime,
    pub ctime: FileTime,
}

impl Attrs {
    pub fn is_dir(&self) -> bool {
        self.file_type.is_dir()
    }
}

impl From<fattr3> for Attrs {
    fn from(attr: fattr3) -> Self {
        Self {
            file_type: attr.ftype.into(),
            permissions: Permissions::from_nfs_mode(attr.mode),
            nlink: attr.nlink,
            uid: attr.uid,
            gid: attr.gid,
            size: attr.size,
            used: attr.used,
            fileid: attr.fileid,
            atime: attr.atime.into(),
            mtime: attr.mtime.into(),
            ctime: attr.ctime.into(),
        }
    }
}

//! A mounted NFS export.
//!
//! [`NfsMount`] ties the program clients together: it finds the MOUNT and
//! NFS ports, mounts the export, and resolves slash separated paths below
//! the export root with one LOOKUP per component. Symbolic links met on the
//! way are followed; absolute link targets are taken relative to the export
//! root, and `..` never climbs above it.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::net::IpAddr;

use tracing::{debug, error, warn};

use crate::attr::Attrs;
use crate::dir::ReadDir;
use crate::error::{Error, Result};
use crate::file::NfsFile;
use crate::options::{MountOptions, MountSource};
use crate::protocol::nfs::mount::{mountproc3_mnt, mountproc3_umnt};
use crate::protocol::nfs::portmap::pmapproc_getport;
use crate::protocol::nfs::v3::{nfsproc3_getattr, nfsproc3_lookup, nfsproc3_readlink};
use crate::protocol::rpc::{RpcClient, Transport, UdpTransport};
use crate::protocol::xdr::nfs3::{nfs_fh3, nfsstat3};
use crate::protocol::xdr::{mount, nfs3};

/// Symbolic links followed while resolving one path.
pub const MAX_SYMLINKS: usize = 16;

pub struct NfsMount<T: Transport> {
    rpc: RpcClient<T>,
    export: String,
    root: nfs_fh3,
    options: MountOptions,
    mounted: bool,
}

impl NfsMount<UdpTransport> {
    /// Mounts `export` from `server` over UDP.
    pub fn mount(server: IpAddr, export: &str, options: MountOptions) -> Result<Self> {
        let transport =
            UdpTransport::connect_from(server, options.source_port).map_err(Error::Transport)?;
        Self::with_client(RpcClient::new(transport), export, options)
    }

    /// Mounts a `server:/export` source.
    pub fn mount_source(source: &str, options: MountOptions) -> Result<Self> {
        let source = MountSource::parse(source)?;
        let server = source.resolve()?;
        Self::mount(server, &source.export, options)
    }

    /// Kernel command line arguments for booting with this export as root.
    pub fn kernel_root_arg(&self) -> String {
        self.root_arg(self.rpc.transport().server())
    }
}

impl<T: Transport> NfsMount<T> {
    /// Mounts `export` through an existing client.
    ///
    /// Ports not fixed by `options` are asked from the portmapper, MOUNT
    /// first, before the MNT call.
    pub fn with_client(mut rpc: RpcClient<T>, export: &str, options: MountOptions) -> Result<Self> {
        let mount_port = match options.mount_port {
            Some(port) => port,
            None => discover_port(&mut rpc, mount::PROGRAM, mount::VERSION)?,
        };
        rpc.set_mount_port(mount_port);

        let nfs_port = match options.nfs_port {
            Some(port) => port,
            None => discover_port(&mut rpc, nfs3::PROGRAM, nfs3::VERSION)?,
        };
        rpc.set_nfs_port(nfs_port);

        debug!(export, mount_port, nfs_port, "mounting");
        let root = mountproc3_mnt(&mut rpc, export)?;
        Ok(Self { rpc, export: export.to_string(), root, options, mounted: true })
    }

    pub fn export(&self) -> &str {
        &self.export
    }

    /// File handle of the export root.
    pub fn root(&self) -> &nfs_fh3 {
        &self.root
    }

    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    pub fn rpc(&mut self) -> &mut RpcClient<T> {
        &mut self.rpc
    }

    pub fn getattr(&mut self, fh: &nfs_fh3) -> Result<Attrs> {
        nfsproc3_getattr(&mut self.rpc, fh)
    }

    /// Looks up a single name in `dir`.
    pub fn lookup(&mut self, dir: &nfs_fh3, name: &str) -> Result<(nfs_fh3, Option<Attrs>)> {
        nfsproc3_lookup(&mut self.rpc, dir, name.as_bytes())
    }

    /// Resolves `path`, following symbolic links, to a handle and attributes.
    pub fn lookup_path(&mut self, path: &str) -> Result<(nfs_fh3, Attrs)> {
        self.resolve(path, true)
    }

    /// Attributes of the object at `path`, following symbolic links.
    pub fn metadata(&mut self, path: &str) -> Result<Attrs> {
        self.resolve(path, true).map(|(_, attrs)| attrs)
    }

    /// Attributes of the object at `path` itself, even when it is a link.
    pub fn symlink_metadata(&mut self, path: &str) -> Result<Attrs> {
        self.resolve(path, false).map(|(_, attrs)| attrs)
    }

    /// Opens a file for reading.
    pub fn open(&mut self, path: &str) -> Result<NfsFile<'_, T>> {
        let (fh, attrs) = self.resolve(path, true)?;
        if attrs.is_dir() {
            return Err(Error::Nfs(nfsstat3::NFS3ERR_ISDIR));
        }
        Ok(NfsFile::new(&mut self.rpc, fh, Some(attrs)))
    }

    /// Enumerates a directory.
    pub fn read_dir(&mut self, path: &str) -> Result<ReadDir<'_, T>> {
        let (fh, attrs) = self.resolve(path, true)?;
        if !attrs.is_dir() {
            return Err(Error::Nfs(nfsstat3::NFS3ERR_NOTDIR));
        }
        Ok(ReadDir::new(&mut self.rpc, fh))
    }

    /// Target of the symbolic link at `path`.
    pub fn readlink(&mut self, path: &str) -> Result<String> {
        let (fh, attrs) = self.resolve(path, false)?;
        if !attrs.file_type.is_symlink() {
            return Err(Error::Nfs(nfsstat3::NFS3ERR_INVAL));
        }
        nfsproc3_readlink(&mut self.rpc, &fh)
    }

    /// Unmounts the export.
    ///
    /// Dropping a mounted `NfsMount` unmounts as well, ignoring errors.
    pub fn unmount(mut self) -> Result<()> {
        self.mounted = false;
        mountproc3_umnt(&mut self.rpc, &self.export)
    }

    /// `root=/dev/nfs nfsroot=...` for a kernel booting from this export on
    /// `server`. Ports fixed through the options are passed on.
    pub fn root_arg(&self, server: IpAddr) -> String {
        let mut arg = match server {
            IpAddr::V4(ip) => format!("root=/dev/nfs nfsroot={ip}:{}", self.export),
            IpAddr::V6(ip) => format!("root=/dev/nfs nfsroot=[{ip}]:{}", self.export),
        };
        if !self.options.root_nfs_opts.is_empty() {
            arg.push(',');
            arg.push_str(&self.options.root_nfs_opts);
        }
        if let Some(port) = self.options.nfs_port {
            let _ = write!(arg, ",port={port}");
        }
        if let Some(port) = self.options.mount_port {
            let _ = write!(arg, ",mountport={port}");
        }
        arg
    }

    fn resolve(&mut self, path: &str, follow_last: bool) -> Result<(nfs_fh3, Attrs)> {
        if path.as_bytes().contains(&0) {
            return Err(Error::InvalidPath(path.to_string()));
        }

        // Handles from the export root down to the current object.
        let mut stack: Vec<(nfs_fh3, Option<Attrs>)> = vec![(self.root.clone(), None)];
        let mut pending: VecDeque<String> = components(path).collect();
        let mut links = 0;

        while let Some(name) = pending.pop_front() {
            if name == ".." {
                if stack.len() > 1 {
                    stack.pop();
                }
                continue;
            }

            let dir = match stack.last() {
                Some((fh, _)) => fh.clone(),
                None => self.root.clone(),
            };
            let (fh, attrs) = nfsproc3_lookup(&mut self.rpc, &dir, name.as_bytes())?;
            let attrs = match attrs {
                Some(attrs) => attrs,
                None => nfsproc3_getattr(&mut self.rpc, &fh)?,
            };

            let last = pending.is_empty();
            if attrs.file_type.is_symlink() && (follow_last || !last) {
                links += 1;
                if links > MAX_SYMLINKS {
                    warn!(path, "too many levels of symbolic links");
                    return Err(Error::InvalidPath(path.to_string()));
                }
                let target = nfsproc3_readlink(&mut self.rpc, &fh)?;
                debug!(name = %name, target = %target, "following symlink");
                if target.starts_with('/') {
                    stack.truncate(1);
                }
                for component in components(&target).rev() {
                    pending.push_front(component);
                }
                continue;
            }

            if !last && !attrs.is_dir() {
                return Err(Error::Nfs(nfsstat3::NFS3ERR_NOTDIR));
            }
            stack.push((fh, Some(attrs)));
        }

        let Some((fh, attrs)) = stack.pop() else {
            return Err(Error::InvalidPath(path.to_string()));
        };
        let attrs = match attrs {
            Some(attrs) => attrs,
            None => nfsproc3_getattr(&mut self.rpc, &fh)?,
        };
        Ok((fh, attrs))
    }
}

impl<T: Transport> Drop for NfsMount<T> {
    fn drop(&mut self) {
        if !self.mounted {
            return;
        }
        if let Err(err) = mountproc3_umnt(&mut self.rpc, &self.export) {
            debug!(export = %self.export, %err, "unmount on drop failed");
        }
    }
}

impl<T: Transport> std::fmt::Debug for NfsMount<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NfsMount")
            .field("export", &self.export)
            .field("root", &self.root)
            .field("mounted", &self.mounted)
            .finish()
    }
}

fn discover_port<T: Transport>(rpc: &mut RpcClient<T>, prog: u32, vers: u32) -> Result<u16> {
    pmapproc_getport(rpc, prog, vers).map_err(|err| {
        error!(prog, vers, %err, "port lookup failed");
        err
    })
}

/// Path components other than empty ones and `.`.
fn components(path: &str) -> impl DoubleEndedIterator<Item = String> + '_ {
    path.split('/').filter(|c| !c.is_empty() && *c != ".").map(str::to_string)
}

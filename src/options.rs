//! Mount configuration.
//!
//! Options come as a comma separated `key=value` list, the way they are
//! written on a mount command line:
//!
//! ```text
//! port=2049,mountport=635
//! ```
//!
//! A port of 0, or a port left out, is looked up through the portmapper at
//! mount time.

use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::rpc::DEFAULT_SOURCE_PORT;

/// NFS options forwarded to the kernel with the root argument.
pub const DEFAULT_ROOT_NFS_OPTS: &str = "v3,tcp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountOptions {
    /// Port of the NFS program, if fixed.
    pub nfs_port: Option<u16>,
    /// Port of the MOUNT program, if fixed.
    pub mount_port: Option<u16>,
    /// Local UDP port to send from.
    pub source_port: u16,
    /// Options appended to `nfsroot=` by [`NfsMount::kernel_root_arg`].
    ///
    /// [`NfsMount::kernel_root_arg`]: crate::NfsMount::kernel_root_arg
    pub root_nfs_opts: String,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            nfs_port: None,
            mount_port: None,
            source_port: DEFAULT_SOURCE_PORT,
            root_nfs_opts: DEFAULT_ROOT_NFS_OPTS.to_string(),
        }
    }
}

impl MountOptions {
    /// Parses an option string. Unknown options are ignored.
    pub fn parse(options: &str) -> Result<Self> {
        let mut parsed = Self::default();
        for option in options.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            let (key, value) = match option.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (option, None),
            };
            match key {
                "port" => parsed.nfs_port = parse_port(key, value)?,
                "mountport" => parsed.mount_port = parse_port(key, value)?,
                _ => debug!("ignoring mount option {:?}", option),
            }
        }
        Ok(parsed)
    }

    /// Uses `port` for both the NFS and the MOUNT program, skipping the
    /// portmapper entirely. A port of 0 leaves the options unchanged.
    pub fn with_default_port(mut self, port: u16) -> Self {
        if port != 0 {
            self.nfs_port = Some(port);
            self.mount_port = Some(port);
        }
        self
    }

    pub fn with_source_port(mut self, port: u16) -> Self {
        self.source_port = port;
        self
    }

    pub fn with_root_nfs_opts(mut self, opts: impl Into<String>) -> Self {
        self.root_nfs_opts = opts.into();
        self
    }
}

impl FromStr for MountOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_port(key: &str, value: Option<&str>) -> Result<Option<u16>> {
    let Some(value) = value else {
        return Err(Error::InvalidOptions(format!("option '{key}' needs a value")));
    };
    match value.parse::<u16>() {
        Ok(0) => Ok(None),
        Ok(port) => Ok(Some(port)),
        Err(_) => Err(Error::InvalidOptions(format!("invalid port '{value}' for option '{key}'"))),
    }
}

/// What to mount: `server:/export`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSource {
    pub server: String,
    pub export: String,
}

impl MountSource {
    pub fn parse(source: &str) -> Result<Self> {
        // IPv6 literals are written in brackets: [fe80::1]:/export
        let (server, export) = match source.strip_prefix('[') {
            Some(rest) => rest
                .split_once("]:")
                .ok_or_else(|| Error::InvalidOptions(format!("invalid mount source '{source}'")))?,
            None => source
                .split_once(':')
                .ok_or_else(|| Error::InvalidOptions(format!("missing ':' in mount source '{source}'")))?,
        };
        if server.is_empty() {
            return Err(Error::InvalidOptions(format!("missing server in mount source '{source}'")));
        }
        if export.is_empty() {
            return Err(Error::InvalidOptions(format!("missing export in mount source '{source}'")));
        }
        Ok(Self { server: server.to_string(), export: export.to_string() })
    }

    /// Resolves the server name to an address.
    pub fn resolve(&self) -> Result<IpAddr> {
        if let Ok(ip) = self.server.parse::<IpAddr>() {
            return Ok(ip);
        }
        let mut addrs = (self.server.as_str(), 0).to_socket_addrs().map_err(Error::Transport)?;
        match addrs.next() {
            Some(addr) => Ok(addr.ip()),
            None => Err(Error::InvalidOptions(format!("cannot resolve '{}'", self.server))),
        }
    }
}

impl FromStr for MountSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MountSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.server.contains(':') {
            write!(f, "[{}]:{}", self.server, self.export)
        } else {
            write!(f, "{}:{}", self.server, self.export)
        }
    }
}

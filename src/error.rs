//! Error type shared by every layer of the client.
//!
//! Errors fall into four groups:
//! - transport: the server never answered, or the socket failed
//! - protocol: a reply could not be decoded or broke the protocol
//! - RPC: the server refused the call itself
//! - status: the MOUNT or NFS procedure ran and reported a failure
//!
//! Only transport timeouts are retried, and only inside the RPC engine. Every
//! other error is final for the call that produced it.

use std::io;

use thiserror::Error;

use crate::protocol::xdr::mount::mountstat3;
use crate::protocol::xdr::nfs3::nfsstat3;
use crate::protocol::xdr::DecodeError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// No matching reply arrived after the last retransmission.
    #[error("no reply after {attempts} transmissions")]
    Timeout { attempts: u32 },

    /// The transport failed while polling for replies.
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),

    /// A reply could not be decoded.
    #[error("malformed reply: {0}")]
    Decode(#[from] DecodeError),

    /// A reply decoded cleanly but contradicts the protocol.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// A request did not fit the request buffer.
    #[error("request exceeds the {capacity} byte request buffer")]
    RequestTooLarge { capacity: usize },

    /// A request argument could not be encoded.
    #[error("cannot encode request: {0}")]
    Encode(#[source] io::Error),

    /// The server answered MSG_DENIED with the given `reject_stat`.
    #[error("RPC call denied (reject_stat {0})")]
    RpcDenied(u32),

    /// The server accepted the call but did not run it.
    #[error("RPC call rejected (accept_stat {stat})")]
    RpcRejected { stat: u32 },

    #[error("NFS error: {0}")]
    Nfs(nfsstat3),

    #[error("NFS error: unknown status {0}")]
    NfsUnknown(u32),

    #[error("mount error: {0}")]
    Mount(mountstat3),

    #[error("mount error: unknown status {0}")]
    MountUnknown(u32),

    /// The portmapper has no UDP port registered for the program.
    #[error("no UDP port for RPC program {program}, TCP only?")]
    NoUdpPort { program: u32 },

    /// A path handed to the mount facade is not usable.
    #[error("invalid path '{0}'")]
    InvalidPath(String),

    /// A mount source or option string could not be parsed.
    #[error("invalid mount options: {0}")]
    InvalidOptions(String),
}

impl Error {
    /// True when the error is an NFS status of `stat`.
    pub fn is_nfs(&self, stat: nfsstat3) -> bool {
        matches!(self, Error::Nfs(s) if *s == stat)
    }

    pub fn io_kind(&self) -> io::ErrorKind {
        match self {
            Error::Timeout { .. } => io::ErrorKind::TimedOut,
            Error::Transport(err) => err.kind(),
            Error::Decode(_) | Error::ProtocolViolation(_) | Error::RpcDenied(_) => {
                io::ErrorKind::InvalidData
            }
            Error::RequestTooLarge { .. } | Error::Encode(_) => io::ErrorKind::InvalidInput,
            Error::RpcRejected { .. } => io::ErrorKind::Unsupported,
            Error::Nfs(stat) => stat.io_kind(),
            Error::Mount(stat) => stat.io_kind(),
            Error::NfsUnknown(_) | Error::MountUnknown(_) => io::ErrorKind::Other,
            Error::NoUdpPort { .. } => io::ErrorKind::ConnectionRefused,
            Error::InvalidPath(_) | Error::InvalidOptions(_) => io::ErrorKind::InvalidInput,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Transport(inner) => inner,
            other => io::Error::new(other.io_kind(), other),
        }
    }
}

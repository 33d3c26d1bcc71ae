//! This module provides data structures for the Remote Procedure Call (RPC) protocol
//! as defined in RFC 5531 (previously RFC 1057). These structures handle serialization and deserialization
//! of RPC messages between client and server.
//!
//! The client only ever sends CALL messages and only ever reads REPLY messages.
//! Both directions encode and decode through the same types, so an in-process
//! server can parse the calls this client builds.

// Keep original RFC naming conventions for consistency with the RFC
#![allow(non_camel_case_types)]

use std::io::Write;

use num_derive::{FromPrimitive, ToPrimitive};

use super::*;

/// RPC protocol version carried in every call.
pub const RPC_VERSION: u32 = 2;

/// Upper bound of an `opaque_auth` body.
pub const MAX_AUTH_BYTES: usize = 400;

/// Size of the AUTH_UNIX credential body this client sends.
pub const AUTH_UNIX_BODY_LEN: u32 = 20;

/// Upper bound of the auxiliary group list in AUTH_UNIX credentials.
pub const AUTH_UNIX_MAX_GIDS: usize = 16;

/// Message direction discriminant.
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum msg_type {
    #[default]
    CALL = 0,
    REPLY = 1,
}
impl SerializeEnum for msg_type {}
impl DeserializeEnum for msg_type {}

/// Authentication status codes indicating why authentication failed
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum auth_stat {
    /// Invalid credentials provided by client (checksum/signature verification failed)
    #[default]
    AUTH_BADCRED = 1,
    /// Credentials rejected - client needs to establish a new session
    AUTH_REJECTEDCRED = 2,
    /// Invalid verifier provided by client (checksum/signature verification failed)
    AUTH_BADVERF = 3,
    /// Verifier rejected due to expiration or replay attempt
    AUTH_REJECTEDVERF = 4,
    /// Authentication mechanism too weak for requested operation
    AUTH_TOOWEAK = 5,
}
impl SerializeEnum for auth_stat {}
impl DeserializeEnum for auth_stat {}

/// Authentication flavor (mechanism) identifiers for RPC
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum auth_flavor {
    /// No authentication
    #[default]
    AUTH_NULL = 0,
    /// UNIX-style authentication (uid/gid)
    AUTH_UNIX = 1,
    /// Short-form authentication
    AUTH_SHORT = 2,
    /// DES authentication
    AUTH_DES = 3,
    /// RPCSEC_GSS, RFC 2203
    RPCSEC_GSS = 6,
}
impl SerializeEnum for auth_flavor {}
impl DeserializeEnum for auth_flavor {}

/// UNIX-style credentials used for authentication
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct auth_unix {
    /// Timestamp to prevent replay attacks
    pub stamp: u32,
    /// The name of the client machine
    pub machinename: Vec<u8>,
    /// The effective user ID of the caller
    pub uid: u32,
    /// The effective group ID of the caller
    pub gid: u32,
    /// A list of additional group IDs for the caller
    pub gids: Vec<u32>,
}

impl Serialize for auth_unix {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        self.stamp.serialize(dest)?;
        self.machinename.serialize(dest)?;
        self.uid.serialize(dest)?;
        self.gid.serialize(dest)?;
        (self.gids.len() as u32).serialize(dest)?;
        for gid in &self.gids {
            gid.serialize(dest)?;
        }
        Ok(())
    }
}

impl Deserialize for auth_unix {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        self.stamp = src.decode_u32()?;
        self.machinename = src.decode_opaque(255)?.to_vec();
        self.uid = src.decode_u32()?;
        self.gid = src.decode_u32()?;
        let count = src.decode_u32()? as usize;
        if count > AUTH_UNIX_MAX_GIDS {
            return Err(DecodeError::OpaqueTooLong { len: count, max: AUTH_UNIX_MAX_GIDS });
        }
        self.gids.clear();
        for _ in 0..count {
            self.gids.push(src.decode_u32()?);
        }
        Ok(())
    }
}

/// Authentication data structure used in RPC protocol for both client and server authentication.
///
/// The RPC protocol provides bidirectional authentication between caller and service:
/// - Call messages contain two auth fields: credentials and verifier
/// - Reply messages contain one auth field: response verifier
///
/// The body is at most [`MAX_AUTH_BYTES`] long.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct opaque_auth {
    /// The authentication mechanism being used, an [`auth_flavor`] value.
    /// Kept raw so that a reply verifier of an unknown flavor still decodes.
    pub flavor: u32,
    /// The opaque authentication data associated with that mechanism
    pub body: Vec<u8>,
}
SerializeStruct!(opaque_auth, flavor, body);

impl Deserialize for opaque_auth {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        self.flavor = src.decode_u32()?;
        self.body = src.decode_opaque(MAX_AUTH_BYTES)?.to_vec();
        Ok(())
    }
}

/// RPC message structure as defined in RFC 5531 (previously RFC 1057).
///
/// Each RPC message begins with a transaction identifier (xid) followed by a
/// discriminated union containing either a CALL or REPLY message body.
///
/// The xid in a REPLY always matches the xid from the initiating CALL; the
/// client uses it to pair replies with the single call it has outstanding.
#[derive(Clone, Debug, Default)]
pub struct rpc_msg {
    /// Transaction identifier used to match calls and replies
    pub xid: u32,
    /// The body of the RPC message (call or reply)
    pub body: rpc_body,
}
DeserializeStruct!(rpc_msg, xid, body);
SerializeStruct!(rpc_msg, xid, body);

/// The body of an RPC message, which can be either a call or a reply
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Debug)]
pub enum rpc_body {
    /// A call to a remote procedure
    CALL(call_body),
    /// A reply from a remote procedure
    REPLY(reply_body),
}

impl Default for rpc_body {
    fn default() -> rpc_body {
        rpc_body::CALL(call_body::default())
    }
}

impl Serialize for rpc_body {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        match self {
            rpc_body::CALL(v) => {
                msg_type::CALL.serialize(dest)?;
                v.serialize(dest)?;
            }
            rpc_body::REPLY(v) => {
                msg_type::REPLY.serialize(dest)?;
                v.serialize(dest)?;
            }
        }
        Ok(())
    }
}

impl Deserialize for rpc_body {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        match deserialize::<msg_type>(src)? {
            msg_type::CALL => *self = rpc_body::CALL(deserialize(src)?),
            msg_type::REPLY => *self = rpc_body::REPLY(deserialize(src)?),
        }
        Ok(())
    }
}

/// The fixed part of an RPC call. Procedure arguments, starting with the
/// credential and verifier, follow it on the wire.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct call_header {
    pub xid: u32,
    pub mtype: msg_type,
    pub rpcvers: u32,
    pub prog: u32,
    pub vers: u32,
    pub proc: u32,
}
DeserializeStruct!(call_header, xid, mtype, rpcvers, prog, vers, proc);
SerializeStruct!(call_header, xid, mtype, rpcvers, prog, vers, proc);

impl call_header {
    pub fn new(xid: u32, prog: u32, vers: u32, proc: u32) -> Self {
        Self { xid, mtype: msg_type::CALL, rpcvers: RPC_VERSION, prog, vers, proc }
    }
}

/// The body of an RPC call, containing all information needed for a remote procedure call
#[derive(Clone, Debug, Default)]
pub struct call_body {
    /// RPC version, must be 2
    pub rpcvers: u32,
    /// The program to call
    pub prog: u32,
    /// The version of the program
    pub vers: u32,
    /// The procedure within the program to call
    pub proc: u32,
    /// Authentication credentials for the caller
    pub cred: opaque_auth,
    /// Authentication verifier for the caller
    pub verf: opaque_auth,
    /* procedure specific parameters start here */
}
DeserializeStruct!(call_body, rpcvers, prog, vers, proc, cred, verf);
SerializeStruct!(call_body, rpcvers, prog, vers, proc, cred, verf);

/// The body of an RPC reply, indicating whether the call was accepted or denied
#[derive(Clone, Debug)]
pub enum reply_body {
    /// The call was accepted
    MSG_ACCEPTED(accepted_reply),
    /// The call was denied
    MSG_DENIED(rejected_reply),
}

impl Default for reply_body {
    fn default() -> reply_body {
        reply_body::MSG_ACCEPTED(accepted_reply::default())
    }
}

impl Serialize for reply_body {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        match self {
            reply_body::MSG_ACCEPTED(v) => {
                0_u32.serialize(dest)?;
                v.serialize(dest)?;
            }
            reply_body::MSG_DENIED(v) => {
                1_u32.serialize(dest)?;
                v.serialize(dest)?;
            }
        }
        Ok(())
    }
}

impl Deserialize for reply_body {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        match src.decode_u32()? {
            0 => *self = reply_body::MSG_ACCEPTED(deserialize(src)?),
            1 => *self = reply_body::MSG_DENIED(deserialize(src)?),
            reply_stat => return Err(DecodeError::InvalidEnum(reply_stat)),
        }
        Ok(())
    }
}

/// Information about program version mismatch
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct mismatch_info {
    /// Lowest version supported
    pub low: u32,
    /// Highest version supported
    pub high: u32,
}
DeserializeStruct!(mismatch_info, low, high);
SerializeStruct!(mismatch_info, low, high);

/// Reply to an RPC call that was accepted by the server.
///
/// Even though the call was accepted, there could still be an error in processing it.
/// The verifier is decoded and bounded but its flavor is not checked.
#[derive(Clone, Debug, Default)]
pub struct accepted_reply {
    /// Authentication verifier from server
    pub verf: opaque_auth,
    /// Reply data union discriminated by accept_stat
    pub reply_data: accept_body,
}
DeserializeStruct!(accepted_reply, verf, reply_data);
SerializeStruct!(accepted_reply, verf, reply_data);

/// Response data for an accepted RPC call, discriminated by accept_stat.
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum accept_body {
    /// Call completed successfully
    #[default]
    SUCCESS,
    /// Program is not available on this server
    PROG_UNAVAIL,
    /// Program version mismatch, includes supported version range
    PROG_MISMATCH(mismatch_info),
    /// Requested procedure is not available
    PROC_UNAVAIL,
    /// Server could not decode the call arguments
    GARBAGE_ARGS,
    /// Memory allocation failure or similar on the server
    SYSTEM_ERR,
}

impl accept_body {
    /// The `accept_stat` discriminant.
    pub fn stat(&self) -> u32 {
        match self {
            accept_body::SUCCESS => 0,
            accept_body::PROG_UNAVAIL => 1,
            accept_body::PROG_MISMATCH(_) => 2,
            accept_body::PROC_UNAVAIL => 3,
            accept_body::GARBAGE_ARGS => 4,
            accept_body::SYSTEM_ERR => 5,
        }
    }
}

impl Serialize for accept_body {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        self.stat().serialize(dest)?;
        if let accept_body::PROG_MISMATCH(v) = self {
            v.serialize(dest)?;
        }
        Ok(())
    }
}

impl Deserialize for accept_body {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        match src.decode_u32()? {
            0 => *self = accept_body::SUCCESS,
            1 => *self = accept_body::PROG_UNAVAIL,
            2 => *self = accept_body::PROG_MISMATCH(deserialize(src)?),
            3 => *self = accept_body::PROC_UNAVAIL,
            4 => *self = accept_body::GARBAGE_ARGS,
            5 => *self = accept_body::SYSTEM_ERR,
            accept_stat => return Err(DecodeError::InvalidEnum(accept_stat)),
        }
        Ok(())
    }
}

/// Reply sent when an RPC call is rejected by the server.
///
/// The call can be rejected for two reasons:
/// 1. RPC Version Mismatch (RPC_MISMATCH): the server returns the lowest and
///    highest RPC versions it supports.
/// 2. Authentication Error (AUTH_ERROR): the server refuses to authenticate
///    the caller and says why.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum rejected_reply {
    /// RPC version mismatch - includes supported version range
    RPC_MISMATCH(mismatch_info),
    /// Authentication failed - includes specific error code
    AUTH_ERROR(auth_stat),
}

impl rejected_reply {
    /// The `reject_stat` discriminant.
    pub fn stat(&self) -> u32 {
        match self {
            rejected_reply::RPC_MISMATCH(_) => 0,
            rejected_reply::AUTH_ERROR(_) => 1,
        }
    }
}

impl Default for rejected_reply {
    fn default() -> rejected_reply {
        rejected_reply::AUTH_ERROR(auth_stat::default())
    }
}

impl Serialize for rejected_reply {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        self.stat().serialize(dest)?;
        match self {
            rejected_reply::RPC_MISMATCH(v) => v.serialize(dest),
            rejected_reply::AUTH_ERROR(v) => v.serialize(dest),
        }
    }
}

impl Deserialize for rejected_reply {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        match src.decode_u32()? {
            0 => *self = rejected_reply::RPC_MISMATCH(deserialize(src)?),
            1 => *self = rejected_reply::AUTH_ERROR(deserialize(src)?),
            stat => return Err(DecodeError::InvalidEnum(stat)),
        }
        Ok(())
    }
}

/// Creates a reply message with the given accept status and a null verifier
pub fn make_accepted_reply(xid: u32, reply_data: accept_body) -> rpc_msg {
    let reply = reply_body::MSG_ACCEPTED(accepted_reply { verf: opaque_auth::default(), reply_data });
    rpc_msg { xid, body: rpc_body::REPLY(reply) }
}

/// Creates a successful reply message with no additional data
pub fn make_success_reply(xid: u32) -> rpc_msg {
    make_accepted_reply(xid, accept_body::SUCCESS)
}

/// Creates a reply message denying the call
pub fn make_denied_reply(xid: u32, reason: rejected_reply) -> rpc_msg {
    rpc_msg { xid, body: rpc_body::REPLY(reply_body::MSG_DENIED(reason)) }
}

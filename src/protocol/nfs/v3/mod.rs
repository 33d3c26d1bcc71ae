//! NFSv3 (Network File System version 3) client procedures as specified in RFC 1813.
//!
//! A read-only client needs five of the 22 procedures:
//!
//! - GETATTR - Get file attributes
//! - LOOKUP - Look up file name
//! - READLINK - Read from symbolic link
//! - READ - Read from file
//! - READDIR - Read from directory
//!
//! Each procedure is implemented in its own module. All of them send AUTH_UNIX
//! credentials and rely on the RPC engine to strip the status word, so a
//! decoded result always starts at the `resok` arm of the result union.

mod getattr;
mod lookup;
mod read;
mod readdir;
mod readlink;

pub use getattr::nfsproc3_getattr;
pub use lookup::nfsproc3_lookup;
pub use read::{nfsproc3_read, ReadResult};
pub use readdir::{nfsproc3_readdir, ReaddirPage};
pub use readlink::nfsproc3_readlink;

use crate::attr::Attrs;
use crate::error::Result;
use crate::protocol::xdr::nfs3::post_op_attr;
use crate::protocol::xdr::{deserialize, XdrCursor};

/// Decodes a `post_op_attr` block, attribute flag plus 21 words when set.
fn decode_post_op_attr(src: &mut XdrCursor<'_>) -> Result<Option<Attrs>> {
    let attr = deserialize::<post_op_attr>(src)?;
    Ok(attr.into_option().map(Attrs::from))
}

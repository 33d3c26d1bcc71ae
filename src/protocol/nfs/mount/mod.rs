//! MOUNT protocol client for NFS version 3 as specified in RFC 1813 Appendix I.
//! https://datatracker.ietf.org/doc/html/rfc1813#appendix-I

mod mnt;
mod umnt;

pub use mnt::mountproc3_mnt;
pub use umnt::mountproc3_umnt;

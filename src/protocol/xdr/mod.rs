//! XDR is a standard for the description and encoding of data.
//! It is useful for transferring data between different computer
//! architectures, and it has been used to communicate data between such
//! diverse machines as the SUN WORKSTATION*, VAX*, IBM-PC*, and Cray*
//!
//! <https://datatracker.ietf.org/doc/html/rfc4506>
//!
//! Its Rust-specific implementation is presented below.
//! Where appropriate, the standard types of the XDR language have
//! been replaced by similar types of the Rust language. For example,
//! the `unsigned int` type was replaced by the `u32` type, and the
//! `opaque<>` type was replaced by `[u8]`.
//!
//! Encoding goes through [`std::io::Write`], so requests are built into a
//! bounded [`RequestBuf`]. Decoding always reads from an [`XdrCursor`]
//! borrowing the received datagram: replies are never copied before the
//! caller has picked out the fields it needs.

use std::io::Write;

use byteorder::BigEndian;
use byteorder::WriteBytesExt;
use num_traits::{FromPrimitive, ToPrimitive};

pub mod cursor;
pub mod mount;
pub mod nfs3;
pub mod portmap;
pub mod request;
pub mod rpc;
pub mod utils;

pub use cursor::{DecodeError, XdrCursor};
pub use request::RequestBuf;

/// XDR assumes big endian encoding.
pub type XDREndian = BigEndian;

pub trait Serialize {
    /// Serializes the implementing type to the provided writer.
    ///
    /// ## Parameters
    /// * `dest` - Where will the value be serialized to.
    ///
    /// ## Returns
    /// * `std::io::Result<()>` - Ok(()) on success, or an error if serialization fails.
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()>;
}

pub trait Deserialize {
    /// Deserializes data from the cursor into the implementing type.
    ///
    /// ## Parameters
    /// * `src` - From where the value will be deserialized.
    ///
    /// ## Returns
    /// * `Result<(), DecodeError>` - Ok(()) on success, or the reason the
    ///   bytes at the cursor do not form a valid value.
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError>;
}

/// Deserialization based on the [Default] trait of the type T.
///
/// # Parameters
/// * src - From where the value will be deserialized
///
/// # Returns
/// * `Result<T, DecodeError>` - the decoded value, or why decoding failed.
pub fn deserialize<T>(src: &mut XdrCursor<'_>) -> Result<T, DecodeError>
where
    T: Deserialize + Default,
{
    let mut val = T::default();
    val.deserialize(src)?;

    Ok(val)
}

/// Marker trait for XDR `enum` type serialization.
pub trait SerializeEnum: ToPrimitive {}

/// Enumerations have the same representation as signed integers.
impl<T: SerializeEnum> Serialize for T {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        if let Some(val) = self.to_i32() {
            return dest.write_i32::<XDREndian>(val);
        }
        Err(utils::invalid_data("Invalid enum value"))
    }
}

/// Marker trait for XDR `enum` type deserialization.
pub trait DeserializeEnum: FromPrimitive {}

/// Enumerations have the same representation as signed integers.
impl<T: DeserializeEnum> Deserialize for T {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        let raw = src.decode_u32()?;
        match FromPrimitive::from_u32(raw) {
            Some(val) => {
                *self = val;
                Ok(())
            }
            None => Err(DecodeError::InvalidEnum(raw)),
        }
    }
}

/// XDR `bool` type serialization implementation.
///
/// ```text
/// bool identifier;
/// ```
///
/// This is equivalent to:
///
/// ```text
///  enum { FALSE = 0, TRUE = 1 } identifier;
/// ```
impl Serialize for bool {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        dest.write_u32::<XDREndian>(u32::from(*self))
    }
}

/// XDR `bool` type deserialization implementation.
impl Deserialize for bool {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        *self = src.decode_bool()?;
        Ok(())
    }
}

/// XDR `unsigned int` type serialization implementation.
impl Serialize for u32 {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        dest.write_u32::<XDREndian>(*self)
    }
}

/// XDR `unsigned int` type deserialization implementation.
impl Deserialize for u32 {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        *self = src.decode_u32()?;
        Ok(())
    }
}

/// XDR `unsigned hyper` type serialization implementation.
impl Serialize for u64 {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        dest.write_u64::<XDREndian>(*self)
    }
}

/// XDR `unsigned hyper` type deserialization implementation.
impl Deserialize for u64 {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        *self = src.decode_u64()?;
        Ok(())
    }
}

/// XDR Fixed-Length Opaque Data serialization implementation.
///
/// ```text
/// opaque identifier[n];
/// ```
impl<const N: usize> Serialize for [u8; N] {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        dest.write_all(self)?;
        utils::write_padding(N, dest)?;

        Ok(())
    }
}

/// XDR Fixed-Length Opaque Data deserialization implementation.
impl<const N: usize> Deserialize for [u8; N] {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        *self = src.decode_fixed::<N>()?;
        Ok(())
    }
}

/// Object lengths in XDR are always serialized as [u32].
fn serialize_len<W: Write>(len: usize, dest: &mut W) -> std::io::Result<()> {
    let Some(val) = len.to_u32() else {
        return Err(utils::invalid_data("cannot cast `usize` to `u32`"));
    };

    val.serialize(dest)
}

/// XDR Variable-Length Opaque Data serialization implementation.
impl Serialize for [u8] {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        serialize_len(self.len(), dest)?;
        dest.write_all(self)?;
        utils::write_padding(self.len(), dest)?;

        Ok(())
    }
}

impl Serialize for Vec<u8> {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        self.as_slice().serialize(dest)
    }
}

/// XDR Variable-Length Opaque Data deserialization implementation.
///
/// Unbounded. Fields with a protocol maximum use [`XdrCursor::decode_opaque`].
impl Deserialize for Vec<u8> {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        let bytes = src.decode_opaque(usize::MAX)?;
        self.clear();
        self.extend_from_slice(bytes);

        Ok(())
    }
}

/// XDR String serialization implementation.
impl Serialize for str {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        self.as_bytes().serialize(dest)
    }
}

/// XDR Fixed-Length Array serialization implementation.
impl<const N: usize> Serialize for [u32; N] {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        for i in self {
            i.serialize(dest)?;
        }

        Ok(())
    }
}

/// Macro for implementing XDR serialization and deserialization for structs.
///
/// This macro simplifies implementation of the XDR trait for struct types
/// by serializing or deserializing each field in sequence.
#[allow(non_camel_case_types)]
#[macro_export]
macro_rules! SerializeStruct {
    (
        $t:ident,
        $($element:ident),*
    ) => {
        impl $crate::protocol::xdr::Serialize for $t {
            fn serialize<W: std::io::Write>(&self, dest: &mut W) -> std::io::Result<()> {
                $($crate::protocol::xdr::Serialize::serialize(&self.$element, dest)?;)*
                Ok(())
            }
        }
    };
}

#[allow(non_camel_case_types)]
#[macro_export]
macro_rules! DeserializeStruct {
    (
        $t:ident,
        $($element:ident),*
    ) => {
        impl $crate::protocol::xdr::Deserialize for $t {
            fn deserialize(
                &mut self,
                src: &mut $crate::protocol::xdr::XdrCursor<'_>,
            ) -> Result<(), $crate::protocol::xdr::DecodeError> {
                $($crate::protocol::xdr::Deserialize::deserialize(&mut self.$element, src)?;)*
                Ok(())
            }
        }
    };
}

// XDR Optional-Data serialization implementation.
impl<T: Serialize> Serialize for Option<T> {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        match self {
            Some(data) => {
                true.serialize(dest)?;
                data.serialize(dest)?;

                Ok(())
            }
            None => false.serialize(dest),
        }
    }
}

// XDR Optional-Data deserialization implementation.
impl<T: Deserialize + Default> Deserialize for Option<T> {
    fn deserialize(&mut self, src: &mut XdrCursor<'_>) -> Result<(), DecodeError> {
        if deserialize::<bool>(src)? {
            *self = Some(deserialize::<T>(src)?);
        } else {
            *self = None;
        }

        Ok(())
    }
}

// Re-export public types for use in other modules
pub use crate::DeserializeStruct;
pub use crate::SerializeStruct;

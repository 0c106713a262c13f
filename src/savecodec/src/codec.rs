//! Record encoding and size resolution
//!
//! A record kind implements [`Codec`] with its field-by-field layout. Its
//! canonical size is either declared through [`Codec::encoded_size`] or
//! found by encoding a default instance ([`size_of`]).
//!
//! Placeholder data that is never interpreted simply does not implement
//! [`Codec`]; it stays as raw block bytes.

use crate::cursor::ByteCursor;
use crate::format::FormatDescriptor;
use crate::{Error, Result};

/// Field-level encode/decode of one record kind
pub trait Codec: Default {
    fn decode(cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<Self>;

    fn encode(&self, cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<()>;

    /// Declared encoded size, or `None` to compute it by trial encoding
    fn encoded_size(_format: &FormatDescriptor) -> Option<usize> {
        None
    }
}

macro_rules! scalar_codec {
    ($($ty:ty => $read:ident, $write:ident;)*) => {
        $(
            impl Codec for $ty {
                fn decode(cur: &mut ByteCursor, _format: &FormatDescriptor) -> Result<Self> {
                    cur.$read()
                }

                fn encode(&self, cur: &mut ByteCursor, _format: &FormatDescriptor) -> Result<()> {
                    cur.$write(*self)
                }

                fn encoded_size(_format: &FormatDescriptor) -> Option<usize> {
                    Some(std::mem::size_of::<$ty>())
                }
            }
        )*
    };
}

scalar_codec! {
    u8 => read_u8, write_u8;
    i8 => read_i8, write_i8;
    u16 => read_u16, write_u16;
    i16 => read_i16, write_i16;
    u32 => read_u32, write_u32;
    i32 => read_i32, write_i32;
    f32 => read_f32, write_f32;
}

/// Canonical encoded size of `T` under `format`
pub fn size_of<T: Codec>(format: &FormatDescriptor) -> Result<usize> {
    if let Some(size) = T::encoded_size(format) {
        return Ok(size);
    }
    let mut scratch = ByteCursor::new(format.endian);
    T::default().encode(&mut scratch, format)?;
    Ok(scratch.position())
}

/// Encode `record` at the cursor, returning the number of bytes written.
///
/// A declared size that disagrees with the encoder is a codec defect and
/// panics in debug builds.
pub fn encode_record<T: Codec>(
    record: &T,
    cur: &mut ByteCursor,
    format: &FormatDescriptor,
) -> Result<usize> {
    let start = cur.position();
    record.encode(cur, format)?;
    let written = cur.position() - start;

    if let Some(declared) = T::encoded_size(format) {
        debug_assert_eq!(
            declared,
            written,
            "declared size of {} on {} disagrees with its encoder",
            std::any::type_name::<T>(),
            format.code
        );
    }

    Ok(written)
}

/// Encode `record` into a fresh buffer
pub fn encode_to_vec<T: Codec>(record: &T, format: &FormatDescriptor) -> Result<Vec<u8>> {
    let mut cur = ByteCursor::new(format.endian);
    encode_record(record, &mut cur, format)?;
    Ok(cur.into_inner())
}

/// Decode a record from the start of `bytes`
pub fn decode_from_slice<T: Codec>(bytes: &[u8], format: &FormatDescriptor) -> Result<T> {
    let mut cur = ByteCursor::from_bytes(bytes, format.endian);
    T::decode(&mut cur, format)
}

/// Decode a fixed-capacity array; every slot is decoded, live or not
pub fn read_fixed_array<T: Codec>(
    cur: &mut ByteCursor,
    capacity: usize,
    format: &FormatDescriptor,
) -> Result<Vec<T>> {
    (0..capacity).map(|_| T::decode(cur, format)).collect()
}

/// Encode a fixed-capacity array, filling unused slots with default elements
pub fn write_fixed_array<T: Codec>(
    cur: &mut ByteCursor,
    items: &[T],
    capacity: usize,
    format: &FormatDescriptor,
) -> Result<()> {
    if items.len() > capacity {
        return Err(Error::CapacityExceeded {
            capacity,
            actual: items.len(),
        });
    }
    for item in items {
        item.encode(cur, format)?;
    }
    let filler = T::default();
    for _ in items.len()..capacity {
        filler.encode(cur, format)?;
    }
    Ok(())
}

/// Decode an array preceded by its u32 element count
pub fn read_prefixed_array<T: Codec>(
    cur: &mut ByteCursor,
    format: &FormatDescriptor,
) -> Result<Vec<T>> {
    let count = cur.read_u32()? as usize;
    let mut items = Vec::new();
    for _ in 0..count {
        items.push(T::decode(cur, format)?);
    }
    Ok(items)
}

/// Encode an array preceded by its u32 element count
pub fn write_prefixed_array<T: Codec>(
    cur: &mut ByteCursor,
    items: &[T],
    format: &FormatDescriptor,
) -> Result<()> {
    cur.write_u32(items.len() as u32)?;
    for item in items {
        item.encode(cur, format)?;
    }
    Ok(())
}

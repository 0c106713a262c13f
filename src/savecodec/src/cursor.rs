//! Endian-aware byte cursor
//!
//! [`ByteCursor`] owns a byte buffer and a position. Reads past the end and
//! writes past a fixed buffer's capacity fail with [`Error::BufferOverrun`];
//! a dynamic buffer grows instead.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use memchr::memchr;
use serde::{Deserialize, Serialize};

use crate::{align_up, Error, Result};

/// Byte order of multi-byte fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

macro_rules! scalar_io {
    ($($read:ident, $write:ident, $ty:ty, $size:expr, $bo_read:ident, $bo_write:ident;)*) => {
        $(
            #[doc = concat!("Read a `", stringify!($ty), "` in the cursor's byte order")]
            pub fn $read(&mut self) -> Result<$ty> {
                let endian = self.endian;
                let bytes = self.take($size)?;
                Ok(match endian {
                    Endian::Little => LittleEndian::$bo_read(bytes),
                    Endian::Big => BigEndian::$bo_read(bytes),
                })
            }

            #[doc = concat!("Write a `", stringify!($ty), "` in the cursor's byte order")]
            pub fn $write(&mut self, value: $ty) -> Result<()> {
                let endian = self.endian;
                let slot = self.slot($size)?;
                match endian {
                    Endian::Little => LittleEndian::$bo_write(slot, value),
                    Endian::Big => BigEndian::$bo_write(slot, value),
                }
                Ok(())
            }
        )*
    };
}

/// Cursor over an owned byte buffer
#[derive(Debug, Clone)]
pub struct ByteCursor {
    buf: Vec<u8>,
    pos: usize,
    endian: Endian,
    /// Offset alignment is measured from
    mark: usize,
    growable: bool,
}

impl ByteCursor {
    /// Empty buffer that grows as it is written
    pub fn new(endian: Endian) -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
            endian,
            mark: 0,
            growable: true,
        }
    }

    /// Zero-filled buffer of exactly `capacity` bytes
    pub fn fixed(capacity: usize, endian: Endian) -> Self {
        Self {
            buf: vec![0; capacity],
            pos: 0,
            endian,
            mark: 0,
            growable: false,
        }
    }

    /// Fixed-mode cursor over existing bytes, positioned at the start
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, endian: Endian) -> Self {
        Self {
            buf: bytes.into(),
            pos: 0,
            endian,
            mark: 0,
            growable: false,
        }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes between the position and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Move the position; it may not pass the end of the buffer.
    ///
    /// Seeking before the watermark moves the watermark back with it.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buf.len() {
            return Err(Error::BufferOverrun {
                offset: self.pos,
                needed: pos - self.pos,
                available: self.remaining(),
            });
        }
        self.pos = pos;
        self.mark = self.mark.min(pos);
        Ok(())
    }

    /// Set the alignment watermark to the current position
    pub fn mark(&mut self) {
        self.mark = self.pos;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Borrow `n` bytes for reading and advance past them
    fn take(&mut self, n: usize) -> Result<&[u8]> {
        if n > self.remaining() {
            return Err(Error::BufferOverrun {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.buf[start..start + n])
    }

    /// Borrow `n` bytes for writing and advance past them
    fn slot(&mut self, n: usize) -> Result<&mut [u8]> {
        let end = self.pos + n;
        if end > self.buf.len() {
            if !self.growable {
                return Err(Error::BufferOverrun {
                    offset: self.pos,
                    needed: n,
                    available: self.remaining(),
                });
            }
            self.buf.resize(end, 0);
        }
        let start = self.pos;
        self.pos = end;
        Ok(&mut self.buf[start..end])
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.slot(1)?[0] = value;
        Ok(())
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_u8(value as u8)
    }

    scalar_io! {
        read_u16, write_u16, u16, 2, read_u16, write_u16;
        read_i16, write_i16, i16, 2, read_i16, write_i16;
        read_u32, write_u32, u32, 4, read_u32, write_u32;
        read_i32, write_i32, i32, 4, read_i32, write_i32;
        read_u64, write_u64, u64, 8, read_u64, write_u64;
        read_i64, write_i64, i64, 8, read_i64, write_i64;
        read_f32, write_f32, f32, 4, read_f32, write_f32;
        read_f64, write_f64, f64, 8, read_f64, write_f64;
    }

    /// Read a boolean stored in `width` bytes (1-8); any nonzero byte is true
    pub fn read_bool(&mut self, width: usize) -> Result<bool> {
        check_bool_width(width)?;
        Ok(self.take(width)?.iter().any(|&b| b != 0))
    }

    /// Write a boolean as a `width`-byte integer 0 or 1 in the cursor's byte order
    pub fn write_bool(&mut self, value: bool, width: usize) -> Result<()> {
        check_bool_width(width)?;
        let endian = self.endian;
        let slot = self.slot(width)?;
        slot.fill(0);
        if value {
            match endian {
                Endian::Little => slot[0] = 1,
                Endian::Big => slot[width - 1] = 1,
            }
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.slot(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Skip `n` bytes on read
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Write `n` zero bytes
    pub fn pad(&mut self, n: usize) -> Result<()> {
        self.slot(n)?.fill(0);
        Ok(())
    }

    /// Skip forward to the next multiple of `n` from the watermark
    pub fn skip_align(&mut self, n: usize) -> Result<()> {
        let target = self.aligned(n);
        self.skip(target - self.pos)
    }

    /// Zero-fill forward to the next multiple of `n` from the watermark
    pub fn pad_align(&mut self, n: usize) -> Result<()> {
        let target = self.aligned(n);
        self.pad(target - self.pos)
    }

    fn aligned(&self, n: usize) -> usize {
        self.mark + align_up(self.pos - self.mark, n)
    }

    /// Read a string that runs up to a null terminator (consumed, not returned)
    pub fn read_cstring(&mut self) -> Result<String> {
        let rest = &self.buf[self.pos..];
        let end = memchr(0, rest).ok_or(Error::BufferOverrun {
            offset: self.pos,
            needed: rest.len() + 1,
            available: rest.len(),
        })?;
        let bytes = self.take(end + 1)?;
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    pub fn write_cstring(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())?;
        self.write_u8(0)
    }

    /// Read a fixed-width string field, dropping everything from the first null
    pub fn read_string(&mut self, width: usize) -> Result<String> {
        let bytes = self.take(width)?;
        let end = memchr(0, bytes).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Write a fixed-width string field; longer strings are cut to `width`
    pub fn write_string(&mut self, value: &str, width: usize) -> Result<()> {
        let bytes = value.as_bytes();
        let len = bytes.len().min(width);
        let slot = self.slot(width)?;
        slot[..len].copy_from_slice(&bytes[..len]);
        slot[len..].fill(0);
        Ok(())
    }

    /// Read a fixed-width UTF-16 field of `chars` code units
    pub fn read_wide_string(&mut self, chars: usize) -> Result<String> {
        let mut units = Vec::with_capacity(chars);
        for _ in 0..chars {
            units.push(self.read_u16()?);
        }
        let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
        Ok(String::from_utf16_lossy(&units[..end]))
    }

    /// Write a fixed-width UTF-16 field of `chars` code units
    pub fn write_wide_string(&mut self, value: &str, chars: usize) -> Result<()> {
        let mut units: Vec<u16> = value.encode_utf16().take(chars).collect();
        units.resize(chars, 0);
        for unit in units {
            self.write_u16(unit)?;
        }
        Ok(())
    }
}

fn check_bool_width(width: usize) -> Result<()> {
    if (1..=8).contains(&width) {
        Ok(())
    } else {
        Err(Error::InvalidBoolWidth(width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endianness() {
        let mut cur = ByteCursor::new(Endian::Little);
        cur.write_u32(0x11223344).unwrap();
        assert_eq!(cur.as_slice(), &[0x44, 0x33, 0x22, 0x11]);

        let mut cur = ByteCursor::new(Endian::Big);
        cur.write_u32(0x11223344).unwrap();
        cur.write_i16(-2).unwrap();
        assert_eq!(cur.as_slice(), &[0x11, 0x22, 0x33, 0x44, 0xff, 0xfe]);

        let mut cur = ByteCursor::from_bytes(cur.into_inner(), Endian::Big);
        assert_eq!(cur.read_u32().unwrap(), 0x11223344);
        assert_eq!(cur.read_i16().unwrap(), -2);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn test_floats() {
        let mut cur = ByteCursor::new(Endian::Big);
        cur.write_f32(1.5).unwrap();
        cur.write_f64(-0.25).unwrap();

        let mut cur = ByteCursor::from_bytes(cur.into_inner(), Endian::Big);
        assert_eq!(cur.read_f32().unwrap(), 1.5);
        assert_eq!(cur.read_f64().unwrap(), -0.25);
    }

    #[test]
    fn test_read_overrun() {
        let mut cur = ByteCursor::from_bytes(vec![1, 2, 3], Endian::Little);
        let err = cur.read_u32().unwrap_err();
        assert!(matches!(
            err,
            Error::BufferOverrun {
                offset: 0,
                needed: 4,
                available: 3
            }
        ));
        // A failed read leaves the position alone
        assert_eq!(cur.position(), 0);
        assert_eq!(cur.read_u16().unwrap(), 0x0201);
    }

    #[test]
    fn test_fixed_write_overrun() {
        let mut cur = ByteCursor::fixed(6, Endian::Little);
        cur.write_u32(7).unwrap();
        assert!(matches!(
            cur.write_u32(8),
            Err(Error::BufferOverrun { offset: 4, .. })
        ));
        cur.write_u16(9).unwrap();
        assert_eq!(cur.as_slice(), &[7, 0, 0, 0, 9, 0]);
    }

    #[test]
    fn test_dynamic_write_grows() {
        let mut cur = ByteCursor::new(Endian::Little);
        cur.write_u64(1).unwrap();
        cur.write_u8(2).unwrap();
        assert_eq!(cur.len(), 9);
        assert_eq!(cur.position(), 9);
    }

    #[test]
    fn test_bool_widths() {
        let mut cur = ByteCursor::new(Endian::Big);
        cur.write_bool(true, 1).unwrap();
        cur.write_bool(true, 4).unwrap();
        cur.write_bool(false, 2).unwrap();
        assert_eq!(cur.as_slice(), &[1, 0, 0, 0, 1, 0, 0]);

        let mut cur = ByteCursor::from_bytes(cur.into_inner(), Endian::Big);
        assert!(cur.read_bool(1).unwrap());
        assert!(cur.read_bool(4).unwrap());
        assert!(!cur.read_bool(2).unwrap());

        assert!(matches!(
            ByteCursor::new(Endian::Little).write_bool(true, 0),
            Err(Error::InvalidBoolWidth(0))
        ));
        assert!(matches!(
            ByteCursor::new(Endian::Little).read_bool(9),
            Err(Error::InvalidBoolWidth(9))
        ));
    }

    #[test]
    fn test_fixed_strings() {
        let mut cur = ByteCursor::new(Endian::Little);
        cur.write_string("ABC", 6).unwrap();
        cur.write_string("TOOLONGNAME", 4).unwrap();
        assert_eq!(cur.as_slice(), b"ABC\0\0\0TOOL");

        let mut cur = ByteCursor::from_bytes(cur.into_inner(), Endian::Little);
        assert_eq!(cur.read_string(6).unwrap(), "ABC");
        assert_eq!(cur.read_string(4).unwrap(), "TOOL");
    }

    #[test]
    fn test_fixed_string_ignores_bytes_after_null() {
        let mut cur = ByteCursor::from_bytes(b"AB\0garbage".to_vec(), Endian::Little);
        assert_eq!(cur.read_string(10).unwrap(), "AB");
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn test_cstring() {
        let mut cur = ByteCursor::new(Endian::Little);
        cur.write_cstring("main").unwrap();
        cur.write_u8(0xAA).unwrap();

        let mut cur = ByteCursor::from_bytes(cur.into_inner(), Endian::Little);
        assert_eq!(cur.read_cstring().unwrap(), "main");
        assert_eq!(cur.read_u8().unwrap(), 0xAA);

        let mut cur = ByteCursor::from_bytes(b"open".to_vec(), Endian::Little);
        assert!(matches!(
            cur.read_cstring(),
            Err(Error::BufferOverrun { .. })
        ));
    }

    #[test]
    fn test_wide_strings() {
        let mut cur = ByteCursor::new(Endian::Big);
        cur.write_wide_string("Hi", 4).unwrap();
        assert_eq!(cur.as_slice(), &[0, b'H', 0, b'i', 0, 0, 0, 0]);

        let mut cur = ByteCursor::from_bytes(cur.into_inner(), Endian::Big);
        assert_eq!(cur.read_wide_string(4).unwrap(), "Hi");
    }

    #[test]
    fn test_align_from_any_position() {
        for start in 0..9 {
            let mut cur = ByteCursor::new(Endian::Little);
            cur.pad(start).unwrap();
            cur.pad_align(4).unwrap();
            assert_eq!(cur.position() % 4, 0);
            assert!(cur.position() - start < 4);
            assert!(cur.as_slice().iter().all(|&b| b == 0));
        }

        for start in 0..9 {
            let mut cur = ByteCursor::from_bytes(vec![0xFF; 16], Endian::Little);
            cur.skip(start).unwrap();
            cur.skip_align(4).unwrap();
            assert_eq!(cur.position() % 4, 0);
        }
    }

    #[test]
    fn test_align_relative_to_mark() {
        let mut cur = ByteCursor::new(Endian::Little);
        cur.write_u8(1).unwrap();
        cur.mark();
        cur.write_u8(2).unwrap();
        cur.pad_align(4).unwrap();
        assert_eq!(cur.position(), 5);
    }

    #[test]
    fn test_pad_align_zero_fills_existing_bytes() {
        let mut cur = ByteCursor::from_bytes(vec![0xFF; 8], Endian::Little);
        cur.write_u8(1).unwrap();
        cur.pad_align(4).unwrap();
        assert_eq!(&cur.as_slice()[..4], &[1, 0, 0, 0]);
        assert_eq!(cur.as_slice()[4], 0xFF);
    }

    #[test]
    fn test_seek() {
        let mut cur = ByteCursor::from_bytes(vec![0; 4], Endian::Little);
        cur.seek(4).unwrap();
        assert_eq!(cur.remaining(), 0);
        assert!(cur.seek(5).is_err());
    }

    #[test]
    fn test_seek_before_mark_then_align() {
        let mut cur = ByteCursor::new(Endian::Little);
        cur.pad(8).unwrap();
        cur.mark();
        cur.seek(2).unwrap();

        cur.pad_align(4).unwrap();
        assert_eq!(cur.position(), 2);

        cur.write_u8(7).unwrap();
        cur.pad_align(4).unwrap();
        assert_eq!(cur.position(), 6);
        cur.seek(0).unwrap();
        cur.skip_align(4).unwrap();
        assert_eq!(cur.position(), 0);
    }
}

//! Tagged block framing
//!
//! A block is an ASCII tag, an optional u32 length field and a payload.
//! Blocks with a length field are padded to the next 4-byte boundary of the
//! stream. Blocks without one take their length from the caller (see
//! [`crate::detect::marker_offsets`]) and are not padded.
//!
//! Framing runs over any [`Source`]/[`Sink`], so the same code drives an
//! in-memory [`ByteCursor`] and the staging window engine.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::cursor::{ByteCursor, Endian};
use crate::{align_up, Error, Result};

/// Size of the length field following a tag
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Convention for the length stored after a block tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthField {
    /// No length field; the length is known externally
    None,
    /// Length counts the payload only
    Exclusive,
    /// Length counts tag, length field and payload
    Inclusive,
}

impl LengthField {
    fn is_present(self) -> bool {
        self != LengthField::None
    }
}

/// A tagged block with its raw payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub tag: String,
    pub payload: Vec<u8>,
}

impl Block {
    pub fn new(tag: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            tag: tag.into(),
            payload,
        }
    }
}

/// Sequential byte source blocks are read from
pub trait Source {
    /// Take exactly `n` bytes
    fn take_bytes(&mut self, n: usize) -> Result<Vec<u8>>;
    /// Logical stream position
    fn position(&self) -> usize;
    /// Bytes left before the end of the source
    fn remaining(&self) -> usize;
}

/// Sequential byte sink blocks are written to
pub trait Sink {
    fn put_bytes(&mut self, bytes: &[u8]) -> Result<()>;
    /// Logical stream position
    fn position(&self) -> usize;
}

impl Source for ByteCursor {
    fn take_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.read_bytes(n)
    }

    fn position(&self) -> usize {
        ByteCursor::position(self)
    }

    fn remaining(&self) -> usize {
        ByteCursor::remaining(self)
    }
}

impl Sink for ByteCursor {
    fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_bytes(bytes)
    }

    fn position(&self) -> usize {
        ByteCursor::position(self)
    }
}

/// Read one block, checking its tag against `tag`.
///
/// `known_len` supplies the payload length when `length` is
/// [`LengthField::None`]; without it the payload runs to the end of the source.
pub fn read_block<S: Source + ?Sized>(
    src: &mut S,
    tag: &str,
    length: LengthField,
    known_len: Option<usize>,
    endian: Endian,
) -> Result<Block> {
    let found = src.take_bytes(tag.len())?;
    if found != tag.as_bytes() {
        return Err(Error::BlockTagMismatch {
            expected: tag.to_string(),
            found: String::from_utf8_lossy(&found).into_owned(),
        });
    }

    let declared = match length {
        LengthField::None => known_len.unwrap_or_else(|| src.remaining()),
        LengthField::Exclusive => read_length(src, endian)? as usize,
        LengthField::Inclusive => {
            let header = tag.len() + LENGTH_FIELD_SIZE;
            let total = read_length(src, endian)? as usize;
            total.checked_sub(header).ok_or_else(|| Error::TruncatedBlock {
                tag: tag.to_string(),
                declared: total,
                available: header,
            })?
        }
    };

    if declared > src.remaining() {
        return Err(Error::TruncatedBlock {
            tag: tag.to_string(),
            declared,
            available: src.remaining(),
        });
    }
    let payload = src.take_bytes(declared)?;

    if length.is_present() {
        let pos = src.position();
        let pad = (align_up(pos, 4) - pos).min(src.remaining());
        src.take_bytes(pad)?;
    }

    Ok(Block::new(tag, payload))
}

/// Write one block, returning the number of bytes emitted
pub fn write_block<S: Sink + ?Sized>(
    dst: &mut S,
    tag: &str,
    payload: &[u8],
    length: LengthField,
    endian: Endian,
) -> Result<usize> {
    let start = dst.position();
    dst.put_bytes(tag.as_bytes())?;

    match length {
        LengthField::None => {}
        LengthField::Exclusive => write_length(dst, payload.len(), endian)?,
        LengthField::Inclusive => write_length(
            dst,
            tag.len() + LENGTH_FIELD_SIZE + payload.len(),
            endian,
        )?,
    }
    dst.put_bytes(payload)?;

    if length.is_present() {
        let pos = dst.position();
        dst.put_bytes(&[0; 3][..align_up(pos, 4) - pos])?;
    }

    Ok(dst.position() - start)
}

fn read_length<S: Source + ?Sized>(src: &mut S, endian: Endian) -> Result<u32> {
    let bytes = src.take_bytes(LENGTH_FIELD_SIZE)?;
    Ok(match endian {
        Endian::Little => LittleEndian::read_u32(&bytes),
        Endian::Big => BigEndian::read_u32(&bytes),
    })
}

fn write_length<S: Sink + ?Sized>(dst: &mut S, len: usize, endian: Endian) -> Result<()> {
    let mut bytes = [0u8; LENGTH_FIELD_SIZE];
    match endian {
        Endian::Little => LittleEndian::write_u32(&mut bytes, len as u32),
        Endian::Big => BigEndian::write_u32(&mut bytes, len as u32),
    }
    dst.put_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_block_layout() {
        let mut cur = ByteCursor::new(Endian::Little);
        let written =
            write_block(&mut cur, "SIMP", &[1, 2, 3, 4, 5], LengthField::Exclusive, Endian::Little)
                .unwrap();

        assert_eq!(written, 16);
        assert_eq!(
            cur.as_slice(),
            &[b'S', b'I', b'M', b'P', 5, 0, 0, 0, 1, 2, 3, 4, 5, 0, 0, 0]
        );

        let mut cur = ByteCursor::from_bytes(cur.into_inner(), Endian::Little);
        let block = read_block(&mut cur, "SIMP", LengthField::Exclusive, None, Endian::Little)
            .unwrap();
        assert_eq!(block.payload, vec![1, 2, 3, 4, 5]);
        assert_eq!(cur.position(), 16);
    }

    #[test]
    fn test_inclusive_block_layout() {
        let mut cur = ByteCursor::new(Endian::Big);
        write_block(&mut cur, "BLOCK", &[0xAA; 6], LengthField::Inclusive, Endian::Big).unwrap();

        // 5 tag + 4 length + 6 payload = 15, padded to 16
        assert_eq!(&cur.as_slice()[5..9], &[0, 0, 0, 15]);
        assert_eq!(cur.len(), 16);

        let mut cur = ByteCursor::from_bytes(cur.into_inner(), Endian::Big);
        let block =
            read_block(&mut cur, "BLOCK", LengthField::Inclusive, None, Endian::Big).unwrap();
        assert_eq!(block.payload, vec![0xAA; 6]);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn test_inferred_length_block() {
        let mut cur = ByteCursor::new(Endian::Little);
        write_block(&mut cur, "BLOCK", &[7; 3], LengthField::None, Endian::Little).unwrap();
        write_block(&mut cur, "BLOCK", &[8; 2], LengthField::None, Endian::Little).unwrap();
        assert_eq!(cur.len(), 15);

        let mut cur = ByteCursor::from_bytes(cur.into_inner(), Endian::Little);
        let first =
            read_block(&mut cur, "BLOCK", LengthField::None, Some(3), Endian::Little).unwrap();
        let second =
            read_block(&mut cur, "BLOCK", LengthField::None, None, Endian::Little).unwrap();
        assert_eq!(first.payload, vec![7; 3]);
        assert_eq!(second.payload, vec![8; 2]);
    }

    #[test]
    fn test_tag_mismatch() {
        let mut cur = ByteCursor::new(Endian::Little);
        write_block(&mut cur, "XXXX", &[0; 4], LengthField::Exclusive, Endian::Little).unwrap();

        let mut cur = ByteCursor::from_bytes(cur.into_inner(), Endian::Little);
        let err = read_block(&mut cur, "SIMP", LengthField::Exclusive, None, Endian::Little)
            .unwrap_err();
        match err {
            Error::BlockTagMismatch { expected, found } => {
                assert_eq!(expected, "SIMP");
                assert_eq!(found, "XXXX");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncated_block() {
        let mut bytes = b"GRGE".to_vec();
        bytes.extend_from_slice(&100u32.to_le_bytes());
        bytes.extend_from_slice(&[0; 10]);

        let mut cur = ByteCursor::from_bytes(bytes, Endian::Little);
        let err = read_block(&mut cur, "GRGE", LengthField::Exclusive, None, Endian::Little)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedBlock {
                declared: 100,
                available: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_inclusive_length_smaller_than_header() {
        let mut bytes = b"BLOCK".to_vec();
        bytes.extend_from_slice(&4u32.to_be_bytes());

        let mut cur = ByteCursor::from_bytes(bytes, Endian::Big);
        assert!(matches!(
            read_block(&mut cur, "BLOCK", LengthField::Inclusive, None, Endian::Big),
            Err(Error::TruncatedBlock { .. })
        ));
    }

    #[test]
    fn test_unpadded_final_block_is_accepted() {
        let mut bytes = b"OVER".to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.push(9);

        let mut cur = ByteCursor::from_bytes(bytes, Endian::Little);
        let block =
            read_block(&mut cur, "OVER", LengthField::Exclusive, None, Endian::Little).unwrap();
        assert_eq!(block.payload, vec![9]);
    }
}

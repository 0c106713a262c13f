//! # savecodec
//!
//! Codec for block-structured console/PC game saves.
//!
//! Save images are a sequence of blocks streamed through a bounded staging
//! window, padded to a fixed size and closed by a byte-sum checksum.
//!
//! # Format Overview
//!
//! ## Marker framing (`BLOCK`)
//!
//! - Bytes 0-3: Header word (platform endianness)
//! - Repeated: `"BLOCK"` marker, optional u32 length, payload
//! - Zero padding up to `file_size - 4`
//! - Last 4 bytes: Checksum
//!
//! Block lengths are either stored after the marker or recovered by scanning
//! for the next marker, with the final block using a known size.
//!
//! ## Tagged framing (`SIMP`, `SRPT`, ...)
//!
//! - Repeated: 4-byte tag, u32 payload length, payload, pad to 4 bytes
//! - Zero padding up to `file_size - 4`
//! - Last 4 bytes: Checksum
//!
//! ## Example
//!
//! ```no_run
//! use savecodec::records::SimpleVariables;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut save = savecodec::load_file("GTASAsf1.b", None)?;
//! println!("Format: {}", save.format().name);
//!
//! let mut vars: SimpleVariables = save.decode_block(0)?;
//! vars.brightness = 384;
//! save.replace_block(0, &vars)?;
//!
//! savecodec::save_file(&save, "GTASAsf1.b")?;
//! # Ok(())
//! # }
//! ```

pub mod block;
pub mod codec;
pub mod config;
pub mod cursor;
pub mod detect;
pub mod format;
pub mod records;
pub mod save;
pub mod staging;

#[doc(inline)]
pub use block::{read_block, write_block, Block, LengthField};
#[doc(inline)]
pub use codec::{decode_from_slice, encode_record, encode_to_vec, size_of, Codec};
#[doc(inline)]
pub use config::Config;
#[doc(inline)]
pub use cursor::{ByteCursor, Endian};
#[doc(inline)]
pub use detect::detect_format;
#[doc(inline)]
pub use format::{
    format_by_code, Capabilities, ConsoleFamily, Detection, FormatDescriptor, FormatId, Framing,
    FORMATS,
};
#[doc(inline)]
pub use records::Record;
#[doc(inline)]
pub use save::{load_file, save_file, SaveFile};
#[doc(inline)]
pub use staging::{Checksum, StagingReader, StagingWriter};

/// Errors from save decoding and encoding
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Buffer overrun at offset {offset}: need {needed} bytes, {available} available")]
    BufferOverrun {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Block tag mismatch: expected {expected:?}, found {found:?}")]
    BlockTagMismatch { expected: String, found: String },

    #[error("Truncated block {tag:?}: declared {declared} bytes, {available} available")]
    TruncatedBlock {
        tag: String,
        declared: usize,
        available: usize,
    },

    #[error("Truncated source: need {needed} bytes, {available} available")]
    TruncatedSource { needed: usize, available: usize },

    #[error("Unrecognized save format (leading word 0x{0:08x})")]
    UnrecognizedFormat(u32),

    #[error("Unknown format code: {0}")]
    UnknownFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid boolean width: {0} (expected 1-8)")]
    InvalidBoolWidth(usize),

    #[error("Fixed array overflow: capacity {capacity}, got {actual} elements")]
    CapacityExceeded { capacity: usize, actual: usize },

    #[error("Block count mismatch: expected {expected}, got {actual}")]
    BlockCount { expected: usize, actual: usize },

    #[error("Block {index} size mismatch: expected {expected} bytes, got {actual}")]
    BlockSize {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Block {index} payload contains the block marker")]
    MarkerInPayload { index: usize },

    #[error("Encoded save is {actual} bytes, exceeds fixed size {limit}")]
    ExceedsFileSize { limit: usize, actual: usize },

    #[error("Checksum mismatch: stored 0x{stored:08x}, computed 0x{computed:08x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("Failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("No block at index {index} (save has {count})")]
    MissingBlock { index: usize, count: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Round `value` up to the next multiple of `align`
#[inline]
pub(crate) fn align_up(value: usize, align: usize) -> usize {
    if align <= 1 {
        return value;
    }
    value.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 4), 0);
        assert_eq!(align_up(1, 4), 4);
        assert_eq!(align_up(4, 4), 4);
        assert_eq!(align_up(9, 4), 12);
        assert_eq!(align_up(7, 1), 7);
        assert_eq!(align_up(7, 0), 7);
    }

    #[test]
    fn test_error_messages() {
        let err = Error::BlockTagMismatch {
            expected: "SIMP".into(),
            found: "XXXX".into(),
        };
        assert_eq!(
            err.to_string(),
            "Block tag mismatch: expected \"SIMP\", found \"XXXX\""
        );

        let err = Error::UnrecognizedFormat(0xdeadbeef);
        assert!(err.to_string().contains("0xdeadbeef"));
    }
}

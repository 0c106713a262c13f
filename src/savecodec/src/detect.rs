//! Save format detection
//!
//! Walks [`FORMATS`] in order and returns the first descriptor whose
//! heuristic matches. Uses memchr for marker scanning.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use memchr::memmem;

use crate::cursor::Endian;
use crate::format::{Detection, FormatDescriptor, BLOCK_MARKER, FORMATS};
use crate::{Error, Result};

/// Detect the format of a complete save image
pub fn detect_format(bytes: &[u8]) -> Result<&'static FormatDescriptor> {
    let lead = leading_word(bytes);
    let mut markers: Option<usize> = None;

    for format in FORMATS {
        let hit = match format.detection {
            Detection::LeadingWord(word) => lead == Some(word),
            Detection::MarkerCount { leading, count } => {
                lead == Some(leading)
                    && count.map_or(true, |expected| {
                        *markers.get_or_insert_with(|| count_markers(bytes)) == expected
                    })
            }
            Detection::FirstBlock { tag, size } => {
                first_block_len(bytes, tag, format.endian) == Some(size)
            }
        };

        if hit {
            tracing::debug!(
                format = format.code,
                markers = ?markers,
                "detected save format"
            );
            return Ok(format);
        }
    }

    Err(Error::UnrecognizedFormat(lead.unwrap_or(0)))
}

/// First 32-bit word, read little-endian
pub fn leading_word(bytes: &[u8]) -> Option<u32> {
    bytes.get(..4).map(LittleEndian::read_u32)
}

/// Offsets of every block marker in `bytes`
pub fn marker_offsets(bytes: &[u8]) -> Vec<usize> {
    memmem::find_iter(bytes, BLOCK_MARKER).collect()
}

/// Number of block markers in `bytes`
pub fn count_markers(bytes: &[u8]) -> usize {
    memmem::find_iter(bytes, BLOCK_MARKER).count()
}

/// Payload lengths of marker blocks that carry no length field.
///
/// Each payload runs up to the next marker. The last block is followed by
/// padding rather than a marker, so its length is `final_size`.
pub fn inferred_payload_lengths(offsets: &[usize], final_size: usize) -> Vec<usize> {
    let mut lengths: Vec<usize> = offsets
        .windows(2)
        .map(|pair| pair[1] - pair[0] - BLOCK_MARKER.len())
        .collect();
    if !offsets.is_empty() {
        lengths.push(final_size);
    }
    lengths
}

fn first_block_len(bytes: &[u8], tag: &str, endian: Endian) -> Option<usize> {
    if !bytes.starts_with(tag.as_bytes()) {
        return None;
    }
    let field = bytes.get(tag.len()..tag.len() + 4)?;
    let len = match endian {
        Endian::Little => LittleEndian::read_u32(field),
        Endian::Big => BigEndian::read_u32(field),
    };
    Some(len as usize)
}

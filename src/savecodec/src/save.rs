//! Whole-save load and store
//!
//! A [`SaveFile`] holds the raw blocks of one image. Loading resolves the
//! format, streams the blocks through a [`StagingReader`] and verifies the
//! trailing checksum; saving streams them back through a [`StagingWriter`],
//! pads to the fixed file size and appends the checksum.

use std::fs::{self, File};
use std::io::{self, Read, Seek, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::block::{read_block, write_block, Block, LengthField};
use crate::codec::{decode_from_slice, encode_to_vec, Codec};
use crate::config::Config;
use crate::cursor::{ByteCursor, Endian};
use crate::detect::{count_markers, detect_format, inferred_payload_lengths, marker_offsets};
use crate::format::{FormatDescriptor, FormatId, Framing};
use crate::records::Record;
use crate::staging::{StagingReader, StagingWriter};
use crate::{Error, Result};

/// Tag of every block in marker-framed saves
pub const BLOCK_TAG: &str = "BLOCK";

/// A decoded save image
#[derive(Debug, Clone, PartialEq)]
pub struct SaveFile {
    format: &'static FormatDescriptor,
    header: u32,
    blocks: Vec<Block>,
    checksum: u32,
}

impl SaveFile {
    /// Assemble a save from raw blocks
    pub fn new(format: FormatId, blocks: Vec<Block>) -> Self {
        let format = format.descriptor();
        let header = match format.framing {
            Framing::Marker { header, .. } => header,
            Framing::Tagged { .. } => 0,
        };
        Self {
            format,
            header,
            blocks,
            checksum: 0,
        }
    }

    /// Decode a complete image
    pub fn from_bytes(data: &[u8], config: &Config) -> Result<Self> {
        let format = match config.format {
            Some(id) => id.descriptor(),
            None => detect_format(data)?,
        };
        if data.len() != format.file_size {
            tracing::warn!(
                format = format.code,
                expected = format.file_size,
                actual = data.len(),
                "unexpected save size"
            );
        }

        let mut reader = StagingReader::new(io::Cursor::new(data), format.window_size, format.endian)?;
        let (header, blocks) = match format.framing {
            Framing::Marker {
                length,
                final_block_size,
                ..
            } => read_marker_blocks(&mut reader, data, format, length, final_block_size)?,
            Framing::Tagged { tags } => (0, read_tagged_blocks(&mut reader, format, tags)?),
        };

        let checksum_at = reader.source_len().checked_sub(4).ok_or(Error::TruncatedSource {
            needed: 4,
            available: reader.remaining(),
        })?;
        reader.skip_to(checksum_at)?;
        let computed = reader.checksum();
        let stored = reader.read_checksum()?;

        if stored != computed {
            if config.strict_checksum {
                return Err(Error::ChecksumMismatch { stored, computed });
            }
            tracing::warn!(stored, computed, "save checksum mismatch");
        }

        tracing::debug!(format = format.code, blocks = blocks.len(), "loaded save");
        Ok(Self {
            format,
            header,
            blocks,
            checksum: stored,
        })
    }

    /// Read and decode an image from any reader
    pub fn read_from<R: Read>(mut reader: R, config: &Config) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data, config)
    }

    /// Encode into a complete image of `file_size` bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.encode_with_window(Vec::with_capacity(self.format.file_size), self.format.window_size)
    }

    /// Stream the encoded image into `writer` through the staging window
    pub fn write_to<W: Write>(&self, writer: W) -> Result<W> {
        self.encode_with_window(writer, self.format.window_size)
    }

    fn encode_with_window<W: Write>(&self, sink: W, window_size: usize) -> Result<W> {
        let format = self.format;
        if self.blocks.len() != format.block_count {
            return Err(Error::BlockCount {
                expected: format.block_count,
                actual: self.blocks.len(),
            });
        }

        let mut writer = StagingWriter::new(sink, window_size, format.endian);
        match format.framing {
            Framing::Marker {
                length,
                final_block_size,
                ..
            } => {
                writer.write(&encode_word(self.header, format.endian))?;
                for (index, block) in self.blocks.iter().enumerate() {
                    check_marker_block(index, block, length, final_block_size, format)?;
                    write_block(&mut writer, BLOCK_TAG, &block.payload, length, format.endian)?;
                }
            }
            Framing::Tagged { tags } => {
                for (&tag, block) in tags.iter().zip(&self.blocks) {
                    if block.tag != tag {
                        return Err(Error::BlockTagMismatch {
                            expected: tag.to_string(),
                            found: block.tag.clone(),
                        });
                    }
                    write_block(&mut writer, tag, &block.payload, LengthField::Exclusive, format.endian)?;
                }
            }
        }

        writer.pad_to(format.checksum_offset())?;
        writer.flush(true)?;
        tracing::debug!(format = format.code, checksum = writer.checksum(), "encoded save");
        writer.finish()
    }

    pub fn format(&self) -> &'static FormatDescriptor {
        self.format
    }

    /// Header word of marker-framed saves (0 for tagged saves)
    pub fn header(&self) -> u32 {
        self.header
    }

    /// Checksum stored in the loaded image
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    pub fn block(&self, index: usize) -> Result<&Block> {
        self.blocks.get(index).ok_or(Error::MissingBlock {
            index,
            count: self.blocks.len(),
        })
    }

    /// Index of the first block with `tag`
    pub fn find_block(&self, tag: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.tag == tag)
    }

    /// Decode block `index` as a `T`
    pub fn decode_block<T: Codec>(&self, index: usize) -> Result<T> {
        decode_from_slice(&self.block(index)?.payload, self.format)
    }

    /// Replace the payload of block `index` with the encoding of `record`
    pub fn replace_block<T: Codec>(&mut self, index: usize, record: &T) -> Result<()> {
        let payload = encode_to_vec(record, self.format)?;
        let count = self.blocks.len();
        let block = self
            .blocks
            .get_mut(index)
            .ok_or(Error::MissingBlock { index, count })?;
        block.payload = payload;
        Ok(())
    }

    /// Typed view of block `index` when one exists.
    ///
    /// Tagged saves dispatch on the block tag. Marker-framed blocks are all
    /// tagged `BLOCK`, so only their first block has a typed view.
    pub fn record(&self, index: usize) -> Result<Option<Record>> {
        let block = self.block(index)?;
        match self.format.framing {
            Framing::Tagged { .. } => Record::from_block(block, self.format),
            Framing::Marker { .. } if index == 0 => Ok(Some(Record::SimpleVariables(
                decode_from_slice(&block.payload, self.format)?,
            ))),
            Framing::Marker { .. } => Ok(None),
        }
    }
}

/// Load and decode a save file, detecting its format unless one is given
pub fn load_file(path: impl AsRef<Path>, format: Option<FormatId>) -> Result<SaveFile> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "loading save");
    let data = fs::read(path)?;
    SaveFile::from_bytes(
        &data,
        &Config {
            format,
            ..Config::default()
        },
    )
}

/// Encode a save and stream it to `path`
pub fn save_file(save: &SaveFile, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), format = save.format.code, "writing save");
    let file = File::create(path)?;
    save.write_to(file)?;
    Ok(())
}

fn read_marker_blocks<R: Read + Seek>(
    reader: &mut StagingReader<R>,
    data: &[u8],
    format: &FormatDescriptor,
    length: LengthField,
    final_block_size: Option<usize>,
) -> Result<(u32, Vec<Block>)> {
    let word = reader.read(4)?;
    let header = match format.endian {
        Endian::Little => LittleEndian::read_u32(&word),
        Endian::Big => BigEndian::read_u32(&word),
    };

    let lengths = if length == LengthField::None {
        let offsets = marker_offsets(data);
        if offsets.len() != format.block_count {
            return Err(Error::BlockCount {
                expected: format.block_count,
                actual: offsets.len(),
            });
        }
        inferred_payload_lengths(&offsets, final_block_size.unwrap_or(0))
            .into_iter()
            .map(Some)
            .collect()
    } else {
        vec![None; format.block_count]
    };

    let mut blocks = Vec::with_capacity(format.block_count);
    for known_len in lengths {
        blocks.push(read_block(reader, BLOCK_TAG, length, known_len, format.endian)?);
    }
    Ok((header, blocks))
}

fn read_tagged_blocks<R: Read + Seek>(
    reader: &mut StagingReader<R>,
    format: &FormatDescriptor,
    tags: &[&str],
) -> Result<Vec<Block>> {
    tags.iter()
        .map(|tag| read_block(reader, tag, LengthField::Exclusive, None, format.endian))
        .collect()
}

fn check_marker_block(
    index: usize,
    block: &Block,
    length: LengthField,
    final_block_size: Option<usize>,
    format: &FormatDescriptor,
) -> Result<()> {
    // A length byte can complete a marker with the start of the payload,
    // so scan the block as framed, not just its payload
    let mut framed = ByteCursor::new(format.endian);
    write_block(&mut framed, BLOCK_TAG, &block.payload, length, format.endian)?;
    if count_markers(framed.as_slice()) != 1 {
        return Err(Error::MarkerInPayload { index });
    }
    if length == LengthField::None && index + 1 == format.block_count {
        if let Some(expected) = final_block_size {
            if block.payload.len() != expected {
                return Err(Error::BlockSize {
                    index,
                    expected,
                    actual: block.payload.len(),
                });
            }
        }
    }
    Ok(())
}

fn encode_word(value: u32, endian: Endian) -> [u8; 4] {
    let mut bytes = [0u8; 4];
    match endian {
        Endian::Little => LittleEndian::write_u32(&mut bytes, value),
        Endian::Big => BigEndian::write_u32(&mut bytes, value),
    }
    bytes
}

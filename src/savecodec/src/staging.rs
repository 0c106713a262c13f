//! Bounded staging window I/O
//!
//! Saves are streamed through a fixed-size scratch window, the way the
//! platforms moved data between RAM and storage. Every byte that leaves the
//! window is added to a running [`Checksum`]; the checksum itself is
//! appended last and never counted.
//!
//! Invariant for both directions: bytes already moved to or from the
//! physical stream plus bytes held in the window equal the logical position.

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::block::{Sink, Source};
use crate::cursor::Endian;
use crate::{Error, Result};

/// Size of the trailing checksum field
pub const CHECKSUM_SIZE: usize = 4;

/// Running unsigned byte sum
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum(u32);

impl Checksum {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.0 = bytes
            .iter()
            .fold(self.0, |sum, &b| sum.wrapping_add(u32::from(b)));
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Checksum of a complete byte slice
    pub fn of(bytes: &[u8]) -> u32 {
        let mut sum = Self::new();
        sum.update(bytes);
        sum.value()
    }
}

fn encode_checksum(value: u32, endian: Endian) -> [u8; CHECKSUM_SIZE] {
    let mut bytes = [0u8; CHECKSUM_SIZE];
    match endian {
        Endian::Little => LittleEndian::write_u32(&mut bytes, value),
        Endian::Big => BigEndian::write_u32(&mut bytes, value),
    }
    bytes
}

/// Write side of the staging window
pub struct StagingWriter<W: Write> {
    sink: W,
    window: Vec<u8>,
    used: usize,
    flushed: usize,
    checksum: Checksum,
    endian: Endian,
}

impl<W: Write> StagingWriter<W> {
    pub fn new(sink: W, window_size: usize, endian: Endian) -> Self {
        Self {
            sink,
            window: vec![0; window_size.max(1)],
            used: 0,
            flushed: 0,
            checksum: Checksum::new(),
            endian,
        }
    }

    pub fn capacity(&self) -> usize {
        self.window.len()
    }

    /// Logical number of bytes written so far
    pub fn position(&self) -> usize {
        self.flushed + self.used
    }

    /// Sum of every byte flushed so far
    pub fn checksum(&self) -> u32 {
        self.checksum.value()
    }

    /// Copy `bytes` into the window, flushing each time it fills
    pub fn write(&mut self, mut bytes: &[u8]) -> Result<()> {
        loop {
            let room = self.capacity() - self.used;
            if bytes.len() <= room {
                self.window[self.used..self.used + bytes.len()].copy_from_slice(bytes);
                self.used += bytes.len();
                return Ok(());
            }

            self.window[self.used..].copy_from_slice(&bytes[..room]);
            self.used = self.capacity();
            self.flush_window()?;
            bytes = &bytes[room..];
        }
    }

    /// Zero-pad until the logical position reaches `total`
    pub fn pad_to(&mut self, total: usize) -> Result<()> {
        let pos = self.position();
        if pos > total {
            return Err(Error::ExceedsFileSize {
                limit: total,
                actual: pos,
            });
        }
        self.write(&vec![0; total - pos])
    }

    /// Push the window to the sink, optionally closing the stream with the checksum
    pub fn flush(&mut self, write_checksum: bool) -> Result<()> {
        if write_checksum {
            self.flush_with_checksum()?;
        } else {
            self.flush_window()?;
        }
        self.sink.flush()?;
        Ok(())
    }

    /// Flush and hand back the sink
    pub fn finish(mut self) -> Result<W> {
        self.flush(false)?;
        Ok(self.sink)
    }

    fn flush_window(&mut self) -> Result<()> {
        if self.used == 0 {
            return Ok(());
        }
        self.sink.write_all(&self.window[..self.used])?;
        self.checksum.update(&self.window[..self.used]);
        self.flushed += self.used;
        tracing::trace!(bytes = self.used, total = self.flushed, "flushed staging window");
        self.used = 0;
        Ok(())
    }

    fn flush_with_checksum(&mut self) -> Result<()> {
        if self.capacity() - self.used < CHECKSUM_SIZE {
            self.flush_window()?;
        }

        let mut total = self.checksum;
        total.update(&self.window[..self.used]);
        let field = encode_checksum(total.value(), self.endian);

        if self.capacity() < CHECKSUM_SIZE {
            // Window too small to ever hold the field
            self.flush_window()?;
            self.sink.write_all(&field)?;
            self.flushed += CHECKSUM_SIZE;
            return Ok(());
        }

        let body = self.used;
        self.window[body..body + CHECKSUM_SIZE].copy_from_slice(&field);
        self.used += CHECKSUM_SIZE;
        self.sink.write_all(&self.window[..self.used])?;
        self.checksum.update(&self.window[..body]);
        self.flushed += self.used;
        self.used = 0;

        tracing::debug!(checksum = total.value(), size = self.flushed, "wrote checksum");
        Ok(())
    }
}

impl<W: Write> Sink for StagingWriter<W> {
    fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write(bytes)
    }

    fn position(&self) -> usize {
        StagingWriter::position(self)
    }
}

/// Read side of the staging window
pub struct StagingReader<R: Read + Seek> {
    source: R,
    source_len: usize,
    window: Vec<u8>,
    filled: usize,
    cursor: usize,
    loaded: usize,
    checksum: Checksum,
    endian: Endian,
}

impl<R: Read + Seek> StagingReader<R> {
    /// Stage `source` from its start through a window of `window_size` bytes
    pub fn new(mut source: R, window_size: usize, endian: Endian) -> Result<Self> {
        let source_len = source.seek(SeekFrom::End(0))? as usize;
        source.seek(SeekFrom::Start(0))?;
        Ok(Self {
            source,
            source_len,
            window: vec![0; window_size.max(1)],
            filled: 0,
            cursor: 0,
            loaded: 0,
            checksum: Checksum::new(),
            endian,
        })
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Logical number of bytes consumed so far
    pub fn position(&self) -> usize {
        self.loaded - (self.filled - self.cursor)
    }

    pub fn remaining(&self) -> usize {
        self.source_len - self.position()
    }

    /// Sum of every byte read so far
    pub fn checksum(&self) -> u32 {
        self.checksum.value()
    }

    /// Read `n` bytes, refilling the window as often as needed
    pub fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        let bytes = self.pull(n)?;
        self.checksum.update(&bytes);
        Ok(bytes)
    }

    /// Consume bytes until the logical position reaches `pos`
    pub fn skip_to(&mut self, pos: usize) -> Result<()> {
        let current = self.position();
        if pos < current {
            return Ok(());
        }
        self.read(pos - current).map(|_| ())
    }

    /// Read the trailing checksum field without adding it to the sum
    pub fn read_checksum(&mut self) -> Result<u32> {
        let bytes = self.pull(CHECKSUM_SIZE)?;
        Ok(match self.endian {
            Endian::Little => LittleEndian::read_u32(&bytes),
            Endian::Big => BigEndian::read_u32(&bytes),
        })
    }

    fn pull(&mut self, n: usize) -> Result<Vec<u8>> {
        if n > self.remaining() {
            return Err(Error::TruncatedSource {
                needed: n,
                available: self.remaining(),
            });
        }

        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            if self.cursor == self.filled {
                self.refill()?;
            }
            let take = (self.filled - self.cursor).min(n - out.len());
            out.extend_from_slice(&self.window[self.cursor..self.cursor + take]);
            self.cursor += take;
        }
        Ok(out)
    }

    fn refill(&mut self) -> Result<()> {
        let rest = self.source_len - self.loaded;
        if rest == 0 || rest % 4 != 0 {
            // A misaligned tail is never loaded
            tracing::warn!(offset = self.loaded, rest, "refusing to refill staging window");
            return Err(Error::TruncatedSource {
                needed: self.window.len().min(rest.max(1)),
                available: 0,
            });
        }

        let n = self.window.len().min(rest);
        self.source.read_exact(&mut self.window[..n])?;
        self.filled = n;
        self.cursor = 0;
        self.loaded += n;
        tracing::trace!(bytes = n, total = self.loaded, "refilled staging window");
        Ok(())
    }
}

impl<R: Read + Seek> Source for StagingReader<R> {
    fn take_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.read(n)
    }

    fn position(&self) -> usize {
        StagingReader::position(self)
    }

    fn remaining(&self) -> usize {
        StagingReader::remaining(self)
    }
}

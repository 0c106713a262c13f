//! Platform format descriptors
//!
//! Every supported platform/version is an entry in [`FORMATS`]. A descriptor
//! is resolved once per file and passed by reference to every codec call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::block::LengthField;
use crate::cursor::Endian;
use crate::Error;

/// Marker that opens every block in marker-framed saves
pub const BLOCK_MARKER: &[u8; 5] = b"BLOCK";

/// Window size used by desktop and console builds
pub const WINDOW_SIZE: usize = 51_200;

/// Window size used by mobile builds
pub const WINDOW_SIZE_MOBILE: usize = 65_000;

/// Fixed size of a marker-framed single-slot save
pub const MARKER_FILE_SIZE: usize = 202_752;

/// Fixed size of a tagged save
pub const TAGGED_FILE_SIZE: usize = 0x18000;

/// Block sequence of tagged saves
pub const TAGGED_BLOCKS: &[&str] = &["SIMP", "SRPT", "GRGE", "PLYR", "STAT", "OVER"];

/// Supported formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatId {
    Pc,
    Mobile,
    Ps3,
    Xbox360,
    Ps2,
    Psp,
}

impl FormatId {
    pub fn descriptor(self) -> &'static FormatDescriptor {
        FORMATS
            .iter()
            .find(|f| f.id == self)
            .unwrap_or(&FORMATS[0])
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().code)
    }
}

impl FromStr for FormatId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        format_by_code(s)
            .map(|f| f.id)
            .ok_or_else(|| Error::UnknownFormat(s.to_string()))
    }
}

/// Hardware family a format belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleFamily {
    Pc,
    PlayStation,
    Xbox,
    Mobile,
}

/// Capability bit set of a format.
///
/// Record layouts branch on these rather than on format identity where the
/// difference is a platform trait shared by several formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities(pub u32);

impl Capabilities {
    pub const NONE: Self = Self(0);
    pub const MOBILE: Self = Self(1);
    pub const PS2: Self = Self(2);
    pub const PSP: Self = Self(4);
    pub const WIDE_STRINGS: Self = Self(8);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// How blocks are laid out in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Header word, then [`BLOCK_MARKER`] blocks
    Marker {
        header: u32,
        length: LengthField,
        /// Payload size of the last block when lengths are inferred
        final_block_size: Option<usize>,
    },
    /// Fixed sequence of 4-byte tags, each with an exclusive u32 length
    Tagged { tags: &'static [&'static str] },
}

/// Heuristic that recognizes a format from the start of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Leading little-endian word equals the value
    LeadingWord(u32),
    /// Leading word matches and the file holds `count` block markers
    /// (`None` accepts any count)
    MarkerCount { leading: u32, count: Option<usize> },
    /// File opens with `tag` and its payload length equals `size`
    FirstBlock { tag: &'static str, size: usize },
}

/// Layout parameters for one platform/version
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDescriptor {
    pub id: FormatId,
    pub code: &'static str,
    pub name: &'static str,
    pub family: ConsoleFamily,
    pub caps: Capabilities,
    pub endian: Endian,
    pub framing: Framing,
    pub block_count: usize,
    /// Staging window capacity
    pub window_size: usize,
    /// Exact size of the encoded image, checksum included
    pub file_size: usize,
    pub detection: Detection,
}

impl FormatDescriptor {
    pub fn is_mobile(&self) -> bool {
        self.caps.contains(Capabilities::MOBILE)
    }

    pub fn is_ps2(&self) -> bool {
        self.caps.contains(Capabilities::PS2)
    }

    pub fn is_psp(&self) -> bool {
        self.caps.contains(Capabilities::PSP)
    }

    pub fn has_wide_strings(&self) -> bool {
        self.caps.contains(Capabilities::WIDE_STRINGS)
    }

    /// Offset of the trailing checksum field
    pub fn checksum_offset(&self) -> usize {
        self.file_size - 4
    }
}

/// All supported formats, in detection order
pub const FORMATS: &[FormatDescriptor] = &[
    FormatDescriptor {
        id: FormatId::Pc,
        code: "PC",
        name: "PC",
        family: ConsoleFamily::Pc,
        caps: Capabilities::WIDE_STRINGS,
        endian: Endian::Little,
        framing: Framing::Marker {
            header: 0x39,
            length: LengthField::None,
            final_block_size: Some(0x40),
        },
        block_count: 28,
        window_size: WINDOW_SIZE,
        file_size: MARKER_FILE_SIZE,
        detection: Detection::LeadingWord(0x39),
    },
    FormatDescriptor {
        id: FormatId::Mobile,
        code: "Mobile",
        name: "Android/iOS",
        family: ConsoleFamily::Mobile,
        caps: Capabilities::MOBILE.union(Capabilities::WIDE_STRINGS),
        endian: Endian::Little,
        framing: Framing::Marker {
            header: 0x3A,
            length: LengthField::None,
            final_block_size: Some(0x40),
        },
        block_count: 28,
        window_size: WINDOW_SIZE_MOBILE,
        file_size: MARKER_FILE_SIZE,
        detection: Detection::LeadingWord(0x3A),
    },
    FormatDescriptor {
        id: FormatId::Ps3,
        code: "PS3",
        name: "PlayStation 3",
        family: ConsoleFamily::PlayStation,
        caps: Capabilities::WIDE_STRINGS,
        endian: Endian::Big,
        framing: Framing::Marker {
            header: 0x38,
            length: LengthField::Inclusive,
            final_block_size: None,
        },
        block_count: 33,
        window_size: WINDOW_SIZE,
        file_size: MARKER_FILE_SIZE,
        detection: Detection::MarkerCount {
            leading: 0x3800_0000,
            count: Some(33),
        },
    },
    FormatDescriptor {
        id: FormatId::Xbox360,
        code: "Xbox360",
        name: "Xbox 360",
        family: ConsoleFamily::Xbox,
        caps: Capabilities::WIDE_STRINGS,
        endian: Endian::Big,
        framing: Framing::Marker {
            header: 0x38,
            length: LengthField::Exclusive,
            final_block_size: None,
        },
        block_count: 32,
        window_size: WINDOW_SIZE,
        file_size: MARKER_FILE_SIZE,
        detection: Detection::MarkerCount {
            leading: 0x3800_0000,
            count: None,
        },
    },
    FormatDescriptor {
        id: FormatId::Ps2,
        code: "PS2",
        name: "PlayStation 2",
        family: ConsoleFamily::PlayStation,
        caps: Capabilities::PS2,
        endian: Endian::Little,
        framing: Framing::Tagged {
            tags: TAGGED_BLOCKS,
        },
        block_count: TAGGED_BLOCKS.len(),
        window_size: TAGGED_FILE_SIZE,
        file_size: TAGGED_FILE_SIZE,
        detection: Detection::FirstBlock {
            tag: "SIMP",
            size: 0xB0,
        },
    },
    FormatDescriptor {
        id: FormatId::Psp,
        code: "PSP",
        name: "PlayStation Portable",
        family: ConsoleFamily::PlayStation,
        caps: Capabilities::PSP,
        endian: Endian::Little,
        framing: Framing::Tagged {
            tags: TAGGED_BLOCKS,
        },
        block_count: TAGGED_BLOCKS.len(),
        window_size: TAGGED_FILE_SIZE,
        file_size: TAGGED_FILE_SIZE,
        detection: Detection::FirstBlock {
            tag: "SIMP",
            size: 0xC8,
        },
    },
];

/// Look up a format by its short code (case-insensitive)
pub fn format_by_code(code: &str) -> Option<&'static FormatDescriptor> {
    FORMATS.iter().find(|f| f.code.eq_ignore_ascii_case(code))
}

//! Stored vehicles (`GRGE`)

use crate::codec::{read_fixed_array, write_fixed_array, Codec};
use crate::cursor::ByteCursor;
use crate::format::FormatDescriptor;
use crate::records::geometry::CompressedTransform;
use crate::Result;

/// Vehicle slots in the garage block, live or not
pub const GARAGE_SLOTS: usize = 16;

/// A vehicle parked in a garage. A zero model marks an empty slot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StoredVehicle {
    /// Vehicle model id (0 when the slot is empty)
    pub model: i32,
    /// Parked position and orientation
    pub transform: CompressedTransform,
    /// Proof and upgrade bits
    pub flags: u32,
    /// Body color index
    pub primary_color: u8,
    /// Trim color index
    pub secondary_color: u8,
    /// Station tuned when the vehicle was parked
    pub radio_station: u8,
    /// Model-specific extra part
    pub extra: u8,
    /// PSP only
    pub bomb_type: u8,
}

impl StoredVehicle {
    pub fn is_empty(&self) -> bool {
        self.model == 0
    }
}

impl Codec for StoredVehicle {
    fn decode(cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<Self> {
        let mut vehicle = Self {
            model: cur.read_i32()?,
            transform: CompressedTransform::decode(cur, format)?,
            flags: cur.read_u32()?,
            primary_color: cur.read_u8()?,
            secondary_color: cur.read_u8()?,
            radio_station: cur.read_u8()?,
            extra: cur.read_u8()?,
            bomb_type: 0,
        };
        if format.is_psp() {
            vehicle.bomb_type = cur.read_u8()?;
            cur.skip(3)?;
        }
        Ok(vehicle)
    }

    fn encode(&self, cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<()> {
        cur.write_i32(self.model)?;
        self.transform.encode(cur, format)?;
        cur.write_u32(self.flags)?;
        cur.write_u8(self.primary_color)?;
        cur.write_u8(self.secondary_color)?;
        cur.write_u8(self.radio_station)?;
        cur.write_u8(self.extra)?;
        if format.is_psp() {
            cur.write_u8(self.bomb_type)?;
            cur.pad(3)?;
        }
        Ok(())
    }
}

/// Contents of the `GRGE` block
#[derive(Debug, Clone, PartialEq)]
pub struct Garage {
    /// Paint shops no longer charge
    pub free_resprays: bool,
    /// Bomb shops no longer charge
    pub free_bombs: bool,
    /// A respray completed since the last save
    pub respray_happened: bool,
    /// Always [`GARAGE_SLOTS`] entries once decoded
    pub vehicles: Vec<StoredVehicle>,
}

impl Default for Garage {
    fn default() -> Self {
        Self {
            free_resprays: false,
            free_bombs: false,
            respray_happened: false,
            vehicles: vec![StoredVehicle::default(); GARAGE_SLOTS],
        }
    }
}

impl Garage {
    pub fn occupied(&self) -> impl Iterator<Item = &StoredVehicle> {
        self.vehicles.iter().filter(|v| !v.is_empty())
    }
}

impl Codec for Garage {
    fn decode(cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<Self> {
        let free_resprays = cur.read_bool(1)?;
        let free_bombs = cur.read_bool(1)?;
        let respray_happened = cur.read_bool(1)?;
        cur.skip_align(4)?;
        Ok(Self {
            free_resprays,
            free_bombs,
            respray_happened,
            vehicles: read_fixed_array(cur, GARAGE_SLOTS, format)?,
        })
    }

    fn encode(&self, cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<()> {
        cur.write_bool(self.free_resprays, 1)?;
        cur.write_bool(self.free_bombs, 1)?;
        cur.write_bool(self.respray_happened, 1)?;
        cur.pad_align(4)?;
        write_fixed_array(cur, &self.vehicles, GARAGE_SLOTS, format)
    }
}

//! Player state (`PLYR`)

use crate::codec::Codec;
use crate::cursor::ByteCursor;
use crate::format::FormatDescriptor;
use crate::records::geometry::{CompressedTransform, IntRect};
use crate::Result;

const NAME_WIDTH: usize = 16;

/// Contents of the `PLYR` block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerInfo {
    /// Cash balance
    pub money: i32,
    /// Balance shown on the HUD while it catches up with `money`
    pub displayed_money: i32,
    /// Hidden packages picked up
    pub packages_collected: i32,
    /// Hidden packages in the world
    pub packages_total: i32,
    /// Health cap (100 unless raised by rewards)
    pub max_health: u8,
    /// Armor cap
    pub max_armor: u8,
    /// Sprinting never tires the player
    pub infinite_sprint: bool,
    /// Weapons reload at double speed
    pub fast_reload: bool,
    /// Position and facing at save time
    pub transform: CompressedTransform,
    /// Area the player may not leave while a mission restricts movement
    pub restricted_area: IntRect,
    /// Player model name, at most 16 bytes
    pub name: String,
}

impl Codec for PlayerInfo {
    fn decode(cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<Self> {
        Ok(Self {
            money: cur.read_i32()?,
            displayed_money: cur.read_i32()?,
            packages_collected: cur.read_i32()?,
            packages_total: cur.read_i32()?,
            max_health: cur.read_u8()?,
            max_armor: cur.read_u8()?,
            infinite_sprint: cur.read_bool(1)?,
            fast_reload: cur.read_bool(1)?,
            transform: CompressedTransform::decode(cur, format)?,
            restricted_area: IntRect::decode(cur, format)?,
            name: cur.read_string(NAME_WIDTH)?,
        })
    }

    fn encode(&self, cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<()> {
        cur.write_i32(self.money)?;
        cur.write_i32(self.displayed_money)?;
        cur.write_i32(self.packages_collected)?;
        cur.write_i32(self.packages_total)?;
        cur.write_u8(self.max_health)?;
        cur.write_u8(self.max_armor)?;
        cur.write_bool(self.infinite_sprint, 1)?;
        cur.write_bool(self.fast_reload, 1)?;
        self.transform.encode(cur, format)?;
        self.restricted_area.encode(cur, format)?;
        cur.write_string(&self.name, NAME_WIDTH)
    }
}

//! General game state (`SIMP` / first block)
//!
//! The layout differs per platform: the title is UTF-16 where the format has
//! wide strings, handhelds and the PS2 carry audio settings instead of a
//! timestamp, and the trailing reserved area makes up the declared size.

use crate::codec::{read_fixed_array, write_fixed_array, Codec};
use crate::cursor::ByteCursor;
use crate::format::FormatDescriptor;
use crate::Result;

/// Characters in the last-mission title
pub const TITLE_CHARS: usize = 24;

/// Radio stations with a tracked listen time
pub const RADIO_STATIONS: usize = 10;

/// Wall-clock time the save was written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveTime {
    pub year: u16,
    pub month: u16,
    pub day_of_week: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub millisecond: u16,
}

impl Codec for SaveTime {
    fn decode(cur: &mut ByteCursor, _format: &FormatDescriptor) -> Result<Self> {
        Ok(Self {
            year: cur.read_u16()?,
            month: cur.read_u16()?,
            day_of_week: cur.read_u16()?,
            day: cur.read_u16()?,
            hour: cur.read_u16()?,
            minute: cur.read_u16()?,
            second: cur.read_u16()?,
            millisecond: cur.read_u16()?,
        })
    }

    fn encode(&self, cur: &mut ByteCursor, _format: &FormatDescriptor) -> Result<()> {
        for value in [
            self.year,
            self.month,
            self.day_of_week,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.millisecond,
        ] {
            cur.write_u16(value)?;
        }
        Ok(())
    }

    fn encoded_size(_format: &FormatDescriptor) -> Option<usize> {
        Some(16)
    }
}

/// Audio and pad settings stored by PS2 and PSP saves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioSettings {
    /// Music volume (0-64)
    pub music_volume: i32,
    /// Effects volume (0-64)
    pub sfx_volume: i32,
    /// Pad rumble enabled
    pub vibration: bool,
    /// Button layout index
    pub controller_config: i32,
}

/// Touch controls stored by mobile saves
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TouchSettings {
    /// On-screen control layout index
    pub layout: i32,
    pub show_hud: bool,
    /// Invert vertical camera drag
    pub invert_look: bool,
    /// HUD scale factor (1.0 is native)
    pub hud_scale: f32,
}

/// Display options stored by PC and the big-endian consoles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplaySettings {
    /// Radar display (0 full, 1 blips only, 2 off)
    pub radar_mode: i32,
    /// HUD display (0 on, 1 off)
    pub hud_mode: i32,
    pub widescreen: bool,
    pub frame_limiter: bool,
    /// Selected resolution index
    pub video_mode: i32,
    /// Invert vertical mouse look
    pub invert_look: bool,
}

/// Contents of the first block of every save
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleVariables {
    /// Title shown in the load menu, at most [`TITLE_CHARS`] characters
    pub last_mission_passed: String,
    /// Build id of the game that wrote the save
    pub version_id: u32,
    /// Area the player is in (0 none, 1 interior, 2+ island or city)
    pub current_level: u32,
    /// Camera position at save time
    pub camera_position: [f32; 3],
    /// Elapsed game time in milliseconds
    pub game_time_ms: u32,
    /// Simulation speed multiplier (1.0 is normal)
    pub time_scale: f32,
    /// Length of one frame step
    pub time_step: f32,
    /// Frames simulated since the game started
    pub frame_counter: u32,
    /// In-game clock hour (0-23)
    pub clock_hour: u8,
    /// In-game clock minute (0-59)
    pub clock_minute: u8,
    /// Weather type being blended from
    pub old_weather: i16,
    /// Weather type being blended to
    pub new_weather: i16,
    /// Weather locked by a script, or -1
    pub forced_weather: i16,
    /// Blend factor between `old_weather` and `new_weather`
    pub weather_interpolation: f32,
    /// Display brightness setting
    pub brightness: i32,
    pub show_subtitles: bool,
    /// Menu language index
    pub language: i32,
    /// Not stored by PS2 and PSP saves
    pub save_time: SaveTime,
    /// PS2 and PSP only
    pub audio: AudioSettings,
    /// Mobile only
    pub touch: TouchSettings,
    /// PC, PS3 and Xbox 360 only
    pub display: DisplaySettings,
    /// Always [`RADIO_STATIONS`] entries once decoded
    pub radio_listen_time: Vec<u32>,
}

impl SimpleVariables {
    /// Declared size of the record on `format`
    pub fn size_for(format: &FormatDescriptor) -> usize {
        if format.is_ps2() {
            0xB0
        } else if format.is_psp() {
            0xC8
        } else if format.is_mobile() {
            0x104
        } else {
            0x138
        }
    }

    fn reserved_len(format: &FormatDescriptor) -> usize {
        if format.is_ps2() {
            32
        } else if format.is_psp() {
            56
        } else if format.is_mobile() {
            76
        } else {
            120
        }
    }

    fn has_audio_settings(format: &FormatDescriptor) -> bool {
        format.is_ps2() || format.is_psp()
    }

    fn has_display_settings(format: &FormatDescriptor) -> bool {
        !format.is_mobile() && !Self::has_audio_settings(format)
    }
}

impl Codec for SimpleVariables {
    fn decode(cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<Self> {
        let mut vars = Self {
            last_mission_passed: if format.has_wide_strings() {
                cur.read_wide_string(TITLE_CHARS)?
            } else {
                cur.read_string(TITLE_CHARS)?
            },
            version_id: cur.read_u32()?,
            current_level: cur.read_u32()?,
            camera_position: [cur.read_f32()?, cur.read_f32()?, cur.read_f32()?],
            game_time_ms: cur.read_u32()?,
            time_scale: cur.read_f32()?,
            time_step: cur.read_f32()?,
            frame_counter: cur.read_u32()?,
            clock_hour: cur.read_u8()?,
            clock_minute: cur.read_u8()?,
            ..Self::default()
        };
        cur.skip_align(4)?;
        vars.old_weather = cur.read_i16()?;
        vars.new_weather = cur.read_i16()?;
        vars.forced_weather = cur.read_i16()?;
        cur.skip_align(4)?;
        vars.weather_interpolation = cur.read_f32()?;
        vars.brightness = cur.read_i32()?;
        vars.show_subtitles = cur.read_bool(4)?;
        vars.language = cur.read_i32()?;

        if Self::has_audio_settings(format) {
            vars.audio = AudioSettings {
                music_volume: cur.read_i32()?,
                sfx_volume: cur.read_i32()?,
                vibration: cur.read_bool(4)?,
                controller_config: cur.read_i32()?,
            };
        } else {
            vars.save_time = SaveTime::decode(cur, format)?;
        }

        vars.radio_listen_time = read_fixed_array(cur, RADIO_STATIONS, format)?;

        if format.is_mobile() {
            vars.touch = TouchSettings {
                layout: cur.read_i32()?,
                show_hud: cur.read_bool(4)?,
                invert_look: cur.read_bool(4)?,
                hud_scale: cur.read_f32()?,
            };
        } else if Self::has_display_settings(format) {
            vars.display = DisplaySettings {
                radar_mode: cur.read_i32()?,
                hud_mode: cur.read_i32()?,
                widescreen: cur.read_bool(4)?,
                frame_limiter: cur.read_bool(4)?,
                video_mode: cur.read_i32()?,
                invert_look: cur.read_bool(4)?,
            };
        }

        cur.skip(Self::reserved_len(format))?;
        Ok(vars)
    }

    fn encode(&self, cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<()> {
        if format.has_wide_strings() {
            cur.write_wide_string(&self.last_mission_passed, TITLE_CHARS)?;
        } else {
            cur.write_string(&self.last_mission_passed, TITLE_CHARS)?;
        }
        cur.write_u32(self.version_id)?;
        cur.write_u32(self.current_level)?;
        for &axis in &self.camera_position {
            cur.write_f32(axis)?;
        }
        cur.write_u32(self.game_time_ms)?;
        cur.write_f32(self.time_scale)?;
        cur.write_f32(self.time_step)?;
        cur.write_u32(self.frame_counter)?;
        cur.write_u8(self.clock_hour)?;
        cur.write_u8(self.clock_minute)?;
        cur.pad_align(4)?;
        cur.write_i16(self.old_weather)?;
        cur.write_i16(self.new_weather)?;
        cur.write_i16(self.forced_weather)?;
        cur.pad_align(4)?;
        cur.write_f32(self.weather_interpolation)?;
        cur.write_i32(self.brightness)?;
        cur.write_bool(self.show_subtitles, 4)?;
        cur.write_i32(self.language)?;

        if Self::has_audio_settings(format) {
            cur.write_i32(self.audio.music_volume)?;
            cur.write_i32(self.audio.sfx_volume)?;
            cur.write_bool(self.audio.vibration, 4)?;
            cur.write_i32(self.audio.controller_config)?;
        } else {
            self.save_time.encode(cur, format)?;
        }

        write_fixed_array(cur, &self.radio_listen_time, RADIO_STATIONS, format)?;

        if format.is_mobile() {
            cur.write_i32(self.touch.layout)?;
            cur.write_bool(self.touch.show_hud, 4)?;
            cur.write_bool(self.touch.invert_look, 4)?;
            cur.write_f32(self.touch.hud_scale)?;
        } else if Self::has_display_settings(format) {
            cur.write_i32(self.display.radar_mode)?;
            cur.write_i32(self.display.hud_mode)?;
            cur.write_bool(self.display.widescreen, 4)?;
            cur.write_bool(self.display.frame_limiter, 4)?;
            cur.write_i32(self.display.video_mode)?;
            cur.write_bool(self.display.invert_look, 4)?;
        }

        cur.pad(Self::reserved_len(format))
    }

    fn encoded_size(format: &FormatDescriptor) -> Option<usize> {
        Some(Self::size_for(format))
    }
}

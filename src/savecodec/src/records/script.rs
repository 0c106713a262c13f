//! Script state (`SRPT`): global variables and running script threads

use crate::codec::{
    read_fixed_array, read_prefixed_array, write_fixed_array, write_prefixed_array, Codec,
};
use crate::cursor::ByteCursor;
use crate::format::FormatDescriptor;
use crate::Result;

/// Number of local variable slots per thread
pub const LOCAL_COUNT: usize = 104;

/// Depth of the gosub return stack
pub const RETURN_STACK_DEPTH: usize = 8;

const NAME_WIDTH: usize = 8;
const UNUSED_TAIL: usize = 32;

/// One running script thread, fixed at 0x218 bytes on every platform
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptThread {
    /// Link to the next thread in the active list
    pub next: u32,
    /// Link to the previous thread in the active list
    pub prev: u32,
    /// Script name, at most 8 bytes
    pub name: String,
    /// Instruction pointer
    pub ip: u32,
    /// Gosub return addresses
    pub return_stack: [u32; RETURN_STACK_DEPTH],
    /// Entries in use on `return_stack`
    pub stack_depth: u16,
    /// Always [`LOCAL_COUNT`] entries once decoded
    pub locals: Vec<i32>,
    /// Millisecond timers readable by the script
    pub timers: [u32; 2],
    pub is_active: bool,
    pub condition_result: bool,
    pub is_mission: bool,
    pub is_external: bool,
    pub text_box_active: bool,
    /// Game time at which a waiting thread resumes
    pub wake_time: u32,
    /// Pending AND/OR condition chain
    pub and_or_state: u16,
    pub not_flag: bool,
    pub death_arrest_enabled: bool,
    pub death_arrest_executed: bool,
    /// Second copy of `is_mission` stored near the end of the thread
    pub mission_flag: bool,
    /// Jump target when a cutscene is skipped
    pub scene_skip_ip: u32,
}

impl ScriptThread {
    pub const SIZE: usize = 0x218;

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl Default for ScriptThread {
    fn default() -> Self {
        Self {
            next: 0,
            prev: 0,
            name: String::new(),
            ip: 0,
            return_stack: [0; RETURN_STACK_DEPTH],
            stack_depth: 0,
            locals: vec![0; LOCAL_COUNT],
            timers: [0; 2],
            is_active: false,
            condition_result: false,
            is_mission: false,
            is_external: false,
            text_box_active: false,
            wake_time: 0,
            and_or_state: 0,
            not_flag: false,
            death_arrest_enabled: false,
            death_arrest_executed: false,
            mission_flag: false,
            scene_skip_ip: 0,
        }
    }
}

impl Codec for ScriptThread {
    fn decode(cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<Self> {
        let mut thread = Self {
            next: cur.read_u32()?,
            prev: cur.read_u32()?,
            name: cur.read_string(NAME_WIDTH)?,
            ip: cur.read_u32()?,
            ..Self::default()
        };
        for slot in &mut thread.return_stack {
            *slot = cur.read_u32()?;
        }
        thread.stack_depth = cur.read_u16()?;
        cur.skip_align(4)?;

        thread.locals = read_fixed_array(cur, LOCAL_COUNT, format)?;
        thread.timers = [cur.read_u32()?, cur.read_u32()?];

        thread.is_active = cur.read_bool(1)?;
        thread.condition_result = cur.read_bool(1)?;
        thread.is_mission = cur.read_bool(1)?;
        thread.is_external = cur.read_bool(1)?;
        thread.text_box_active = cur.read_bool(1)?;
        cur.skip_align(4)?;

        thread.wake_time = cur.read_u32()?;
        thread.and_or_state = cur.read_u16()?;
        cur.skip_align(4)?;

        thread.not_flag = cur.read_bool(1)?;
        thread.death_arrest_enabled = cur.read_bool(1)?;
        thread.death_arrest_executed = cur.read_bool(1)?;
        thread.mission_flag = cur.read_bool(1)?;
        thread.scene_skip_ip = cur.read_u32()?;
        cur.skip(UNUSED_TAIL)?;

        Ok(thread)
    }

    fn encode(&self, cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<()> {
        cur.write_u32(self.next)?;
        cur.write_u32(self.prev)?;
        cur.write_string(&self.name, NAME_WIDTH)?;
        cur.write_u32(self.ip)?;
        for &slot in &self.return_stack {
            cur.write_u32(slot)?;
        }
        cur.write_u16(self.stack_depth)?;
        cur.pad_align(4)?;

        write_fixed_array(cur, &self.locals, LOCAL_COUNT, format)?;
        cur.write_u32(self.timers[0])?;
        cur.write_u32(self.timers[1])?;

        cur.write_bool(self.is_active, 1)?;
        cur.write_bool(self.condition_result, 1)?;
        cur.write_bool(self.is_mission, 1)?;
        cur.write_bool(self.is_external, 1)?;
        cur.write_bool(self.text_box_active, 1)?;
        cur.pad_align(4)?;

        cur.write_u32(self.wake_time)?;
        cur.write_u16(self.and_or_state)?;
        cur.pad_align(4)?;

        cur.write_bool(self.not_flag, 1)?;
        cur.write_bool(self.death_arrest_enabled, 1)?;
        cur.write_bool(self.death_arrest_executed, 1)?;
        cur.write_bool(self.mission_flag, 1)?;
        cur.write_u32(self.scene_skip_ip)?;
        cur.pad(UNUSED_TAIL)
    }

    fn encoded_size(_format: &FormatDescriptor) -> Option<usize> {
        Some(Self::SIZE)
    }
}

/// Contents of the `SRPT` block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptBlock {
    pub globals: Vec<i32>,
    pub on_mission_offset: u32,
    pub threads: Vec<ScriptThread>,
}

impl ScriptBlock {
    pub fn active_threads(&self) -> impl Iterator<Item = &ScriptThread> {
        self.threads.iter().filter(|t| t.is_active)
    }
}

impl Codec for ScriptBlock {
    fn decode(cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<Self> {
        Ok(Self {
            globals: read_prefixed_array(cur, format)?,
            on_mission_offset: cur.read_u32()?,
            threads: read_prefixed_array(cur, format)?,
        })
    }

    fn encode(&self, cur: &mut ByteCursor, format: &FormatDescriptor) -> Result<()> {
        write_prefixed_array(cur, &self.globals, format)?;
        cur.write_u32(self.on_mission_offset)?;
        write_prefixed_array(cur, &self.threads, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_from_slice, encode_to_vec, size_of};
    use crate::format::{FormatId, FORMATS};

    fn sample_thread() -> ScriptThread {
        let mut thread = ScriptThread::named("intro");
        thread.ip = 0x1234;
        thread.return_stack[0] = 0x200;
        thread.stack_depth = 1;
        thread.locals[0] = -5;
        thread.locals[LOCAL_COUNT - 1] = 77;
        thread.timers = [1000, 2500];
        thread.is_active = true;
        thread.is_mission = true;
        thread.wake_time = 99;
        thread.and_or_state = 21;
        thread.death_arrest_enabled = true;
        thread.scene_skip_ip = 0x4000;
        thread
    }

    #[test]
    fn test_thread_size_is_fixed() {
        for format in FORMATS {
            assert_eq!(size_of::<ScriptThread>(format).unwrap(), 0x218);
            let bytes = encode_to_vec(&sample_thread(), format).unwrap();
            assert_eq!(bytes.len(), 0x218);
        }
    }

    #[test]
    fn test_thread_round_trip() {
        let thread = sample_thread();
        for format in FORMATS {
            let bytes = encode_to_vec(&thread, format).unwrap();
            let decoded: ScriptThread = decode_from_slice(&bytes, format).unwrap();
            assert_eq!(decoded, thread);
        }
    }

    #[test]
    fn test_thread_field_offsets() {
        let pc = FormatId::Pc.descriptor();
        let bytes = encode_to_vec(&sample_thread(), pc).unwrap();
        assert_eq!(&bytes[8..13], b"intro");
        assert_eq!(&bytes[16..20], &0x1234u32.to_le_bytes());
        // First local follows the return stack, depth and alignment
        assert_eq!(&bytes[56..60], &(-5i32).to_le_bytes());
        // is_active
        assert_eq!(bytes[480], 1);
    }

    #[test]
    fn test_thread_short_locals_are_padded() {
        let pc = FormatId::Pc.descriptor();
        let mut thread = sample_thread();
        thread.locals.truncate(3);
        let bytes = encode_to_vec(&thread, pc).unwrap();
        assert_eq!(bytes.len(), ScriptThread::SIZE);

        let decoded: ScriptThread = decode_from_slice(&bytes, pc).unwrap();
        assert_eq!(decoded.locals.len(), LOCAL_COUNT);
        assert_eq!(decoded.locals[0], -5);
        assert_eq!(decoded.locals[LOCAL_COUNT - 1], 0);
    }

    #[test]
    fn test_script_block_round_trip() {
        let mut block = ScriptBlock {
            globals: vec![0, 1, -1, 4096],
            on_mission_offset: 0x1C8,
            threads: vec![sample_thread(), ScriptThread::named("main")],
        };
        block.threads[1].next = 1;

        for format in FORMATS {
            let bytes = encode_to_vec(&block, format).unwrap();
            assert_eq!(bytes.len(), 4 + 16 + 4 + 4 + 2 * ScriptThread::SIZE);
            let decoded: ScriptBlock = decode_from_slice(&bytes, format).unwrap();
            assert_eq!(decoded, block);
        }
        assert_eq!(block.active_threads().count(), 1);
    }

    #[test]
    fn test_script_block_empty_size() {
        assert_eq!(size_of::<ScriptBlock>(FormatId::Ps2.descriptor()).unwrap(), 12);
    }

    #[test]
    fn test_script_block_big_endian_counts() {
        let block = ScriptBlock {
            globals: vec![7],
            ..ScriptBlock::default()
        };
        let bytes = encode_to_vec(&block, FormatId::Ps3.descriptor()).unwrap();
        assert_eq!(&bytes[..8], &[0, 0, 0, 1, 0, 0, 0, 7]);
    }
}

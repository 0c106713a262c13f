//! Small fixed-size geometry records shared by the block records

use crate::codec::Codec;
use crate::cursor::ByteCursor;
use crate::format::FormatDescriptor;
use crate::Result;

/// Axis-aligned integer rectangle (4 x i32)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl IntRect {
    pub const SIZE: usize = 16;

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

impl Codec for IntRect {
    fn decode(cur: &mut ByteCursor, _format: &FormatDescriptor) -> Result<Self> {
        Ok(Self {
            left: cur.read_i32()?,
            top: cur.read_i32()?,
            right: cur.read_i32()?,
            bottom: cur.read_i32()?,
        })
    }

    fn encode(&self, cur: &mut ByteCursor, _format: &FormatDescriptor) -> Result<()> {
        cur.write_i32(self.left)?;
        cur.write_i32(self.top)?;
        cur.write_i32(self.right)?;
        cur.write_i32(self.bottom)
    }

    fn encoded_size(_format: &FormatDescriptor) -> Option<usize> {
        Some(Self::SIZE)
    }
}

/// Position plus a rotation packed into two i8 basis vectors.
///
/// The up vector is not stored; it is the cross product of the other two.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompressedTransform {
    pub position: [f32; 3],
    pub right: [i8; 3],
    pub forward: [i8; 3],
}

impl CompressedTransform {
    pub const SIZE: usize = 20;

    /// Pack unit basis vectors at a position
    pub fn new(position: [f32; 3], right: [f32; 3], forward: [f32; 3]) -> Self {
        Self {
            position,
            right: right.map(pack_unit),
            forward: forward.map(pack_unit),
        }
    }

    pub fn right_vector(&self) -> [f32; 3] {
        self.right.map(unpack_unit)
    }

    pub fn forward_vector(&self) -> [f32; 3] {
        self.forward.map(unpack_unit)
    }
}

fn pack_unit(value: f32) -> i8 {
    (value.clamp(-1.0, 1.0) * 127.0).round() as i8
}

fn unpack_unit(value: i8) -> f32 {
    f32::from(value) / 127.0
}

impl Codec for CompressedTransform {
    fn decode(cur: &mut ByteCursor, _format: &FormatDescriptor) -> Result<Self> {
        let mut transform = Self::default();
        for axis in &mut transform.position {
            *axis = cur.read_f32()?;
        }
        for axis in &mut transform.right {
            *axis = cur.read_i8()?;
        }
        for axis in &mut transform.forward {
            *axis = cur.read_i8()?;
        }
        cur.skip(2)?;
        Ok(transform)
    }

    fn encode(&self, cur: &mut ByteCursor, _format: &FormatDescriptor) -> Result<()> {
        for &axis in &self.position {
            cur.write_f32(axis)?;
        }
        for &axis in self.right.iter().chain(&self.forward) {
            cur.write_i8(axis)?;
        }
        cur.pad(2)
    }

    fn encoded_size(_format: &FormatDescriptor) -> Option<usize> {
        Some(Self::SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_from_slice, encode_to_vec, size_of};
    use crate::format::{FormatId, FORMATS};

    #[test]
    fn test_int_rect_round_trip() {
        let rect = IntRect {
            left: -1500,
            top: -900,
            right: 1500,
            bottom: 2000,
        };
        for format in FORMATS {
            let bytes = encode_to_vec(&rect, format).unwrap();
            assert_eq!(bytes.len(), 16);
            assert_eq!(decode_from_slice::<IntRect>(&bytes, format).unwrap(), rect);
        }
        assert!(rect.contains(0, 0));
        assert!(!rect.contains(1501, 0));
    }

    #[test]
    fn test_int_rect_big_endian_layout() {
        let rect = IntRect {
            left: 1,
            top: 2,
            right: 3,
            bottom: 4,
        };
        let bytes = encode_to_vec(&rect, FormatId::Xbox360.descriptor()).unwrap();
        assert_eq!(&bytes[..8], &[0, 0, 0, 1, 0, 0, 0, 2]);
    }

    #[test]
    fn test_compressed_transform_round_trip() {
        let transform = CompressedTransform::new(
            [2488.5, -1666.25, 13.0],
            [1.0, 0.0, 0.0],
            [0.0, -1.0, 0.0],
        );
        assert_eq!(transform.right, [127, 0, 0]);
        assert_eq!(transform.forward, [0, -127, 0]);

        for format in FORMATS {
            assert_eq!(size_of::<CompressedTransform>(format).unwrap(), 20);
            let bytes = encode_to_vec(&transform, format).unwrap();
            assert_eq!(bytes.len(), 20);
            assert_eq!(&bytes[18..], &[0, 0]);
            let decoded: CompressedTransform = decode_from_slice(&bytes, format).unwrap();
            assert_eq!(decoded, transform);
        }
    }

    #[test]
    fn test_compressed_transform_vectors() {
        let transform = CompressedTransform::new([0.0; 3], [0.5, 2.0, -3.0], [0.0; 3]);
        assert_eq!(transform.right, [64, 127, -127]);
        let right = transform.right_vector();
        assert!((right[0] - 64.0 / 127.0).abs() < f32::EPSILON);
        assert_eq!(right[1], 1.0);
        assert_eq!(right[2], -1.0);
    }
}

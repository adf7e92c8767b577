// Copyright 2026 the chunker3ds developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::io;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// One of the three parallel world spaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    Overworld = 0,
    Nether = 1,
    End = 2,
}

impl Dimension {
    pub fn from_int(val: u16) -> Result<Dimension> {
        match val {
            0 => Ok(Dimension::Overworld),
            1 => Ok(Dimension::Nether),
            2 => Ok(Dimension::End),
            _ => Err(Error::Structure(format!("invalid dimension {}", val))),
        }
    }

    pub fn id(self) -> u16 {
        self as u16
    }
}

const AXIS_MASK: u16 = 0x1FFF;
const SIGN_LIMIT: i32 = 1 << 12;
const AXIS_RANGE: i32 = 1 << 13;

/// Sign-corrects one 13-bit packed axis value. The threshold is a
/// strict `>`: a raw value of exactly 4096 stays positive, so the
/// signed range is the lopsided `[-4095, 4096]`.
pub fn decode_axis(raw: u16) -> i32 {
    let val = (raw & AXIS_MASK) as i32;
    if val > SIGN_LIMIT {
        val - AXIS_RANGE
    } else {
        val
    }
}

/// Packs a signed axis value back into its 13-bit form. Inverse of
/// [`decode_axis`] over `[-4095, 4096]`.
pub fn encode_axis(val: i32) -> u16 {
    (val & AXIS_MASK as i32) as u16
}

/// A decoded chunk position: chunk coordinates (not block coordinates)
/// plus the dimension the chunk belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
    pub dimension: Dimension,
}

impl ChunkPos {
    /// Decodes the packed on-disk form: x in the low 13 bits of the
    /// first field, z in the low 13 bits of the second, dimension in
    /// the second field's top 3 bits.
    pub fn decode(x_field: u16, z_field: u16) -> Result<ChunkPos> {
        Ok(ChunkPos {
            x: decode_axis(x_field),
            z: decode_axis(z_field),
            dimension: Dimension::from_int(z_field >> 13)?,
        })
    }

    pub fn encode(&self) -> (u16, u16) {
        (
            encode_axis(self.x),
            encode_axis(self.z) | (self.dimension.id() << 13),
        )
    }

    pub fn read_from<R: io::Read>(buf: &mut R) -> Result<ChunkPos> {
        let x_field = buf.read_u16::<LittleEndian>()?;
        let z_field = buf.read_u16::<LittleEndian>()?;
        ChunkPos::decode(x_field, z_field)
    }
}

impl fmt::Debug for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {:?})", self.x, self.z, self.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_round_trip() {
        for v in -4095..=4096 {
            assert_eq!(decode_axis(encode_axis(v)), v, "axis value {}", v);
        }
    }

    #[test]
    fn axis_boundary_is_strict() {
        // 4096 itself is not sign-corrected; 4097 is.
        assert_eq!(decode_axis(0x1000), 4096);
        assert_eq!(decode_axis(0x1001), -4095);
        assert_eq!(decode_axis(0x1FFF), -1);
        assert_eq!(decode_axis(0), 0);
    }

    #[test]
    fn position_round_trip() {
        let pos = ChunkPos {
            x: 2,
            z: -3,
            dimension: Dimension::Nether,
        };
        let (x_field, z_field) = pos.encode();
        assert_eq!(ChunkPos::decode(x_field, z_field).unwrap(), pos);
    }

    #[test]
    fn invalid_dimension_rejected() {
        // dimension bits = 3
        assert!(ChunkPos::decode(0, 3 << 13).is_err());
    }
}

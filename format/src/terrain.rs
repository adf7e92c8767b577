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

//! The nested payload of a chunk's section 0: up to eight vertically
//! stacked 16x16x16 block bands, then a coarse biome grid and an
//! uninterpreted trailing region.

use crate::error::{Error, Result};
use crate::nibble;

/// Cells per band (16 * 16 * 16).
pub const BAND_VOLUME: usize = 4096;
/// Nibble-packed block data bytes per band.
pub const BAND_DATA_SIZE: usize = BAND_VOLUME / 2;
pub const MAX_BANDS: usize = 8;
/// One byte per 4x4 biome section over the 16x16 footprint.
pub const BIOME_GRID_SIZE: usize = 16;

/// One 16x16x16 sub-volume of block data.
pub struct Band {
    blocks: Vec<u8>,
    data: nibble::Array,
    // Parallel to `data`; semantics unconfirmed, kept only so its
    // length can be checked against the rest of the band.
    unknown: Vec<u8>,
}

impl Band {
    /// `(block_id, block_data)` for a linear cell index
    /// (`x * 256 + z * 16 + y`).
    pub fn cell(&self, idx: usize) -> (u8, u8) {
        (self.blocks[idx], self.data.get(idx))
    }

    /// The parallel array whose meaning is unconfirmed.
    pub fn unknown_data(&self) -> &[u8] {
        &self.unknown
    }
}

/// The decoded block-band set of one chunk.
pub struct Terrain {
    bands: Vec<Band>,
    biomes: [u8; BIOME_GRID_SIZE],
    trailing: Vec<u8>,
}

impl Terrain {
    /// A terrain with no bands: every cell reads as air. Used for
    /// chunks whose slot lacks a section 0.
    pub fn empty() -> Terrain {
        Terrain {
            bands: Vec::new(),
            biomes: [0; BIOME_GRID_SIZE],
            trailing: Vec::new(),
        }
    }

    pub fn parse(raw: &[u8]) -> Result<Terrain> {
        let count = *raw
            .first()
            .ok_or_else(|| Error::Structure("empty section 0 payload".to_owned()))?
            as usize;
        if count > MAX_BANDS {
            return Err(Error::Structure(format!(
                "band count {} exceeds the maximum of {}",
                count, MAX_BANDS
            )));
        }
        let band_size = 1 + BAND_VOLUME + 2 * BAND_DATA_SIZE;
        let needed = 1 + count * band_size + BIOME_GRID_SIZE;
        if raw.len() < needed {
            return Err(Error::Structure(format!(
                "section 0 payload is {} bytes, {} bands need at least {}",
                raw.len(),
                count,
                needed
            )));
        }

        let mut offset = 1;
        let mut bands = Vec::with_capacity(count);
        for band in 0..count {
            let constant0 = raw[offset];
            if constant0 != 0 {
                return Err(Error::Structure(format!(
                    "band {} tag is {:#X}, expected 0",
                    band, constant0
                )));
            }
            offset += 1;
            let blocks = raw[offset..offset + BAND_VOLUME].to_vec();
            offset += BAND_VOLUME;
            let data = raw[offset..offset + BAND_DATA_SIZE].to_vec();
            offset += BAND_DATA_SIZE;
            let unknown = raw[offset..offset + BAND_DATA_SIZE].to_vec();
            offset += BAND_DATA_SIZE;
            debug_assert_eq!(unknown.len(), data.len());
            bands.push(Band {
                blocks,
                data: nibble::Array::from_vec(data),
                unknown,
            });
        }

        let mut biomes = [0; BIOME_GRID_SIZE];
        biomes.copy_from_slice(&raw[offset..offset + BIOME_GRID_SIZE]);
        offset += BIOME_GRID_SIZE;
        Ok(Terrain {
            bands,
            biomes,
            trailing: raw[offset..].to_vec(),
        })
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn band(&self, idx: usize) -> Option<&Band> {
        self.bands.get(idx)
    }

    /// Total populated height in blocks.
    pub fn height(&self) -> usize {
        self.bands.len() * 16
    }

    /// `(block_id, block_data)` at chunk-local coordinates. `x` and
    /// `z` are 0..15; a `y` above the populated bands reads as air.
    pub fn block(&self, x: usize, y: usize, z: usize) -> (u8, u8) {
        let band = y >> 4;
        if band >= self.bands.len() {
            return (0, 0);
        }
        self.bands[band].cell(x * 256 + z * 16 + (y & 0xF))
    }

    /// Biome byte for a column; the grid is stored per 4x4 section.
    pub fn biome(&self, x: usize, z: usize) -> u8 {
        self.biomes[(z >> 2) * 4 + (x >> 2)]
    }

    /// The uninterpreted bytes after the biome grid.
    pub fn trailing(&self) -> &[u8] {
        &self.trailing
    }
}

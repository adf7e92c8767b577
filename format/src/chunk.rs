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

//! Chunk records stored in chunk-shard slots. A chunk header declares
//! up to six zlib-compressed sections laid out back to back after the
//! header; every layer of the lookup cross-checks the declared sizes
//! and offsets against what is actually there.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;

use crate::container::{self, Slot, SlotPayload, SUBFILE_HEADER_SIZE};
use crate::error::{Error, Result};
use crate::position::ChunkPos;

pub const CHUNK_HEADER_SIZE: usize = 0x70;
pub const SECTION_COUNT: usize = 6;
pub const SECTION_HEADER_SIZE: usize = 0x10;

// Packed position (4) + parameters (2) + unknowns (8) + reserved (2)
// + the section table must fill the header exactly.
const _: () = assert!(CHUNK_HEADER_SIZE == 16 + SECTION_COUNT * SECTION_HEADER_SIZE);

/// One entry of the section descriptor table. An index of -1 marks an
/// unused descriptor.
#[derive(Debug, Clone, Copy)]
pub struct SectionHeader {
    pub index: i32,
    pub position: i32,
    pub compressed_size: i32,
    pub decompressed_size: i32,
}

impl SectionHeader {
    fn read_from<R: Read>(buf: &mut R) -> Result<SectionHeader> {
        Ok(SectionHeader {
            index: buf.read_i32::<LittleEndian>()?,
            position: buf.read_i32::<LittleEndian>()?,
            compressed_size: buf.read_i32::<LittleEndian>()?,
            decompressed_size: buf.read_i32::<LittleEndian>()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChunkHeader {
    pub position: ChunkPos,
    pub parameter0: u8,
    pub parameter1: u8,
    pub unknown0: u32,
    pub unknown1: u32,
    pub sections: [SectionHeader; SECTION_COUNT],
}

impl ChunkHeader {
    fn read_from<R: Read>(buf: &mut R) -> Result<ChunkHeader> {
        let position = ChunkPos::read_from(buf)?;
        let parameter0 = buf.read_u8()?;
        let parameter1 = buf.read_u8()?;
        let unknown0 = buf.read_u32::<LittleEndian>()?;
        let unknown1 = buf.read_u32::<LittleEndian>()?;
        let _reserved = buf.read_u16::<LittleEndian>()?;
        let mut sections = [SectionHeader {
            index: -1,
            position: 0,
            compressed_size: 0,
            decompressed_size: 0,
        }; SECTION_COUNT];
        for section in &mut sections {
            *section = SectionHeader::read_from(buf)?;
        }
        Ok(ChunkHeader {
            position,
            parameter0,
            parameter1,
            unknown0,
            unknown1,
            sections,
        })
    }
}

struct ChunkBody {
    header: ChunkHeader,
    raw: Vec<u8>,
}

/// A chunk decoded from a shard slot. Filler slots still produce a
/// `Chunk` so callers can check [`Chunk::is_filler`]; any further read
/// against a filler chunk is an explicit error, never a silent empty
/// result.
pub struct Chunk {
    body: Option<ChunkBody>,
}

impl SlotPayload for Chunk {
    const KIND_TAG: u32 = container::KIND_CHUNK;

    fn decode(slot: Slot) -> Result<Chunk> {
        if slot.is_filler() {
            return Ok(Chunk { body: None });
        }
        let raw = slot.content()?.to_vec();
        if raw.len() < CHUNK_HEADER_SIZE {
            return Err(Error::Structure(format!(
                "slot {} content is {} bytes, too small for a chunk header of {:#X}",
                slot.index,
                raw.len(),
                CHUNK_HEADER_SIZE
            )));
        }
        let header = ChunkHeader::read_from(&mut &raw[..])?;
        Ok(Chunk {
            body: Some(ChunkBody { header, raw }),
        })
    }
}

impl Chunk {
    pub fn is_filler(&self) -> bool {
        self.body.is_none()
    }

    pub fn header(&self) -> Result<&ChunkHeader> {
        Ok(&self.body.as_ref().ok_or(Error::Filler)?.header)
    }

    pub fn position(&self) -> Result<ChunkPos> {
        Ok(self.header()?.position)
    }

    /// Looks up section `index` (0..5, negatives counting from the
    /// end). Returns `Ok(None)` when the chunk simply lacks that
    /// vertical section.
    ///
    /// The compressed streams are stored contiguously in declared
    /// order right after the chunk header, so the target's recorded
    /// offset must equal the running sum of the prior used sections'
    /// compressed sizes. A mismatch means the layout has been
    /// misunderstood and is fatal before any decompression happens.
    pub fn section(&self, index: i64) -> Result<Option<Section>> {
        let body = self.body.as_ref().ok_or(Error::Filler)?;
        let index = container::resolve_index(index, SECTION_COUNT, "section")?;

        let mut start = CHUNK_HEADER_SIZE;
        for section in &body.header.sections {
            if section.index == index as i32 {
                let expected = (start + SUBFILE_HEADER_SIZE) as i32;
                if section.position != expected {
                    return Err(Error::Integrity(format!(
                        "section {} recorded offset {:#X} does not match computed {:#X}",
                        index, section.position, expected
                    )));
                }
                if start > body.raw.len() {
                    return Err(Error::Integrity(format!(
                        "section {} starts at {:#X}, past the {:#X}-byte slot payload",
                        index,
                        start,
                        body.raw.len()
                    )));
                }
                // Not trimmed to compressed_size: the zlib stream
                // self-terminates and the decompressor reports how
                // much it consumed.
                return Ok(Some(Section {
                    header: *section,
                    compressed: body.raw[start..].to_vec(),
                }));
            } else if section.index != -1 {
                if section.compressed_size < 0 {
                    return Err(Error::Structure(format!(
                        "used section {} declares negative compressed size {}",
                        section.index, section.compressed_size
                    )));
                }
                start += section.compressed_size as usize;
            }
        }
        Ok(None)
    }
}

/// One declared section plus the compressed bytes from its offset to
/// the end of the slot payload.
pub struct Section {
    pub header: SectionHeader,
    compressed: Vec<u8>,
}

impl Section {
    /// Streams the zlib data out and enforces both declared sizes:
    /// the decompressor must consume exactly `compressed_size` input
    /// bytes (trailing slack beyond that is expected and ignored) and
    /// produce exactly `decompressed_size` output bytes.
    pub fn decompress(&self) -> Result<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(&self.compressed[..]);
        let mut decompressed = Vec::with_capacity(self.header.decompressed_size as usize);
        decoder.read_to_end(&mut decompressed)?;

        let consumed = decoder.total_in();
        if consumed != self.header.compressed_size as u64 {
            return Err(Error::Integrity(format!(
                "section {} consumed {} compressed bytes, expected {}",
                self.header.index, consumed, self.header.compressed_size
            )));
        }
        if decompressed.len() != self.header.decompressed_size as usize {
            return Err(Error::Integrity(format!(
                "section {} decompressed to {} bytes, expected {}",
                self.header.index,
                decompressed.len(),
                self.header.decompressed_size
            )));
        }
        Ok(decompressed)
    }
}

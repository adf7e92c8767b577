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

//! The cross-shard index: a header, a table of shard-related pointer
//! words, then an ordered list of entries mapping a packed chunk
//! position to a (shard, slot) location.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::diagnostics::{DiagnosticSink, Warning};
use crate::error::{Error, Result};
use crate::position::ChunkPos;

pub const INDEX_CONSTANT: u32 = 0x2;
pub const ENTRY_TAG_0: u16 = 0x20FF;
pub const ENTRY_TAG_1: u16 = 0xA;
pub const ENTRY_TAG_2: u16 = 0x8000;

/// One index entry: where to find the chunk for `position`.
#[derive(Debug, Clone, Copy)]
pub struct IndexEntry {
    pub position: ChunkPos,
    /// Shard number, i.e. the `N` of `slt<N>.cdb`.
    pub slot: u16,
    /// Slot index within that shard.
    pub subfile: u16,
}

pub struct Index {
    /// Per-shard words preceding the entry table; meaning unresolved,
    /// kept raw.
    pub pointers: Vec<u32>,
    pub entries: Vec<IndexEntry>,
}

impl Index {
    /// Parses the index file: a six-word header, `pointer_count` raw
    /// pointer words, then the entries. The first and third per-entry
    /// tag constants are hard assertions; the middle one deviates in
    /// real saves and is only reported through the sink. The asymmetry
    /// is deliberate: it reproduces observed decoder behaviour and is
    /// not to be unified without new save samples.
    pub fn read_from<R: Read>(buf: &mut R, sink: &mut dyn DiagnosticSink) -> Result<Index> {
        let constant0 = buf.read_u32::<LittleEndian>()?;
        if constant0 != INDEX_CONSTANT {
            return Err(Error::Structure(format!(
                "index header constant is {:#X}, expected {:#X}",
                constant0, INDEX_CONSTANT
            )));
        }
        let count = buf.read_u32::<LittleEndian>()? as usize;
        let _unknown1 = buf.read_u32::<LittleEndian>()?;
        let _entry_size = buf.read_u32::<LittleEndian>()?;
        let pointer_count = buf.read_u32::<LittleEndian>()? as usize;
        let _unknown2 = buf.read_u32::<LittleEndian>()?;

        let mut pointers = Vec::with_capacity(pointer_count);
        for _ in 0..pointer_count {
            pointers.push(buf.read_u32::<LittleEndian>()?);
        }

        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let position = ChunkPos::read_from(buf)?;
            let slot = buf.read_u16::<LittleEndian>()?;
            let subfile = buf.read_u16::<LittleEndian>()?;
            let tag0 = buf.read_u16::<LittleEndian>()?;
            let tag1 = buf.read_u16::<LittleEndian>()?;
            // Varies per entry (observed 0x1 up to 0x6e on large
            // worlds); not a constant, so never checked.
            let _unknown4 = buf.read_u16::<LittleEndian>()?;
            let tag2 = buf.read_u16::<LittleEndian>()?;

            if tag0 != ENTRY_TAG_0 {
                return Err(Error::Structure(format!(
                    "index entry {}: first tag is {:#X}, expected {:#X}",
                    i, tag0, ENTRY_TAG_0
                )));
            }
            if tag1 != ENTRY_TAG_1 {
                sink.report(Warning::IndexTagMismatch {
                    entry: i,
                    expected: ENTRY_TAG_1,
                    actual: tag1,
                });
            }
            if tag2 != ENTRY_TAG_2 {
                return Err(Error::Structure(format!(
                    "index entry {}: third tag is {:#X}, expected {:#X}",
                    i, tag2, ENTRY_TAG_2
                )));
            }
            entries.push(IndexEntry {
                position,
                slot,
                subfile,
            });
        }
        Ok(Index { pointers, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Dimension;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    fn encode_entry(
        buf: &mut Vec<u8>,
        pos: ChunkPos,
        slot: u16,
        subfile: u16,
        tags: (u16, u16, u16),
        unknown4: u16,
    ) {
        let (x_field, z_field) = pos.encode();
        buf.write_u16::<LittleEndian>(x_field).unwrap();
        buf.write_u16::<LittleEndian>(z_field).unwrap();
        buf.write_u16::<LittleEndian>(slot).unwrap();
        buf.write_u16::<LittleEndian>(subfile).unwrap();
        buf.write_u16::<LittleEndian>(tags.0).unwrap();
        buf.write_u16::<LittleEndian>(tags.1).unwrap();
        buf.write_u16::<LittleEndian>(unknown4).unwrap();
        buf.write_u16::<LittleEndian>(tags.2).unwrap();
    }

    fn index_file(
        pointers: &[u32],
        entries: &[(ChunkPos, u16, u16, (u16, u16, u16))],
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(INDEX_CONSTANT).unwrap();
        buf.write_u32::<LittleEndian>(entries.len() as u32).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf.write_u32::<LittleEndian>(0x10).unwrap();
        buf.write_u32::<LittleEndian>(pointers.len() as u32).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        for &pointer in pointers {
            buf.write_u32::<LittleEndian>(pointer).unwrap();
        }
        for &(pos, slot, subfile, tags) in entries {
            encode_entry(&mut buf, pos, slot, subfile, tags, 0x1);
        }
        buf
    }

    fn pos(x: i32, z: i32) -> ChunkPos {
        ChunkPos {
            x,
            z,
            dimension: Dimension::Overworld,
        }
    }

    #[test]
    fn entries_parse_in_order() {
        let data = index_file(
            &[],
            &[
                (pos(1, 2), 3, 4, (ENTRY_TAG_0, ENTRY_TAG_1, ENTRY_TAG_2)),
                (pos(-5, 6), 7, 8, (ENTRY_TAG_0, ENTRY_TAG_1, ENTRY_TAG_2)),
            ],
        );
        let mut warnings: Vec<Warning> = Vec::new();
        let index = Index::read_from(&mut Cursor::new(data), &mut warnings).unwrap();
        assert_eq!(index.entries.len(), 2);
        assert_eq!(index.entries[0].position, pos(1, 2));
        assert_eq!(index.entries[0].slot, 3);
        assert_eq!(index.entries[0].subfile, 4);
        assert_eq!(index.entries[1].position, pos(-5, 6));
        assert!(warnings.is_empty());
    }

    #[test]
    fn pointer_table_precedes_entries() {
        let data = index_file(
            &[5, 9, 12],
            &[(pos(1, 2), 3, 4, (ENTRY_TAG_0, ENTRY_TAG_1, ENTRY_TAG_2))],
        );
        let mut warnings: Vec<Warning> = Vec::new();
        let index = Index::read_from(&mut Cursor::new(data), &mut warnings).unwrap();
        assert_eq!(index.pointers, vec![5, 9, 12]);
        assert_eq!(index.entries.len(), 1);
        assert_eq!(index.entries[0].position, pos(1, 2));
        assert!(warnings.is_empty());
    }

    #[test]
    fn per_entry_unknown_word_is_not_checked() {
        // The word between the soft tag and the 0x8000 tag varies per
        // entry on real saves; any value must parse silently.
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(INDEX_CONSTANT).unwrap();
        buf.write_u32::<LittleEndian>(1).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf.write_u32::<LittleEndian>(0x10).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();
        encode_entry(
            &mut buf,
            pos(4, 4),
            2,
            6,
            (ENTRY_TAG_0, ENTRY_TAG_1, ENTRY_TAG_2),
            0x6e,
        );
        let mut warnings: Vec<Warning> = Vec::new();
        let index = Index::read_from(&mut Cursor::new(buf), &mut warnings).unwrap();
        assert_eq!(index.entries.len(), 1);
        assert_eq!(index.entries[0].subfile, 6);
        assert!(warnings.is_empty());
    }

    #[test]
    fn bad_header_constant_is_fatal() {
        let mut data = index_file(&[], &[]);
        data[0] = 3;
        let mut warnings: Vec<Warning> = Vec::new();
        assert!(matches!(
            Index::read_from(&mut Cursor::new(data), &mut warnings),
            Err(Error::Structure(_))
        ));
    }

    #[test]
    fn first_and_third_tags_are_hard() {
        for tags in [
            (0x20FEu16, ENTRY_TAG_1, ENTRY_TAG_2),
            (ENTRY_TAG_0, ENTRY_TAG_1, 0x8001),
        ] {
            let data = index_file(&[], &[(pos(0, 0), 0, 0, tags)]);
            let mut warnings: Vec<Warning> = Vec::new();
            assert!(matches!(
                Index::read_from(&mut Cursor::new(data), &mut warnings),
                Err(Error::Structure(_))
            ));
        }
    }

    #[test]
    fn middle_tag_only_warns() {
        let data = index_file(&[], &[(pos(0, 0), 1, 2, (ENTRY_TAG_0, 0xB, ENTRY_TAG_2))]);
        let mut warnings: Vec<Warning> = Vec::new();
        let index = Index::read_from(&mut Cursor::new(data), &mut warnings).unwrap();
        assert_eq!(index.entries.len(), 1);
        assert_eq!(
            warnings,
            vec![Warning::IndexTagMismatch {
                entry: 0,
                expected: ENTRY_TAG_1,
                actual: 0xB,
            }]
        );
    }
}

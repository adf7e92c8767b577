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

//! The outermost container layer: one shard file holds a fixed-size
//! array of slots, each either filler or carrying a payload. Chunk
//! shards (`.cdb`) and named-blob shards (`.vdb`) share this layout
//! and differ only in the kind tag and the payload decoder, so the
//! container is generic over a [`SlotPayload`] strategy.

use std::io::{Read, Seek, SeekFrom};
use std::marker::PhantomData;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

pub const FILE_HEADER_SIZE: u64 = 0x18;
pub const SUBFILE_HEADER_SIZE: usize = 0x20;
/// Every shard carries this trailer size in its header.
pub const FOOTER_SIZE: u32 = 0x14;

/// Kind tag of a chunk shard.
pub const KIND_CHUNK: u32 = 0x4;
/// Kind tag of a named-blob shard.
pub const KIND_NAMED_BLOB: u32 = 0x100;

pub const MAGIC_CDB: u32 = 0xABCD_EF98;
pub const MAGIC_VDB: u32 = 0xABCD_EF99;

/// Shard file header. The `something` counters are always 1 in every
/// observed save; `unknown0` doubles as the container kind tag.
#[derive(Debug, Clone, Copy)]
pub struct FileHeader {
    pub something0: u16,
    pub something1: u16,
    pub subfile_count: u32,
    pub unknown0: u32,
    pub subfile_size: u32,
    pub unknown1: u32,
    pub footer_size: u32,
}

impl FileHeader {
    pub fn read_from<R: Read>(buf: &mut R) -> Result<FileHeader> {
        let header = FileHeader {
            something0: buf.read_u16::<LittleEndian>()?,
            something1: buf.read_u16::<LittleEndian>()?,
            subfile_count: buf.read_u32::<LittleEndian>()?,
            unknown0: buf.read_u32::<LittleEndian>()?,
            subfile_size: buf.read_u32::<LittleEndian>()?,
            unknown1: buf.read_u32::<LittleEndian>()?,
            footer_size: buf.read_u32::<LittleEndian>()?,
        };
        if header.footer_size != FOOTER_SIZE {
            return Err(Error::Structure(format!(
                "shard trailer size is {:#X}, expected {:#X}",
                header.footer_size, FOOTER_SIZE
            )));
        }
        if (header.subfile_size as usize) < SUBFILE_HEADER_SIZE {
            return Err(Error::Structure(format!(
                "slot size {:#X} is smaller than the {:#X}-byte slot header",
                header.subfile_size, SUBFILE_HEADER_SIZE
            )));
        }
        Ok(header)
    }
}

/// One raw slot pulled out of a shard. A magic of 0 marks the slot as
/// filler; filler slots carry no content and are never parsed further.
pub struct Slot {
    pub index: usize,
    pub magic: u32,
    reserved: [u8; 8],
    content: Option<Vec<u8>>,
}

impl Slot {
    pub fn is_filler(&self) -> bool {
        self.magic == 0
    }

    /// The slot header's eight bytes after the magic. Named-blob slots
    /// store the record name length in the first of them.
    pub fn reserved(&self) -> &[u8; 8] {
        &self.reserved
    }

    /// The slot payload after the slot header.
    pub fn content(&self) -> Result<&[u8]> {
        self.content.as_deref().ok_or(Error::Filler)
    }
}

/// Per-kind decoding strategy for a slot's payload.
pub trait SlotPayload: Sized {
    /// Expected value of the shard header's `unknown0` field.
    const KIND_TAG: u32;

    fn decode(slot: Slot) -> Result<Self>;
}

/// A parsed shard file, generic over the payload kind stored in its
/// slots.
pub struct DbFile<R, P> {
    reader: R,
    base: u64,
    header: FileHeader,
    _payload: PhantomData<P>,
}

impl<R: Read + Seek, P: SlotPayload> DbFile<R, P> {
    /// Parses the shard header at the reader's current position and
    /// asserts the container kind. A kind mismatch is a hard failure:
    /// it means the file is not the sort of shard the caller thinks
    /// it is.
    pub fn new(mut reader: R) -> Result<DbFile<R, P>> {
        let base = reader.stream_position()?;
        let header = FileHeader::read_from(&mut reader)?;
        if header.unknown0 != P::KIND_TAG {
            return Err(Error::Structure(format!(
                "container kind tag is {:#X}, expected {:#X}",
                header.unknown0,
                P::KIND_TAG
            )));
        }
        Ok(DbFile {
            reader,
            base,
            header,
            _payload: PhantomData,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.header.subfile_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn slot_size(&self) -> usize {
        self.header.subfile_size as usize
    }

    /// Reads slot `index` and decodes its payload. Negative indices
    /// count back from the end of the shard; anything that resolves
    /// outside `0..len` is an index-range error.
    pub fn get(&mut self, index: i64) -> Result<P> {
        P::decode(self.slot(index)?)
    }

    /// Reads the raw slot without decoding the payload.
    pub fn slot(&mut self, index: i64) -> Result<Slot> {
        let index = resolve_index(index, self.len(), "slot")?;
        let slot_size = self.slot_size();
        self.reader.seek(SeekFrom::Start(
            self.base + FILE_HEADER_SIZE + (index * slot_size) as u64,
        ))?;
        let mut raw = vec![0; slot_size];
        self.reader.read_exact(&mut raw)?;

        // The slot header's first 0x14 bytes echo the file header (or
        // hold garbage); the magic sits right after them.
        let mut magic_bytes = &raw[0x14..];
        let magic = magic_bytes.read_u32::<LittleEndian>()?;
        let mut reserved = [0u8; 8];
        reserved.copy_from_slice(&raw[0x18..SUBFILE_HEADER_SIZE]);
        let content = if magic == 0 {
            None
        } else {
            Some(raw.split_off(SUBFILE_HEADER_SIZE))
        };
        Ok(Slot {
            index,
            magic,
            reserved,
            content,
        })
    }

    /// Iterates every populated slot in index order, skipping filler
    /// transparently.
    pub fn populated(&mut self) -> Populated<'_, R, P> {
        Populated { db: self, index: 0 }
    }
}

pub struct Populated<'a, R, P> {
    db: &'a mut DbFile<R, P>,
    index: usize,
}

impl<R: Read + Seek, P: SlotPayload> Iterator for Populated<'_, R, P> {
    type Item = Result<(usize, P)>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.db.len() {
            let index = self.index;
            self.index += 1;
            let slot = match self.db.slot(index as i64) {
                Ok(slot) => slot,
                Err(e) => return Some(Err(e)),
            };
            if slot.is_filler() {
                continue;
            }
            return Some(P::decode(slot).map(|payload| (index, payload)));
        }
        None
    }
}

/// Python-style index resolution shared by slot and section lookups:
/// negative indices count from the end, and anything still out of
/// range is a distinct index-range error rather than corruption.
pub(crate) fn resolve_index(index: i64, len: usize, what: &str) -> Result<usize> {
    let len = len as i64;
    let resolved = if index < 0 { index + len } else { index };
    if resolved < 0 || resolved >= len {
        return Err(Error::OutOfRange(format!(
            "{} index {} out of range for length {}",
            what, index, len
        )));
    }
    Ok(resolved as usize)
}

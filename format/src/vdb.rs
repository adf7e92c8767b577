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

//! Named-blob records stored in `.vdb` shards. The record name's
//! length lives in the slot header's reserved bytes; the slot content
//! holds a leading word, the name, two trailing words, then the
//! payload. The payload is a separate NBT-bearing document; this layer
//! only recovers the name and the raw bytes.

use byteorder::{LittleEndian, ReadBytesExt};

use crate::container::{self, Slot, SlotPayload};
use crate::error::{Error, Result};

struct VdbBody {
    name: String,
    unknown0: u32,
    unknown1: u16,
    unknown2: u16,
    payload: Vec<u8>,
}

/// One named blob from a named-blob shard slot.
pub struct VdbRecord {
    body: Option<VdbBody>,
}

impl SlotPayload for VdbRecord {
    const KIND_TAG: u32 = container::KIND_NAMED_BLOB;

    fn decode(slot: Slot) -> Result<VdbRecord> {
        if slot.is_filler() {
            return Ok(VdbRecord { body: None });
        }
        let name_len = slot.reserved()[0] as usize;
        let raw = slot.content()?;
        // Leading word + name + two trailing words.
        if 4 + name_len + 4 > raw.len() {
            return Err(Error::Structure(format!(
                "blob name length {} exceeds slot {} content",
                name_len, slot.index
            )));
        }
        let mut buf = raw;
        let unknown0 = buf.read_u32::<LittleEndian>()?;
        let name = std::str::from_utf8(&buf[..name_len])
            .map_err(|_| {
                Error::Structure(format!("blob name in slot {} is not UTF-8", slot.index))
            })?
            .to_owned();
        buf = &buf[name_len..];
        let unknown1 = buf.read_u16::<LittleEndian>()?;
        let unknown2 = buf.read_u16::<LittleEndian>()?;
        Ok(VdbRecord {
            body: Some(VdbBody {
                name,
                unknown0,
                unknown1,
                unknown2,
                payload: buf.to_vec(),
            }),
        })
    }
}

impl VdbRecord {
    pub fn is_filler(&self) -> bool {
        self.body.is_none()
    }

    pub fn name(&self) -> Result<&str> {
        Ok(&self.body.as_ref().ok_or(Error::Filler)?.name)
    }

    /// The opaque document after the record header; not interpreted.
    pub fn payload(&self) -> Result<&[u8]> {
        Ok(&self.body.as_ref().ok_or(Error::Filler)?.payload)
    }

    pub fn unknowns(&self) -> Result<(u32, u16, u16)> {
        let body = self.body.as_ref().ok_or(Error::Filler)?;
        Ok((body.unknown0, body.unknown1, body.unknown2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{DbFile, FOOTER_SIZE, KIND_NAMED_BLOB, MAGIC_VDB, SUBFILE_HEADER_SIZE};
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    fn vdb_shard(name: &str, payload: &[u8]) -> Vec<u8> {
        let mut slot = vec![0u8; SUBFILE_HEADER_SIZE];
        slot[0x14..0x18].copy_from_slice(&MAGIC_VDB.to_le_bytes());
        slot[0x18] = name.len() as u8;
        slot.extend(7u32.to_le_bytes());
        slot.extend(name.as_bytes());
        slot.extend(8u16.to_le_bytes());
        slot.extend(9u16.to_le_bytes());
        slot.extend(payload);
        let slot_size = 0x100;
        slot.resize(slot_size, 0);

        let mut file = Vec::new();
        file.write_u16::<LittleEndian>(1).unwrap();
        file.write_u16::<LittleEndian>(1).unwrap();
        file.write_u32::<LittleEndian>(1).unwrap();
        file.write_u32::<LittleEndian>(KIND_NAMED_BLOB).unwrap();
        file.write_u32::<LittleEndian>(slot_size as u32).unwrap();
        file.write_u32::<LittleEndian>(0).unwrap();
        file.write_u32::<LittleEndian>(FOOTER_SIZE).unwrap();
        file.extend(slot);
        file
    }

    #[test]
    fn record_round_trip() {
        let data = vdb_shard("dimension0", b"blob");
        let mut db: DbFile<_, VdbRecord> = DbFile::new(Cursor::new(data)).unwrap();
        let record = db.get(0).unwrap();
        assert!(!record.is_filler());
        assert_eq!(record.name().unwrap(), "dimension0");
        assert_eq!(record.unknowns().unwrap(), (7, 8, 9));
        assert!(record.payload().unwrap().starts_with(b"blob"));
    }

    #[test]
    fn oversized_name_rejected() {
        let mut data = vdb_shard("x", b"");
        // Name length byte in the slot header, right after the magic.
        data[0x18 + 0x18] = 0xFF;
        let mut db: DbFile<_, VdbRecord> = DbFile::new(Cursor::new(data)).unwrap();
        assert!(matches!(db.get(0), Err(Error::Structure(_))));
    }
}

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

//! The world-level metadata record (`level.dat`): a small key/value
//! document consumed opaquely. The decoder only ever reads the level
//! name and the spawn point from it.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::Result;
use crate::nbt;

pub struct Metadata {
    root: nbt::Tag,
}

impl Metadata {
    /// Reads the level.dat flavour of the format: a version and a
    /// payload-length word, then a little-endian compound.
    pub fn read_from<R: Read>(buf: &mut R) -> Result<Metadata> {
        let _version = buf.read_u32::<LittleEndian>()?;
        let _length = buf.read_u32::<LittleEndian>()?;
        let nbt::NamedTag(_, root) = nbt::read_named(buf)?;
        Ok(Metadata { root })
    }

    pub fn load(path: &Path) -> Result<Metadata> {
        Metadata::read_from(&mut BufReader::new(File::open(path)?))
    }

    pub fn name(&self) -> Option<&str> {
        self.root.get("LevelName").and_then(nbt::Tag::as_str)
    }

    pub fn spawn(&self) -> Option<(i32, i32, i32)> {
        let get = |key| self.root.get(key).and_then(nbt::Tag::as_int);
        Some((get("SpawnX")?, get("SpawnY")?, get("SpawnZ")?))
    }

    /// The raw root compound, for callers that need other keys.
    pub fn root(&self) -> &nbt::Tag {
        &self.root
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn encode(name: &str, spawn: (i32, i32, i32)) -> Vec<u8> {
        let mut body = vec![10u8, 0, 0];
        let mut put_key = |body: &mut Vec<u8>, ty: u8, key: &str| {
            body.push(ty);
            body.extend((key.len() as u16).to_le_bytes());
            body.extend(key.as_bytes());
        };
        put_key(&mut body, 8, "LevelName");
        body.extend((name.len() as u16).to_le_bytes());
        body.extend(name.as_bytes());
        put_key(&mut body, 3, "SpawnX");
        body.extend(spawn.0.to_le_bytes());
        put_key(&mut body, 3, "SpawnY");
        body.extend(spawn.1.to_le_bytes());
        put_key(&mut body, 3, "SpawnZ");
        body.extend(spawn.2.to_le_bytes());
        body.push(0);

        let mut data = Vec::new();
        data.extend(3u32.to_le_bytes());
        data.extend((body.len() as u32).to_le_bytes());
        data.extend(body);
        data
    }

    #[test]
    fn name_and_spawn() {
        let data = encode("Test World", (16, 64, -32));
        let metadata = Metadata::read_from(&mut &data[..]).unwrap();
        assert_eq!(metadata.name(), Some("Test World"));
        assert_eq!(metadata.spawn(), Some((16, 64, -32)));
    }
}

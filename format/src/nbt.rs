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

//! Read-only NBT in the little-endian flavour the handheld edition
//! uses for its world metadata. Only the read path exists; this crate
//! never writes save data.

use std::collections::HashMap;
use std::io;
use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    List(Vec<Tag>),
    Compound(HashMap<String, Tag>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedTag(pub String, pub Tag);

impl Tag {
    /// Returns the tag with the given name from the compound.
    pub fn get(&self, name: &str) -> Option<&Tag> {
        match *self {
            Tag::Compound(ref val) => val.get(name),
            _ => None,
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(*self, Tag::Compound(_))
    }

    pub fn as_byte(&self) -> Option<i8> {
        match *self {
            Tag::Byte(val) => Some(val),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match *self {
            Tag::Int(val) => Some(val),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match *self {
            Tag::Long(val) => Some(val),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Tag::String(ref val) => Some(&val[..]),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tag]> {
        match *self {
            Tag::List(ref val) => Some(&val[..]),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&HashMap<String, Tag>> {
        match *self {
            Tag::Compound(ref val) => Some(val),
            _ => None,
        }
    }

    fn read_type<R: io::Read>(id: u8, buf: &mut R) -> Result<Tag> {
        match id {
            1 => Ok(Tag::Byte(buf.read_i8()?)),
            2 => Ok(Tag::Short(buf.read_i16::<LittleEndian>()?)),
            3 => Ok(Tag::Int(buf.read_i32::<LittleEndian>()?)),
            4 => Ok(Tag::Long(buf.read_i64::<LittleEndian>()?)),
            5 => Ok(Tag::Float(buf.read_f32::<LittleEndian>()?)),
            6 => Ok(Tag::Double(buf.read_f64::<LittleEndian>()?)),
            7 => Ok(Tag::ByteArray({
                let len = buf.read_i32::<LittleEndian>()?;
                let mut data = Vec::with_capacity(len as usize);
                buf.take(len as u64).read_to_end(&mut data)?;
                data
            })),
            8 => Ok(Tag::String(read_string(buf)?)),
            9 => {
                let ty = buf.read_u8()?;
                let len = buf.read_i32::<LittleEndian>()?;
                let mut list = Vec::new();
                for _ in 0..len {
                    list.push(Tag::read_type(ty, buf)?);
                }
                Ok(Tag::List(list))
            }
            10 => {
                let mut compound = HashMap::new();
                loop {
                    let ty = buf.read_u8()?;
                    if ty == 0 {
                        break;
                    }
                    let name = read_string(buf)?;
                    compound.insert(name, Tag::read_type(ty, buf)?);
                }
                Ok(Tag::Compound(compound))
            }
            11 => Ok(Tag::IntArray({
                let len = buf.read_i32::<LittleEndian>()?;
                let mut data = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    data.push(buf.read_i32::<LittleEndian>()?);
                }
                data
            })),
            12 => Ok(Tag::LongArray({
                let len = buf.read_i32::<LittleEndian>()?;
                let mut data = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    data.push(buf.read_i64::<LittleEndian>()?);
                }
                data
            })),
            _ => Err(Error::Structure(format!("invalid nbt tag type {}", id))),
        }
    }
}

pub fn read_string<R: io::Read>(buf: &mut R) -> Result<String> {
    let len = buf.read_u16::<LittleEndian>()?;
    let mut bytes = Vec::new();
    buf.take(len as u64).read_to_end(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| Error::Structure("nbt string is not UTF-8".to_owned()))
}

/// Reads one named root tag, which must be a compound.
pub fn read_named<R: io::Read>(buf: &mut R) -> Result<NamedTag> {
    let ty = buf.read_u8()?;
    if ty != 10 {
        return Err(Error::Structure(format!(
            "nbt root tag type is {}, expected a compound",
            ty
        )));
    }
    let name = read_string(buf)?;
    Ok(NamedTag(name, Tag::read_type(10, buf)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_string(buf: &mut Vec<u8>, s: &str) {
        buf.extend((s.len() as u16).to_le_bytes());
        buf.extend(s.as_bytes());
    }

    #[test]
    fn compound_round_trip() {
        let mut data = vec![10u8];
        write_string(&mut data, "");
        data.push(8);
        write_string(&mut data, "LevelName");
        write_string(&mut data, "My World");
        data.push(3);
        write_string(&mut data, "SpawnX");
        data.extend(42i32.to_le_bytes());
        data.push(0);

        let NamedTag(name, root) = read_named(&mut &data[..]).unwrap();
        assert_eq!(name, "");
        assert_eq!(root.get("LevelName").and_then(Tag::as_str), Some("My World"));
        assert_eq!(root.get("SpawnX").and_then(Tag::as_int), Some(42));
    }

    #[test]
    fn non_compound_root_rejected() {
        let data = vec![3u8, 0, 0];
        assert!(matches!(
            read_named(&mut &data[..]),
            Err(Error::Structure(_))
        ));
    }
}

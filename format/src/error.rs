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

/// Errors raised while decoding a world database.
///
/// The variants separate the failure classes the format distinguishes:
/// `Structure` for violated layout assumptions (fixed header sizes,
/// container kind tags), `OutOfRange` for slot or section indices past
/// the end, `Integrity` for data that parses but contradicts itself
/// (size mismatches, stale index entries, duplicate positions), and
/// `Filler` for reads against a blank slot.
#[derive(Debug)]
pub enum Error {
    IOError(io::Error),
    Structure(String),
    OutOfRange(String),
    Integrity(String),
    Filler,
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::IOError(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::IOError(ref e) => e.fmt(f),
            Error::Structure(ref msg) => write!(f, "structure error: {}", msg),
            Error::OutOfRange(ref msg) => write!(f, "index out of range: {}", msg),
            Error::Integrity(ref msg) => write!(f, "integrity error: {}", msg),
            Error::Filler => write!(f, "cannot read a filler slot"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::IOError(ref e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

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

//! Decoder for the sharded, slot-based world database used by the 3DS
//! edition of the game. A world is stored as a directory of fixed-size
//! shard files (`slt<N>.cdb` for chunk data, `slt<N>.vdb` for named
//! blobs) plus a cross-shard index file; this crate reconstructs a
//! sparse, randomly-addressable block world from those files.

pub mod chunk;
pub mod container;
pub mod diagnostics;
pub mod error;
pub mod index;
pub mod metadata;
pub mod nbt;
pub mod nibble;
pub mod position;
pub mod terrain;
pub mod vdb;
pub mod world;

pub use self::diagnostics::{DiagnosticSink, LogSink, Warning};
pub use self::error::Error;
pub use self::position::{ChunkPos, Dimension};
pub use self::world::World;

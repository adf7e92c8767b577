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

//! World assembly: resolve every index entry to its chunk, validate
//! it, and build the sparse chunk map that backs random block access
//! and exhaustive iteration.

use std::collections::hash_map;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::debug;

use crate::chunk::Chunk;
use crate::container::{DbFile, SlotPayload};
use crate::diagnostics::DiagnosticSink;
use crate::error::{Error, Result};
use crate::index::{Index, IndexEntry};
use crate::metadata::Metadata;
use crate::position::{ChunkPos, Dimension};
use crate::terrain::Terrain;
use crate::vdb::VdbRecord;

pub const CHUNK_EXTENSION: &str = ".cdb";
pub const BLOB_EXTENSION: &str = ".vdb";
pub const INDEX_PRIMARY: &str = "newindex.cdb";
/// Used only when the primary is absent: a world that has seen a
/// single index generation never creates the primary name.
pub const INDEX_SECONDARY: &str = "index.cdb";

/// Parses `slt<N>.<ext>` filenames. `N` must have no leading zero
/// except for `0` itself, which later format revisions emit.
fn shard_number(name: &str, extension: &str) -> Option<u32> {
    let digits = name.strip_prefix("slt")?.strip_suffix(extension)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// A directory of shard files keyed by shard number. Opened shards
/// are cached for the lifetime of the directory; the inputs are
/// treated as read-only for the session, so there is no invalidation.
pub struct ShardDirectory<P> {
    files: HashMap<u32, PathBuf>,
    cache: HashMap<u32, DbFile<File, P>>,
}

impl<P: SlotPayload> ShardDirectory<P> {
    pub fn scan(path: &Path, extension: &str) -> Result<ShardDirectory<P>> {
        let mut files = HashMap::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some(number) = name.to_str().and_then(|n| shard_number(n, extension)) {
                files.insert(number, entry.path());
            }
        }
        Ok(ShardDirectory {
            files,
            cache: HashMap::new(),
        })
    }

    pub fn contains(&self, number: u32) -> bool {
        self.files.contains_key(&number)
    }

    /// Shard numbers present on disk, ascending.
    pub fn numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.files.keys().copied().collect();
        numbers.sort_unstable();
        numbers
    }

    /// Opens (and caches) the shard with the given number.
    pub fn open(&mut self, number: u32) -> Result<&mut DbFile<File, P>> {
        match self.cache.entry(number) {
            hash_map::Entry::Occupied(entry) => Ok(entry.into_mut()),
            hash_map::Entry::Vacant(vacant) => {
                let path = self.files.get(&number).ok_or_else(|| {
                    Error::OutOfRange(format!("no shard file numbered {}", number))
                })?;
                Ok(vacant.insert(DbFile::new(File::open(path)?)?))
            }
        }
    }
}

/// One resident chunk of the assembled world: the index entry it came
/// from plus its decoded section-0 block bands.
pub struct Entry {
    index_entry: IndexEntry,
    terrain: Terrain,
}

impl Entry {
    pub fn index_entry(&self) -> &IndexEntry {
        &self.index_entry
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// `(block_id, block_data)` at chunk-local coordinates.
    pub fn block(&self, x: usize, y: usize, z: usize) -> (u8, u8) {
        self.terrain.block(x, y, z)
    }
}

/// A fully-loaded world: an immutable sparse map from chunk position
/// to [`Entry`], plus the metadata document and the named-blob shards.
pub struct World {
    path: PathBuf,
    metadata: Metadata,
    entries: HashMap<ChunkPos, Entry>,
    chunk_shards: ShardDirectory<Chunk>,
    blob_shards: ShardDirectory<VdbRecord>,
}

impl World {
    /// Loads the world rooted at `path` (the directory that holds
    /// `level.dat` and `db/`). Warnings go to `sink`; anything fatal
    /// aborts the load.
    pub fn load(path: &Path, sink: &mut dyn DiagnosticSink) -> Result<World> {
        let cdb_path = path.join("db").join("cdb");
        let vdb_path = path.join("db").join("vdb");
        let mut chunk_shards = ShardDirectory::scan(&cdb_path, CHUNK_EXTENSION)?;
        let blob_shards = ShardDirectory::scan(&vdb_path, BLOB_EXTENSION)?;

        let metadata = Metadata::load(&path.join("level.dat"))?;

        let primary = cdb_path.join(INDEX_PRIMARY);
        let index_path = if primary.is_file() {
            primary
        } else {
            cdb_path.join(INDEX_SECONDARY)
        };
        let index = Index::read_from(&mut BufReader::new(File::open(index_path)?), sink)?;

        let entries = assemble(&mut chunk_shards, &index)?;
        Ok(World {
            path: path.to_owned(),
            metadata,
            entries,
            chunk_shards,
            blob_shards,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.name()
    }

    pub fn chunk_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, position: &ChunkPos) -> Option<&Entry> {
        self.entries.get(position)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ChunkPos, &Entry)> {
        self.entries.iter()
    }

    /// The entry covering world column `(x, z)` in `dimension`.
    pub fn entry_at(&self, dimension: Dimension, x: i32, z: i32) -> Option<&Entry> {
        self.entries.get(&ChunkPos {
            x: x >> 4,
            z: z >> 4,
            dimension,
        })
    }

    /// `(block_id, block_data)` at a world coordinate. A position
    /// with no resident chunk, or above the chunk's populated bands,
    /// is air; never an error.
    pub fn block(&self, dimension: Dimension, x: i32, y: i32, z: i32) -> (u8, u8) {
        if y < 0 {
            return (0, 0);
        }
        match self.entry_at(dimension, x, z) {
            Some(entry) => entry.block((x & 0xF) as usize, y as usize, (z & 0xF) as usize),
            None => (0, 0),
        }
    }

    /// Lazily enumerates every block of every resident chunk: for
    /// each entry the full 16 x 16 x height volume, x outer, z
    /// middle, y inner. A finite, single-pass sequence.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            entries: self.entries.iter(),
            current: None,
            x: 0,
            z: 0,
            y: 0,
        }
    }

    /// Access to the chunk shards, for tooling that walks slots
    /// directly (for instance dumping every section of every chunk).
    pub fn chunk_shards(&mut self) -> &mut ShardDirectory<Chunk> {
        &mut self.chunk_shards
    }

    /// Decodes every named-blob record, as `(shard, slot, record)`.
    pub fn named_records(&mut self) -> Result<Vec<(u32, usize, VdbRecord)>> {
        let mut records = Vec::new();
        for number in self.blob_shards.numbers() {
            let shard = self.blob_shards.open(number)?;
            for item in shard.populated() {
                let (slot, record) = item?;
                records.push((number, slot, record));
            }
        }
        Ok(records)
    }
}

fn assemble(
    shards: &mut ShardDirectory<Chunk>,
    index: &Index,
) -> Result<HashMap<ChunkPos, Entry>> {
    let mut entries = HashMap::new();
    for index_entry in &index.entries {
        let number = index_entry.slot as u32;
        // Index entries may point at shards that were never written;
        // those chunks simply don't exist.
        if !shards.contains(number) {
            debug!(
                "no shard {} for index entry at {:?}, skipping",
                number, index_entry.position
            );
            continue;
        }
        let shard = shards.open(number)?;
        let chunk = shard.get(index_entry.subfile as i64)?;
        if chunk.is_filler() {
            continue;
        }
        let position = chunk.position()?;
        if position != index_entry.position {
            return Err(Error::Integrity(format!(
                "chunk in shard {} slot {} decodes to position {:?} but the index says {:?}",
                number, index_entry.subfile, position, index_entry.position
            )));
        }
        if entries.contains_key(&position) {
            return Err(Error::Integrity(format!(
                "duplicate position {:?} (shard {} slot {})",
                position, number, index_entry.subfile
            )));
        }
        let terrain = match chunk.section(0)? {
            Some(section) => Terrain::parse(&section.decompress()?)?,
            None => Terrain::empty(),
        };
        entries.insert(
            position,
            Entry {
                index_entry: *index_entry,
                terrain,
            },
        );
    }
    Ok(entries)
}

/// One item of the exhaustive block stream.
pub struct BlockRecord<'a> {
    /// World-space block position, `(x, y, z)`.
    pub position: (i32, i32, i32),
    pub dimension: Dimension,
    pub entry: &'a Entry,
    /// `(block_id, block_data)`.
    pub block: (u8, u8),
}

pub struct Blocks<'a> {
    entries: hash_map::Iter<'a, ChunkPos, Entry>,
    current: Option<(&'a ChunkPos, &'a Entry)>,
    x: usize,
    z: usize,
    y: usize,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = BlockRecord<'a>;

    fn next(&mut self) -> Option<BlockRecord<'a>> {
        loop {
            let (pos, entry) = match self.current {
                Some(current) => current,
                None => {
                    let current = self.entries.next()?;
                    self.current = Some(current);
                    self.x = 0;
                    self.z = 0;
                    self.y = 0;
                    current
                }
            };
            let height = entry.terrain().height();
            if height == 0 {
                self.current = None;
                continue;
            }

            let (x, z, y) = (self.x, self.z, self.y);
            self.y += 1;
            if self.y == height {
                self.y = 0;
                self.z += 1;
                if self.z == 16 {
                    self.z = 0;
                    self.x += 1;
                    if self.x == 16 {
                        self.current = None;
                    }
                }
            }

            return Some(BlockRecord {
                position: (pos.x * 16 + x as i32, y as i32, pos.z * 16 + z as i32),
                dimension: pos.dimension,
                entry,
                block: entry.block(x, y, z),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{BAND_DATA_SIZE, BAND_VOLUME, BIOME_GRID_SIZE};

    fn entry(pos: ChunkPos, bands: usize, fill: u8) -> Entry {
        let band = (vec![fill; BAND_VOLUME], vec![0u8; BAND_DATA_SIZE]);
        let raw = crate::terrain::tests::encode(
            &vec![band; bands],
            &[0; BIOME_GRID_SIZE],
        );
        Entry {
            index_entry: IndexEntry {
                position: pos,
                slot: 0,
                subfile: 0,
            },
            terrain: Terrain::parse(&raw).unwrap(),
        }
    }

    fn world_with(entries: Vec<Entry>) -> World {
        let mut map = HashMap::new();
        for e in entries {
            map.insert(e.index_entry.position, e);
        }
        World {
            path: PathBuf::new(),
            metadata: Metadata::read_from(
                &mut &crate::metadata::tests::encode("t", (0, 0, 0))[..],
            )
            .unwrap(),
            entries: map,
            chunk_shards: ShardDirectory {
                files: HashMap::new(),
                cache: HashMap::new(),
            },
            blob_shards: ShardDirectory {
                files: HashMap::new(),
                cache: HashMap::new(),
            },
        }
    }

    fn pos(x: i32, z: i32, dimension: Dimension) -> ChunkPos {
        ChunkPos { x, z, dimension }
    }

    #[test]
    fn shard_number_parsing() {
        assert_eq!(shard_number("slt4.cdb", CHUNK_EXTENSION), Some(4));
        assert_eq!(shard_number("slt0.cdb", CHUNK_EXTENSION), Some(0));
        assert_eq!(shard_number("slt12.vdb", BLOB_EXTENSION), Some(12));
        assert_eq!(shard_number("slt04.cdb", CHUNK_EXTENSION), None);
        assert_eq!(shard_number("slt.cdb", CHUNK_EXTENSION), None);
        assert_eq!(shard_number("slt4.vdb", CHUNK_EXTENSION), None);
        assert_eq!(shard_number("index.cdb", CHUNK_EXTENSION), None);
    }

    #[test]
    fn absent_chunk_reads_as_air() {
        let world = world_with(vec![]);
        assert_eq!(world.block(Dimension::Overworld, 5, 10, -3), (0, 0));
    }

    #[test]
    fn block_lookup_masks_chunk_coordinates() {
        let world = world_with(vec![entry(pos(-1, 0, Dimension::Overworld), 1, 9)]);
        // World x -16..-1 lives in chunk -1.
        assert_eq!(world.block(Dimension::Overworld, -16, 0, 0), (9, 0));
        assert_eq!(world.block(Dimension::Overworld, -1, 15, 15), (9, 0));
        // Above the single band: air.
        assert_eq!(world.block(Dimension::Overworld, -1, 16, 15), (0, 0));
        // Same column, other dimension: no chunk there.
        assert_eq!(world.block(Dimension::Nether, -16, 0, 0), (0, 0));
    }

    #[test]
    fn iterator_covers_full_volume_in_order() {
        let world = world_with(vec![entry(pos(2, -3, Dimension::Overworld), 1, 0)]);
        let records: Vec<_> = world.blocks().collect();
        assert_eq!(records.len(), 4096);
        assert!(records
            .iter()
            .all(|r| r.dimension == Dimension::Overworld && r.block == (0, 0)));
        // x outer, z middle, y inner, in world coordinates.
        assert_eq!(records[0].position, (32, 0, -48));
        assert_eq!(records[1].position, (32, 1, -48));
        assert_eq!(records[16].position, (32, 0, -47));
        assert_eq!(records[256].position, (33, 0, -48));
        assert_eq!(records[4095].position, (47, 15, -33));
    }

    #[test]
    fn iterator_spans_multiple_bands_and_chunks() {
        let world = world_with(vec![
            entry(pos(0, 0, Dimension::Overworld), 2, 1),
            entry(pos(1, 0, Dimension::End), 1, 2),
        ]);
        let records: Vec<_> = world.blocks().collect();
        assert_eq!(records.len(), 16 * 16 * 32 + 4096);
        let end_blocks = records
            .iter()
            .filter(|r| r.dimension == Dimension::End)
            .count();
        assert_eq!(end_blocks, 4096);
    }

    #[test]
    fn iterator_skips_bandless_entries() {
        let world = world_with(vec![entry(pos(0, 0, Dimension::Overworld), 0, 0)]);
        assert_eq!(world.blocks().count(), 0);
    }
}

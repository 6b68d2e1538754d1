use std::error::Error;
use std::fmt;

use glam::IVec3;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::block::{BlockCatalog, BlockId, Direction};
use crate::chunk::Chunk;
use crate::coords::{world_to_chunk, ChunkCoord};
use crate::lighting::recompute_sky_light;
use crate::mesh::{build_mesh, ChunkNeighbors};
use crate::worldgen::BlockClassifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldError {
    /// A query touched a coordinate that is not loaded. Callers must
    /// distinguish "air" from "unknown", so this is never silently
    /// mapped to AIR.
    ChunkNotResident(ChunkCoord),
    /// `create`/`commit` on an already-resident coordinate. The load
    /// policy and the store have desynchronized.
    DuplicateCreate(ChunkCoord),
    /// `delete` on a non-resident coordinate. Same desync.
    MissingDeleteTarget(ChunkCoord),
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::ChunkNotResident(coord) => {
                write!(f, "chunk ({}, {}) is not resident", coord.x, coord.z)
            }
            WorldError::DuplicateCreate(coord) => {
                write!(f, "chunk ({}, {}) is already resident", coord.x, coord.z)
            }
            WorldError::MissingDeleteTarget(coord) => {
                write!(
                    f,
                    "delete target chunk ({}, {}) is not resident",
                    coord.x, coord.z
                )
            }
        }
    }
}

impl Error for WorldError {}

/// Owner of every resident chunk and the single mutation point for
/// chunk existence. Insertion, deletion and neighbor-link updates all
/// funnel through `&mut self`; read-only queries may be shared.
pub struct ChunkStore {
    chunks: FxHashMap<ChunkCoord, Chunk>,
    classifier: BlockClassifier,
}

impl ChunkStore {
    pub fn new(seed: u64) -> Self {
        Self {
            chunks: FxHashMap::default(),
            classifier: BlockClassifier::new(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.classifier.seed()
    }

    pub fn classifier(&self) -> &BlockClassifier {
        &self.classifier
    }

    pub fn resident_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// The chunk a world position falls in, flooring toward negative
    /// infinity.
    pub fn chunk_of(&self, world_pos: IVec3) -> ChunkCoord {
        ChunkCoord::containing(world_pos)
    }

    /// Generates terrain for `coord` and makes it resident. Fails on
    /// an already-resident coordinate; that is a loader bug, not a
    /// recoverable condition.
    pub fn create(&mut self, coord: ChunkCoord) -> Result<(), WorldError> {
        let chunk = self.classifier.generate_chunk(coord);
        self.commit(coord, chunk)
    }

    /// Inserts a chunk generated elsewhere (possibly off-thread) and
    /// links it into the neighbor graph. Single-writer: neighbor
    /// linking mutates already-resident chunks too.
    pub fn commit(&mut self, coord: ChunkCoord, chunk: Chunk) -> Result<(), WorldError> {
        if self.chunks.contains_key(&coord) {
            return Err(WorldError::DuplicateCreate(coord));
        }

        self.chunks.insert(coord, chunk);
        self.link_neighbors(coord);
        debug!("chunk ({}, {}) committed", coord.x, coord.z);
        Ok(())
    }

    /// Removes `coord` from the store and clears every resident
    /// neighbor's link back at it before the chunk is dropped.
    pub fn delete(&mut self, coord: ChunkCoord) -> Result<(), WorldError> {
        if self.chunks.remove(&coord).is_none() {
            return Err(WorldError::MissingDeleteTarget(coord));
        }

        for direction in Direction::HORIZONTAL {
            let offset = direction.offset();
            let adjacent = coord.offset(offset.x, offset.z);
            if let Some(neighbor) = self.chunks.get_mut(&adjacent) {
                neighbor.set_neighbor(direction.opposite(), None);
                // The seam light was sampled from the removed chunk;
                // the survivor must remesh under the absent-neighbor
                // full-brightness rule.
                neighbor.dirty = true;
            }
        }

        debug!("chunk ({}, {}) deleted", coord.x, coord.z);
        Ok(())
    }

    pub fn block_at(&self, world_pos: IVec3) -> Result<BlockId, WorldError> {
        let (coord, local) = world_to_chunk(world_pos);
        let chunk = self
            .chunks
            .get(&coord)
            .ok_or(WorldError::ChunkNotResident(coord))?;
        Ok(chunk.get(local))
    }

    /// Overwrites a voxel and marks the owning chunk dirty. Writing
    /// the type already present is a no-op and leaves the dirty flag
    /// untouched.
    pub fn set_block(&mut self, world_pos: IVec3, block: BlockId) -> Result<(), WorldError> {
        let (coord, local) = world_to_chunk(world_pos);
        let chunk = self
            .chunks
            .get_mut(&coord)
            .ok_or(WorldError::ChunkNotResident(coord))?;

        if chunk.get(local) == block {
            return Ok(());
        }

        chunk.set(local, block);
        chunk.dirty = true;
        Ok(())
    }

    pub fn dirty_coords(&self) -> Vec<ChunkCoord> {
        self.chunks
            .iter()
            .filter(|(_, chunk)| chunk.dirty)
            .map(|(coord, _)| *coord)
            .collect()
    }

    /// Full sky-light flood fill for one chunk.
    pub fn relight(&mut self, coord: ChunkCoord, catalog: &BlockCatalog) -> Result<(), WorldError> {
        let chunk = self
            .chunks
            .get_mut(&coord)
            .ok_or(WorldError::ChunkNotResident(coord))?;
        recompute_sky_light(chunk, catalog);
        Ok(())
    }

    /// Rebuilds the chunk's mesh from its blocks and light field,
    /// clears the dirty flag and raises `needs_upload`.
    pub fn rebuild_mesh(
        &mut self,
        coord: ChunkCoord,
        catalog: &BlockCatalog,
    ) -> Result<(), WorldError> {
        let chunk = self
            .chunks
            .get(&coord)
            .ok_or(WorldError::ChunkNotResident(coord))?;
        let neighbors = self.resolve_neighbors(chunk);
        let mesh = build_mesh(chunk, coord, catalog, &neighbors);

        let chunk = self
            .chunks
            .get_mut(&coord)
            .expect("chunk was resident above");
        chunk.mesh = mesh;
        chunk.dirty = false;
        chunk.needs_upload = true;
        Ok(())
    }

    fn resolve_neighbors<'a>(&'a self, chunk: &Chunk) -> ChunkNeighbors<'a> {
        let resolve = |direction: Direction| {
            chunk
                .neighbor(direction)
                .and_then(|coord| self.chunks.get(&coord))
        };
        ChunkNeighbors {
            north: resolve(Direction::North),
            south: resolve(Direction::South),
            west: resolve(Direction::West),
            east: resolve(Direction::East),
        }
    }

    /// For each of the four compass directions, if the adjacent
    /// coordinate is resident, link both ways: the new chunk toward
    /// the neighbor and the neighbor back in the opposite direction.
    fn link_neighbors(&mut self, coord: ChunkCoord) {
        for direction in Direction::HORIZONTAL {
            let offset = direction.offset();
            let adjacent = coord.offset(offset.x, offset.z);
            if !self.chunks.contains_key(&adjacent) {
                continue;
            }

            if let Some(chunk) = self.chunks.get_mut(&coord) {
                chunk.set_neighbor(direction, Some(adjacent));
            }
            if let Some(neighbor) = self.chunks.get_mut(&adjacent) {
                neighbor.set_neighbor(direction.opposite(), Some(coord));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec3;

    use super::{ChunkStore, WorldError};
    use crate::block::{default_catalog, BlockId, Direction};
    use crate::coords::{ChunkCoord, CHUNK_WIDTH_I32};

    const TEST_SEED: u64 = 5271998;

    #[test]
    fn create_then_duplicate_create_fails() {
        let mut store = ChunkStore::new(TEST_SEED);
        let coord = ChunkCoord::new(0, 0);

        store.create(coord).expect("first create succeeds");
        assert!(store.is_loaded(coord));
        assert_eq!(store.create(coord), Err(WorldError::DuplicateCreate(coord)));
    }

    #[test]
    fn delete_of_missing_chunk_fails_fast() {
        let mut store = ChunkStore::new(TEST_SEED);
        let coord = ChunkCoord::new(16, -32);
        assert_eq!(
            store.delete(coord),
            Err(WorldError::MissingDeleteTarget(coord))
        );
    }

    #[test]
    fn block_queries_against_unloaded_chunks_are_explicit_errors() {
        let mut store = ChunkStore::new(TEST_SEED);
        let pos = IVec3::new(100, 64, 100);
        let coord = store.chunk_of(pos);

        assert_eq!(store.block_at(pos), Err(WorldError::ChunkNotResident(coord)));
        assert_eq!(
            store.set_block(pos, BlockId::STONE),
            Err(WorldError::ChunkNotResident(coord))
        );
    }

    #[test]
    fn chunk_of_floors_toward_negative_infinity() {
        let store = ChunkStore::new(TEST_SEED);
        assert_eq!(
            store.chunk_of(IVec3::new(-1, 0, 0)),
            ChunkCoord::new(-CHUNK_WIDTH_I32, 0)
        );
        assert_eq!(
            store.chunk_of(IVec3::new(CHUNK_WIDTH_I32, 0, 0)),
            ChunkCoord::new(CHUNK_WIDTH_I32, 0)
        );
    }

    #[test]
    fn same_type_edit_does_not_dirty_the_chunk() {
        let catalog = default_catalog();
        let mut store = ChunkStore::new(TEST_SEED);
        let coord = ChunkCoord::new(0, 0);
        store.create(coord).expect("create");
        store.relight(coord, &catalog).expect("relight");
        store.rebuild_mesh(coord, &catalog).expect("mesh");
        assert!(!store.chunk(coord).expect("resident").dirty);

        let pos = IVec3::new(8, 100, 5);
        let existing = store.block_at(pos).expect("resident");
        store.set_block(pos, existing).expect("resident");
        assert!(!store.chunk(coord).expect("resident").dirty);

        store.set_block(pos, BlockId::SAND).expect("resident");
        assert!(store.chunk(coord).expect("resident").dirty);
    }

    #[test]
    fn neighbor_links_are_bidirectional() {
        let mut store = ChunkStore::new(TEST_SEED);
        let a = ChunkCoord::new(0, 0);
        let b = ChunkCoord::new(CHUNK_WIDTH_I32, 0);

        store.create(a).expect("create a");
        store.create(b).expect("create b");

        // b is east of a.
        assert_eq!(
            store.chunk(a).expect("a").neighbor(Direction::East),
            Some(b)
        );
        assert_eq!(
            store.chunk(b).expect("b").neighbor(Direction::West),
            Some(a)
        );
        assert_eq!(store.chunk(a).expect("a").neighbor(Direction::North), None);
    }

    #[test]
    fn delete_unlinks_every_resident_neighbor() {
        let mut store = ChunkStore::new(TEST_SEED);
        let center = ChunkCoord::new(0, 0);
        store.create(center).expect("create center");

        for direction in Direction::HORIZONTAL {
            let offset = direction.offset();
            store
                .create(center.offset(offset.x, offset.z))
                .expect("create neighbor");
        }

        store.delete(center).expect("delete center");
        assert!(!store.is_loaded(center));

        for direction in Direction::HORIZONTAL {
            let offset = direction.offset();
            let neighbor = store
                .chunk(center.offset(offset.x, offset.z))
                .expect("neighbor still resident");
            assert_eq!(neighbor.neighbor(direction.opposite()), None);
        }

        // The coordinate can be reused after destruction.
        store.create(center).expect("recreate");
        assert_eq!(
            store.chunk(center).expect("resident").neighbor(Direction::East),
            Some(center.offset(1, 0))
        );
    }

    #[test]
    fn deleting_a_neighbor_relights_the_surviving_seam() {
        let catalog = default_catalog();
        let mut store = ChunkStore::new(TEST_SEED);
        let a = ChunkCoord::new(0, 0);
        let b = ChunkCoord::new(CHUNK_WIDTH_I32, 0);
        store.create(a).expect("create a");
        store.create(b).expect("create b");
        for coord in [a, b] {
            store.relight(coord, &catalog).expect("relight");
            store.rebuild_mesh(coord, &catalog).expect("mesh");
        }

        // Vertices of a's mesh on the shared face plane whose sunlight
        // nibble is zero, i.e. sampled from inside solid terrain.
        let dark_seam_vertices = |store: &ChunkStore| {
            let chunk = store.chunk(a).expect("resident");
            chunk
                .mesh
                .vertices
                .iter()
                .filter(|v| {
                    let [x, _, _] = v.position;
                    x == CHUNK_WIDTH_I32 as f32 && (v.light & 0x0F) == 0
                })
                .count()
        };

        // While b is resident, a's east faces below b's surface sample
        // b's unlit interior.
        assert!(dark_seam_vertices(&store) > 0);

        store.delete(b).expect("delete b");
        assert!(store.chunk(a).expect("resident").dirty);

        store.relight(a, &catalog).expect("relight");
        store.rebuild_mesh(a, &catalog).expect("mesh");
        assert_eq!(dark_seam_vertices(&store), 0);
        assert!(!store.chunk(a).expect("resident").dirty);
    }

    #[test]
    fn generated_chunks_are_deterministic_per_seed() {
        let mut a = ChunkStore::new(TEST_SEED);
        let mut b = ChunkStore::new(TEST_SEED);
        let coord = ChunkCoord::new(-48, 32);
        a.create(coord).expect("create");
        b.create(coord).expect("create");

        let pos = IVec3::new(-41, 70, 37);
        assert_eq!(a.block_at(pos), b.block_at(pos));
    }
}

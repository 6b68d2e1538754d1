use crate::block::{BlockId, Direction};
use crate::coords::{local_to_index, ChunkCoord, LocalPos, CHUNK_AREA, CHUNK_VOLUME};
use crate::lighting::MAX_LIGHT;
use crate::mesh::MeshBuffer;
use crate::worldgen::Biome;

/// One resident chunk: the voxel grid, its column biomes, the packed
/// light field, and the links into the neighbor graph. Neighbor links
/// are coordinates rather than references; the store resolves them, so
/// deleting a chunk can never leave a dangling pointer behind.
#[derive(Clone, Debug)]
pub struct Chunk {
    blocks: Box<[BlockId; CHUNK_VOLUME]>,
    biomes: Box<[Biome; CHUNK_AREA]>,
    /// Low nibble sunlight 0-15, high nibble torchlight 0-15.
    light: Box<[u8; CHUNK_VOLUME]>,
    /// Blocks differ from what was last meshed. Cleared only by a
    /// successful mesh rebuild.
    pub dirty: bool,
    neighbors: [Option<ChunkCoord>; 4],
    pub mesh: MeshBuffer,
    /// Renderer checks this before re-uploading the vertex buffer.
    pub needs_upload: bool,
}

impl Chunk {
    pub fn new_empty() -> Self {
        Self {
            blocks: Box::new([BlockId::AIR; CHUNK_VOLUME]),
            biomes: Box::new([Biome::Grass; CHUNK_AREA]),
            light: Box::new([0; CHUNK_VOLUME]),
            dirty: true,
            neighbors: [None; 4],
            mesh: MeshBuffer::default(),
            needs_upload: false,
        }
    }

    pub fn get(&self, local: LocalPos) -> BlockId {
        self.blocks[local_to_index(local)]
    }

    pub fn set(&mut self, local: LocalPos, block: BlockId) {
        self.blocks[local_to_index(local)] = block;
    }

    pub fn biome_at(&self, x: usize, z: usize) -> Biome {
        self.biomes[x + z * crate::coords::CHUNK_WIDTH]
    }

    pub fn set_biome(&mut self, x: usize, z: usize, biome: Biome) {
        self.biomes[x + z * crate::coords::CHUNK_WIDTH] = biome;
    }

    pub fn packed_light(&self, local: LocalPos) -> u8 {
        self.light[local_to_index(local)]
    }

    pub fn sunlight(&self, local: LocalPos) -> u8 {
        self.light[local_to_index(local)] & 0x0F
    }

    pub fn torchlight(&self, local: LocalPos) -> u8 {
        self.light[local_to_index(local)] >> 4
    }

    pub fn set_sunlight(&mut self, local: LocalPos, level: u8) {
        let index = local_to_index(local);
        let clamped = level.min(MAX_LIGHT);
        self.light[index] = (self.light[index] & 0xF0) | clamped;
    }

    pub fn set_torchlight(&mut self, local: LocalPos, level: u8) {
        let index = local_to_index(local);
        let clamped = level.min(MAX_LIGHT);
        self.light[index] = (self.light[index] & 0x0F) | (clamped << 4);
    }

    pub fn clear_light(&mut self) {
        self.light.fill(0);
    }

    pub fn neighbor(&self, direction: Direction) -> Option<ChunkCoord> {
        debug_assert!(
            direction.index() < 4,
            "chunks only neighbor horizontally, got {direction:?}"
        );
        self.neighbors[direction.index()]
    }

    pub fn set_neighbor(&mut self, direction: Direction, coord: Option<ChunkCoord>) {
        debug_assert!(direction.index() < 4);
        self.neighbors[direction.index()] = coord;
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new_empty()
    }
}

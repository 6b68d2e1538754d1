use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

pub const CHUNK_WIDTH: usize = 16;
pub const CHUNK_HEIGHT: usize = 128;
pub const CHUNK_VOLUME: usize = CHUNK_WIDTH * CHUNK_HEIGHT * CHUNK_WIDTH;
pub const CHUNK_AREA: usize = CHUNK_WIDTH * CHUNK_WIDTH;

pub const CHUNK_WIDTH_I32: i32 = CHUNK_WIDTH as i32;
pub const CHUNK_HEIGHT_I32: i32 = CHUNK_HEIGHT as i32;

/// Origin of a chunk in world units. Both components are always a
/// multiple of `CHUNK_WIDTH`; chunks only tile horizontally.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

/// Position of a voxel within its chunk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        debug_assert!(
            x.rem_euclid(CHUNK_WIDTH_I32) == 0 && z.rem_euclid(CHUNK_WIDTH_I32) == 0,
            "chunk coordinate ({x}, {z}) is not aligned to the chunk width"
        );
        Self { x, z }
    }

    /// The chunk containing a world position, flooring toward negative
    /// infinity. Truncating division would map x = -1 into the chunk at
    /// 0 instead of -CHUNK_WIDTH.
    pub fn containing(world_pos: IVec3) -> Self {
        Self {
            x: floor_to_chunk(world_pos.x),
            z: floor_to_chunk(world_pos.z),
        }
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx * CHUNK_WIDTH_I32,
            z: self.z + dz * CHUNK_WIDTH_I32,
        }
    }

    /// Chebyshev distance to another chunk, in whole chunks.
    pub fn chunk_distance(self, other: ChunkCoord) -> i32 {
        let dx = (self.x - other.x) / CHUNK_WIDTH_I32;
        let dz = (self.z - other.z) / CHUNK_WIDTH_I32;
        dx.abs().max(dz.abs())
    }

    pub fn origin(self) -> Vec3 {
        Vec3::new(self.x as f32, 0.0, self.z as f32)
    }
}

fn floor_to_chunk(value: i32) -> i32 {
    value.div_euclid(CHUNK_WIDTH_I32) * CHUNK_WIDTH_I32
}

/// Splits a world position into its chunk and the offset inside it.
/// Y is clamped by the caller; this only asserts it is in range.
pub fn world_to_chunk(world_pos: IVec3) -> (ChunkCoord, LocalPos) {
    debug_assert!(
        (0..CHUNK_HEIGHT_I32).contains(&world_pos.y),
        "world y {} outside [0, {CHUNK_HEIGHT_I32})",
        world_pos.y
    );

    let coord = ChunkCoord::containing(world_pos);
    let local = LocalPos {
        x: world_pos.x.rem_euclid(CHUNK_WIDTH_I32) as u8,
        y: world_pos.y as u8,
        z: world_pos.z.rem_euclid(CHUNK_WIDTH_I32) as u8,
    };
    (coord, local)
}

pub fn chunk_to_world(coord: ChunkCoord, local: LocalPos) -> IVec3 {
    IVec3::new(
        coord.x + i32::from(local.x),
        i32::from(local.y),
        coord.z + i32::from(local.z),
    )
}

/// Linear index layout: x, then z, then y. Matches the order the
/// classifier fills columns in, so column scans stride by CHUNK_AREA.
pub fn local_to_index(local: LocalPos) -> usize {
    usize::from(local.x)
        + usize::from(local.z) * CHUNK_WIDTH
        + usize::from(local.y) * CHUNK_AREA
}

pub fn index_to_local(index: usize) -> LocalPos {
    assert!(index < CHUNK_VOLUME, "chunk index out of bounds: {index}");

    let y = index / CHUNK_AREA;
    let rem = index % CHUNK_AREA;
    let z = rem / CHUNK_WIDTH;
    let x = rem % CHUNK_WIDTH;

    LocalPos {
        x: x as u8,
        y: y as u8,
        z: z as u8,
    }
}

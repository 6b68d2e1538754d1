use noise::{NoiseFn, Perlin};

use crate::block::BlockId;
use crate::chunk::Chunk;
use crate::coords::{ChunkCoord, LocalPos, CHUNK_WIDTH};

/// Solid-stone elevation range; base height lands in [MIN, MAX).
pub const MIN_BASE_HEIGHT: i32 = 60;
pub const MAX_BASE_HEIGHT: i32 = 115;
/// Thickness of the biome topper stack; lands in [MIN, MAX).
pub const MIN_TOPPER: i32 = 2;
pub const MAX_TOPPER: i32 = 7;

const BASE_FREQUENCY: f64 = 0.01;
const BASE_OCTAVES: u32 = 5;
const TOPPER_FREQUENCY: f64 = 0.05;
const TOPPER_OCTAVES: u32 = 2;
const CLIMATE_FREQUENCY: f64 = 0.004;
const LACUNARITY: f64 = 2.0;
const GAIN: f64 = 0.5;

/// Per-column climate classification selecting the topper block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Biome {
    Grass,
    Sand,
}

impl Biome {
    pub fn topper_block(self) -> BlockId {
        match self {
            Biome::Grass => BlockId::GRASS,
            Biome::Sand => BlockId::SAND,
        }
    }
}

/// What one (x, z) column looks like before voxels exist: stone up to
/// `base_height`, then `topper_height` layers of the biome's topper.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ColumnProfile {
    pub base_height: i32,
    pub topper_height: i32,
    pub biome: Biome,
}

/// Pure seeded noise fields. Same seed + same (x, z) always produces
/// the same output, which is what lets chunks be regenerated instead
/// of persisted.
#[derive(Debug, Clone)]
pub struct TerrainFields {
    pub seed: u64,
    base: Perlin,
    topper: Perlin,
    temperature: Perlin,
    precipitation: Perlin,
}

impl TerrainFields {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            base: Perlin::new(seed as u32),
            topper: Perlin::new(seed.wrapping_add(3) as u32),
            temperature: Perlin::new(seed.wrapping_add(7) as u32),
            precipitation: Perlin::new(seed.wrapping_add(11) as u32),
        }
    }

    /// Low-frequency, high-octave fBm scaled into [MIN_BASE_HEIGHT,
    /// MAX_BASE_HEIGHT).
    pub fn base_height(&self, world_x: i32, world_z: i32) -> i32 {
        let n = fbm(&self.base, world_x, world_z, BASE_OCTAVES, BASE_FREQUENCY);
        scale_to_range(n, MIN_BASE_HEIGHT, MAX_BASE_HEIGHT)
    }

    /// Higher-frequency, low-octave fBm scaled into [MIN_TOPPER,
    /// MAX_TOPPER).
    pub fn topper_height(&self, world_x: i32, world_z: i32) -> i32 {
        let n = fbm(&self.topper, world_x, world_z, TOPPER_OCTAVES, TOPPER_FREQUENCY);
        scale_to_range(n, MIN_TOPPER, MAX_TOPPER)
    }

    /// Remapped from [-1, 1] to [0, 1].
    pub fn temperature(&self, world_x: i32, world_z: i32) -> f64 {
        let wx = world_x as f64;
        let wz = world_z as f64;
        remap_unit(self.temperature.get([wx * CLIMATE_FREQUENCY, wz * CLIMATE_FREQUENCY]))
    }

    /// Remapped from [-1, 1] to [0, 1].
    pub fn precipitation(&self, world_x: i32, world_z: i32) -> f64 {
        let wx = world_x as f64;
        let wz = world_z as f64;
        remap_unit(
            self.precipitation
                .get([wx * CLIMATE_FREQUENCY, wz * CLIMATE_FREQUENCY]),
        )
    }
}

fn fbm(perlin: &Perlin, world_x: i32, world_z: i32, octaves: u32, frequency: f64) -> f64 {
    let wx = world_x as f64;
    let wz = world_z as f64;

    let mut sum = 0.0;
    let mut amplitude = 1.0;
    let mut total_amplitude = 0.0;
    let mut freq = frequency;

    for _ in 0..octaves {
        sum += perlin.get([wx * freq, wz * freq]) * amplitude;
        total_amplitude += amplitude;
        amplitude *= GAIN;
        freq *= LACUNARITY;
    }

    (sum / total_amplitude).clamp(-1.0, 1.0)
}

/// Maps noise in [-1, 1] onto the integer range [min, max).
fn scale_to_range(n: f64, min: i32, max: i32) -> i32 {
    let scaled = min + ((n + 1.0) * 0.5 * f64::from(max - min)) as i32;
    scaled.min(max - 1)
}

fn remap_unit(n: f64) -> f64 {
    ((n + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Combines the terrain fields into a column's block stack.
#[derive(Debug, Clone)]
pub struct BlockClassifier {
    fields: TerrainFields,
}

impl BlockClassifier {
    pub fn new(seed: u64) -> Self {
        Self {
            fields: TerrainFields::new(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.fields.seed
    }

    pub fn fields(&self) -> &TerrainFields {
        &self.fields
    }

    /// Hot and dry columns turn to sand; everything else is grassland.
    pub fn biome(&self, world_x: i32, world_z: i32) -> Biome {
        let temperature = self.fields.temperature(world_x, world_z);
        let precipitation = self.fields.precipitation(world_x, world_z);
        if temperature > 0.8 && precipitation < 0.2 {
            Biome::Sand
        } else {
            Biome::Grass
        }
    }

    pub fn classify(&self, world_x: i32, world_z: i32) -> ColumnProfile {
        ColumnProfile {
            base_height: self.fields.base_height(world_x, world_z),
            topper_height: self.fields.topper_height(world_x, world_z),
            biome: self.biome(world_x, world_z),
        }
    }

    /// Builds the full voxel grid for one chunk: stone from y = 0 up
    /// to the base height, the biome topper above it, AIR the rest of
    /// the way up.
    pub fn generate_chunk(&self, coord: ChunkCoord) -> Chunk {
        let mut chunk = Chunk::new_empty();

        for z in 0..CHUNK_WIDTH {
            for x in 0..CHUNK_WIDTH {
                let world_x = coord.x + x as i32;
                let world_z = coord.z + z as i32;
                let profile = self.classify(world_x, world_z);
                chunk.set_biome(x, z, profile.biome);

                let topper = profile.biome.topper_block();
                for y in 0..profile.base_height {
                    chunk.set(local(x, y as usize, z), BlockId::STONE);
                }
                for layer in 0..profile.topper_height {
                    let y = (profile.base_height + layer) as usize;
                    chunk.set(local(x, y, z), topper);
                }
            }
        }

        chunk
    }
}

fn local(x: usize, y: usize, z: usize) -> LocalPos {
    LocalPos {
        x: x as u8,
        y: y as u8,
        z: z as u8,
    }
}

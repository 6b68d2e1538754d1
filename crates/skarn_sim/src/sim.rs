use std::error::Error;
use std::fs;
use std::io;
use std::path::Path;

use glam::IVec3;
use serde::{Deserialize, Serialize};
use skarn_core::pool::WorkerPool;
use skarn_world::block::{default_catalog, BlockId};
use skarn_world::coords::{CHUNK_HEIGHT_I32, CHUNK_WIDTH_I32};
use skarn_world::loader::ChunkLoader;
use skarn_world::store::ChunkStore;
use tracing::info;

const MIN_RADIUS: i32 = 1;
const MAX_RADIUS: i32 = 24;
const MIN_WALK_SPEED: i32 = 1;
const MAX_WALK_SPEED: i32 = CHUNK_WIDTH_I32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_radius")]
    pub radius: i32,
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    /// Blocks the simulated walker covers per tick, along +x.
    #[serde(default = "default_walk_speed")]
    pub walk_speed: i32,
    /// Worker thread count; absent means one per core.
    #[serde(default)]
    pub threads: Option<usize>,
}

fn default_seed() -> u64 {
    5271998
}

fn default_radius() -> i32 {
    4
}

fn default_ticks() -> u32 {
    64
}

fn default_walk_speed() -> i32 {
    4
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            radius: default_radius(),
            ticks: default_ticks(),
            walk_speed: default_walk_speed(),
            threads: None,
        }
    }
}

impl SimConfig {
    pub fn sanitize(mut self) -> Self {
        self.radius = self.radius.clamp(MIN_RADIUS, MAX_RADIUS);
        self.ticks = self.ticks.max(1);
        self.walk_speed = self.walk_speed.clamp(MIN_WALK_SPEED, MAX_WALK_SPEED);
        self
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let parsed = toml::from_str::<Self>(&contents).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to deserialize config: {e}"),
            )
        })?;
        Ok(parsed.sanitize())
    }
}

/// Drives the world the way a player walking east would: the loader
/// tracks the moving center every tick, and halfway through the run a
/// surface block is dug out to push an edit through the relight and
/// remesh path.
pub fn run(config: SimConfig) -> Result<(), Box<dyn Error>> {
    let catalog = default_catalog();
    let pool = WorkerPool::new(config.threads)?;
    let mut store = ChunkStore::new(config.seed);
    let loader = ChunkLoader::new(config.radius);

    info!(
        "simulating {} ticks at radius {} with seed {} on {} threads",
        config.ticks,
        config.radius,
        config.seed,
        pool.thread_count()
    );

    let mut center = IVec3::new(0, CHUNK_HEIGHT_I32 / 2, 0);
    let mut total_created = 0usize;
    let mut total_deleted = 0usize;
    let mut total_remeshed = 0usize;

    for tick in 0..config.ticks {
        let stats = loader.update(&mut store, &catalog, center, &pool)?;
        total_created += stats.created;
        total_deleted += stats.deleted;
        total_remeshed += stats.remeshed;

        if tick == config.ticks / 2 {
            dig_surface_block(&mut store, center)?;
        }

        center.x += config.walk_speed;
    }

    let quads: usize = store
        .coords()
        .collect::<Vec<_>>()
        .into_iter()
        .filter_map(|coord| store.chunk(coord))
        .map(|chunk| chunk.mesh.quad_count())
        .sum();

    info!(
        "done: {} chunks generated, {} unloaded, {} meshes rebuilt, {} resident holding {} quads",
        total_created,
        total_deleted,
        total_remeshed,
        store.resident_count(),
        quads
    );
    Ok(())
}

/// Removes the highest solid block in the column at the center. The
/// next update relights the opened column and rebuilds the mesh.
fn dig_surface_block(store: &mut ChunkStore, center: IVec3) -> Result<(), Box<dyn Error>> {
    for y in (0..CHUNK_HEIGHT_I32).rev() {
        let pos = IVec3::new(center.x, y, center.z);
        if store.block_at(pos)? != BlockId::AIR {
            store.set_block(pos, BlockId::AIR)?;
            info!("dug block at ({}, {}, {})", pos.x, pos.y, pos.z);
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SimConfig;

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let config = SimConfig {
            radius: 0,
            ticks: 0,
            walk_speed: 500,
            ..SimConfig::default()
        }
        .sanitize();

        assert_eq!(config.radius, 1);
        assert_eq!(config.ticks, 1);
        assert_eq!(config.walk_speed, super::MAX_WALK_SPEED);
    }

    #[test]
    fn config_parses_with_partial_fields() {
        let config: SimConfig = toml::from_str("seed = 9\nradius = 2\n").expect("valid toml");
        assert_eq!(config.seed, 9);
        assert_eq!(config.radius, 2);
        assert_eq!(config.ticks, 64);
        assert_eq!(config.threads, None);
    }
}

use glam::IVec3;
use skarn_core::channel;
use skarn_core::pool::WorkerPool;
use tracing::{debug, info};

use crate::block::{BlockCatalog, Direction};
use crate::coords::ChunkCoord;
use crate::store::{ChunkStore, WorldError};

/// Keeps the resident set of chunks tracking a moving center. Chunks
/// inside `load_radius` (Chebyshev, in chunks) are claimed and
/// generated; chunks at or beyond `unload_radius` are deleted. The gap
/// between the two radii is hysteresis so a center oscillating across
/// a chunk border does not thrash generation.
pub struct ChunkLoader {
    load_radius: i32,
    unload_radius: i32,
}

/// What one `update` call did, for the caller's logging.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub created: usize,
    pub deleted: usize,
    pub remeshed: usize,
}

impl ChunkLoader {
    pub fn new(load_radius: i32) -> Self {
        Self::with_radii(load_radius, load_radius + 2)
    }

    pub fn with_radii(load_radius: i32, unload_radius: i32) -> Self {
        assert!(load_radius >= 0, "load radius must be non-negative");
        assert!(
            unload_radius > load_radius,
            "unload radius {unload_radius} must exceed load radius {load_radius}"
        );
        Self {
            load_radius,
            unload_radius,
        }
    }

    pub fn load_radius(&self) -> i32 {
        self.load_radius
    }

    /// One load cycle: unload far chunks, generate missing near ones in
    /// parallel, commit serially, then relight and remesh whatever is
    /// dirty. Generation workers only read the classifier; every store
    /// mutation happens on the calling thread.
    pub fn update(
        &self,
        store: &mut ChunkStore,
        catalog: &BlockCatalog,
        center: IVec3,
        pool: &WorkerPool,
    ) -> Result<LoadStats, WorldError> {
        let center_chunk = ChunkCoord::containing(center);
        let mut stats = LoadStats::default();

        let far: Vec<ChunkCoord> = store
            .coords()
            .filter(|coord| center_chunk.chunk_distance(*coord) >= self.unload_radius)
            .collect();
        for coord in far {
            store.delete(coord)?;
            stats.deleted += 1;
        }

        let mut missing = Vec::new();
        for dz in -self.load_radius..=self.load_radius {
            for dx in -self.load_radius..=self.load_radius {
                let coord = center_chunk.offset(dx, dz);
                if !store.is_loaded(coord) {
                    missing.push(coord);
                }
            }
        }

        if !missing.is_empty() {
            debug!(
                "generating {} chunks around ({}, {})",
                missing.len(),
                center_chunk.x,
                center_chunk.z
            );

            let (tx, rx) = channel::channel();
            let classifier = store.classifier().clone();
            pool.run_batch(missing, move |coord| {
                let chunk = classifier.generate_chunk(coord);
                // The receiver outlives the batch; a send can only fail
                // if this update was abandoned entirely.
                let _ = tx.send((coord, chunk));
            });

            for (coord, chunk) in rx.drain() {
                store.commit(coord, chunk)?;
                stats.created += 1;

                // A new chunk changes the light its resident neighbors
                // sample across the seam, so their meshes go stale too.
                for direction in Direction::HORIZONTAL {
                    let offset = direction.offset();
                    if let Some(neighbor) = store.chunk_mut(coord.offset(offset.x, offset.z)) {
                        neighbor.dirty = true;
                    }
                }
            }
        }

        let dirty = store.dirty_coords();
        for coord in &dirty {
            store.relight(*coord, catalog)?;
        }
        for coord in dirty {
            store.rebuild_mesh(coord, catalog)?;
            stats.remeshed += 1;
        }

        if stats != LoadStats::default() {
            info!(
                "load cycle: +{} chunks, -{} chunks, {} meshes rebuilt, {} resident",
                stats.created,
                stats.deleted,
                stats.remeshed,
                store.resident_count()
            );
        }
        Ok(stats)
    }
}

use std::collections::VecDeque;

use crate::block::BlockCatalog;
use crate::chunk::Chunk;
use crate::coords::{LocalPos, CHUNK_HEIGHT, CHUNK_HEIGHT_I32, CHUNK_WIDTH, CHUNK_WIDTH_I32};

pub const MAX_LIGHT: u8 = 15;

const NEIGHBOR_OFFSETS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// Recomputes the chunk's sunlight nibble from scratch. Runs whenever
/// the chunk is dirtied; there is no incremental patching, a full
/// flood fill is rerun for correctness.
///
/// Seeding walks every column from the chunk ceiling down, marking the
/// contiguous run of transparent voxels at full brightness and
/// stopping at the first opaque one. The breadth-first spread then
/// carries light sideways and under overhangs, decaying by 1 per hop.
/// Termination: light strictly decreases per hop and is bounded by 0.
pub fn recompute_sky_light(chunk: &mut Chunk, catalog: &BlockCatalog) {
    chunk.clear_light();

    let mut queue = VecDeque::new();

    for z in 0..CHUNK_WIDTH {
        for x in 0..CHUNK_WIDTH {
            for y in (0..CHUNK_HEIGHT).rev() {
                let local = LocalPos {
                    x: x as u8,
                    y: y as u8,
                    z: z as u8,
                };
                if !catalog.is_transparent(chunk.get(local)) {
                    break;
                }
                chunk.set_sunlight(local, MAX_LIGHT);
                queue.push_back((x as i32, y as i32, z as i32));
            }
        }
    }

    while let Some((x, y, z)) = queue.pop_front() {
        let level = chunk.sunlight(local_of(x, y, z));
        if level <= 1 {
            continue;
        }
        let spread = level - 1;

        for (dx, dy, dz) in NEIGHBOR_OFFSETS {
            let nx = x + dx;
            let ny = y + dy;
            let nz = z + dz;
            if !in_chunk_bounds(nx, ny, nz) {
                continue;
            }

            let neighbor = local_of(nx, ny, nz);
            if !catalog.is_transparent(chunk.get(neighbor)) {
                continue;
            }
            if chunk.sunlight(neighbor) < spread {
                chunk.set_sunlight(neighbor, spread);
                queue.push_back((nx, ny, nz));
            }
        }
    }
}

pub fn in_chunk_bounds(x: i32, y: i32, z: i32) -> bool {
    (0..CHUNK_WIDTH_I32).contains(&x)
        && (0..CHUNK_HEIGHT_I32).contains(&y)
        && (0..CHUNK_WIDTH_I32).contains(&z)
}

fn local_of(x: i32, y: i32, z: i32) -> LocalPos {
    LocalPos {
        x: x as u8,
        y: y as u8,
        z: z as u8,
    }
}

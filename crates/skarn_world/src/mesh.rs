use bytemuck::{Pod, Zeroable};

use crate::block::{BlockCatalog, BlockId, Direction};
use crate::chunk::Chunk;
use crate::coords::{ChunkCoord, LocalPos, CHUNK_HEIGHT_I32, CHUNK_WIDTH_I32};
use crate::lighting::MAX_LIGHT;

/// Vertex record consumed by the renderer. The layout is a contract:
/// 3 floats world position, 2 floats texture coordinate, 1 float
/// texture-array layer, 1 byte packed light (bits 0-3 sunlight, bits
/// 4-7 torchlight).
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub layer: f32,
    pub light: u8,
}
const _: [(); 25] = [(); std::mem::size_of::<TerrainVertex>()];

/// Ordered vertex list for one chunk. Rebuilt wholesale on every mesh
/// pass, never patched incrementally.
#[derive(Clone, Debug, Default)]
pub struct MeshBuffer {
    pub vertices: Vec<TerrainVertex>,
}

impl MeshBuffer {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Each quad is two triangles, six vertices.
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 6
    }
}

/// Read-only view of the four horizontally adjacent chunks, resolved
/// by the store before a mesh pass.
#[derive(Copy, Clone, Debug, Default)]
pub struct ChunkNeighbors<'a> {
    pub north: Option<&'a Chunk>,
    pub south: Option<&'a Chunk>,
    pub west: Option<&'a Chunk>,
    pub east: Option<&'a Chunk>,
}

impl<'a> ChunkNeighbors<'a> {
    pub fn get(&self, direction: Direction) -> Option<&'a Chunk> {
        match direction {
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::West => self.west,
            Direction::East => self.east,
            Direction::Up | Direction::Down => None,
        }
    }
}

// x, y, z extents per sweep axis, and the face direction toward the
// positive/negative side of each axis.
const DIM_SIZES: [i32; 3] = [CHUNK_WIDTH_I32, CHUNK_HEIGHT_I32, CHUNK_WIDTH_I32];
const POS_FACE_DIRS: [Direction; 3] = [Direction::East, Direction::Up, Direction::North];
const NEG_FACE_DIRS: [Direction; 3] = [Direction::West, Direction::Down, Direction::South];

/// A visible face awaiting merge. Two cells merge into one rectangle
/// only when both texture and light match exactly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct MaskCell {
    texture: u16,
    light: u8,
}

/// Greedy meshing: for each of the three sweep axes, build a 2D mask
/// of visible faces per face plane (including the plane before the
/// first layer, which captures the chunk's outward boundary), then
/// merge same-texture same-light cells into maximal rectangles,
/// emitting one quad per rectangle instead of one per unit face.
pub fn build_mesh(
    chunk: &Chunk,
    coord: ChunkCoord,
    catalog: &BlockCatalog,
    neighbors: &ChunkNeighbors<'_>,
) -> MeshBuffer {
    let mut mesh = MeshBuffer {
        vertices: Vec::with_capacity(4_096),
    };

    for axis in 0..3 {
        let u_axis = (axis + 1) % 3;
        let v_axis = (axis + 2) % 3;
        let depth = DIM_SIZES[axis];
        let size_u = DIM_SIZES[u_axis];
        let size_v = DIM_SIZES[v_axis];

        let mut mask = vec![None::<MaskCell>; (size_u * size_v) as usize];

        // A depth of N voxels has N + 1 face planes.
        for slice in -1..depth {
            build_mask(
                chunk, catalog, neighbors, axis, u_axis, v_axis, slice, size_u, size_v, &mut mask,
            );
            merge_mask(
                &mut mesh, coord, axis, u_axis, v_axis, slice + 1, size_u, size_v, &mut mask,
            );
        }
    }

    mesh
}

#[allow(clippy::too_many_arguments)]
fn build_mask(
    chunk: &Chunk,
    catalog: &BlockCatalog,
    neighbors: &ChunkNeighbors<'_>,
    axis: usize,
    u_axis: usize,
    v_axis: usize,
    slice: i32,
    size_u: i32,
    size_v: i32,
    mask: &mut [Option<MaskCell>],
) {
    for v in 0..size_v {
        for u in 0..size_u {
            let mut behind = [0i32; 3];
            behind[axis] = slice;
            behind[u_axis] = u;
            behind[v_axis] = v;
            let mut ahead = behind;
            ahead[axis] = slice + 1;

            let behind_block = block_or_air(chunk, behind);
            let ahead_block = block_or_air(chunk, ahead);
            let behind_solid = !catalog.is_transparent(behind_block);
            let ahead_solid = !catalog.is_transparent(ahead_block);

            // A face is visible only when exactly one side is solid.
            let index = (u + v * size_u) as usize;
            if behind_solid == ahead_solid {
                mask[index] = None;
                continue;
            }

            let (block, face_dir, air_side) = if behind_solid {
                (behind_block, POS_FACE_DIRS[axis], ahead)
            } else {
                (ahead_block, NEG_FACE_DIRS[axis], behind)
            };

            mask[index] = Some(MaskCell {
                texture: catalog.side_texture(block, face_dir),
                light: sample_air_light(chunk, neighbors, air_side),
            });
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn merge_mask(
    mesh: &mut MeshBuffer,
    coord: ChunkCoord,
    axis: usize,
    u_axis: usize,
    v_axis: usize,
    plane: i32,
    size_u: i32,
    size_v: i32,
    mask: &mut [Option<MaskCell>],
) {
    for v in 0..size_v {
        let mut u = 0;
        while u < size_u {
            let index = (u + v * size_u) as usize;
            let Some(cell) = mask[index] else {
                u += 1;
                continue;
            };

            // Grow along u while cells match exactly.
            let mut width = 1;
            while u + width < size_u && mask[(u + width + v * size_u) as usize] == Some(cell) {
                width += 1;
            }

            // Grow along v only when the entire width-row matches.
            let mut height = 1;
            'grow: while v + height < size_v {
                for du in 0..width {
                    if mask[(u + du + (v + height) * size_u) as usize] != Some(cell) {
                        break 'grow;
                    }
                }
                height += 1;
            }

            emit_quad(
                mesh, coord, axis, u_axis, v_axis, plane, u, v, width, height, cell,
            );

            // Clear covered cells so nothing is emitted twice.
            for dv in 0..height {
                for du in 0..width {
                    mask[(u + du + (v + dv) * size_u) as usize] = None;
                }
            }

            u += width;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_quad(
    mesh: &mut MeshBuffer,
    coord: ChunkCoord,
    axis: usize,
    u_axis: usize,
    v_axis: usize,
    plane: i32,
    u: i32,
    v: i32,
    width: i32,
    height: i32,
    cell: MaskCell,
) {
    let mut start = [0i32; 3];
    start[axis] = plane;
    start[u_axis] = u;
    start[v_axis] = v;

    let origin = [coord.x as f32, 0.0, coord.z as f32];
    let corner = |du: i32, dv: i32| -> [f32; 3] {
        let mut p = start;
        p[u_axis] += du;
        p[v_axis] += dv;
        [
            origin[0] + p[0] as f32,
            origin[1] + p[1] as f32,
            origin[2] + p[2] as f32,
        ]
    };

    let w = width as f32;
    let h = height as f32;
    let layer = f32::from(cell.texture);
    let vertex = |position: [f32; 3], tex_coord: [f32; 2]| TerrainVertex {
        position,
        tex_coord,
        layer,
        light: cell.light,
    };

    let start_pos = corner(0, 0);
    let u_pos = corner(width, 0);
    let v_pos = corner(0, height);
    let end_pos = corner(width, height);

    // Two triangles; texture coordinates tile with the merged extent.
    mesh.vertices.push(vertex(start_pos, [0.0, 0.0]));
    mesh.vertices.push(vertex(u_pos, [w, 0.0]));
    mesh.vertices.push(vertex(v_pos, [0.0, h]));
    mesh.vertices.push(vertex(v_pos, [0.0, h]));
    mesh.vertices.push(vertex(end_pos, [w, h]));
    mesh.vertices.push(vertex(u_pos, [w, 0.0]));
}

/// Voxels outside the chunk count as AIR for face culling, so faces on
/// the chunk hull are always emitted.
fn block_or_air(chunk: &Chunk, p: [i32; 3]) -> BlockId {
    if !crate::lighting::in_chunk_bounds(p[0], p[1], p[2]) {
        return BlockId::AIR;
    }
    chunk.get(LocalPos {
        x: p[0] as u8,
        y: p[1] as u8,
        z: p[2] as u8,
    })
}

/// Packed light on the air side of a face. Samples cross into the
/// adjacent chunk through the neighbor link when one is resident;
/// an absent neighbor reads as full sky brightness so the edge of
/// loaded terrain never renders dark. Above and below the world the
/// same full-brightness rule applies.
fn sample_air_light(chunk: &Chunk, neighbors: &ChunkNeighbors<'_>, p: [i32; 3]) -> u8 {
    let [x, y, z] = p;
    if y < 0 || y >= CHUNK_HEIGHT_I32 {
        return MAX_LIGHT;
    }
    if crate::lighting::in_chunk_bounds(x, y, z) {
        return chunk.packed_light(LocalPos {
            x: x as u8,
            y: y as u8,
            z: z as u8,
        });
    }

    let direction = if x < 0 {
        Direction::West
    } else if x >= CHUNK_WIDTH_I32 {
        Direction::East
    } else if z < 0 {
        Direction::South
    } else {
        Direction::North
    };

    match neighbors.get(direction) {
        Some(neighbor) => neighbor.packed_light(LocalPos {
            x: x.rem_euclid(CHUNK_WIDTH_I32) as u8,
            y: y as u8,
            z: z.rem_euclid(CHUNK_WIDTH_I32) as u8,
        }),
        None => MAX_LIGHT,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_mesh, ChunkNeighbors, MeshBuffer};
    use crate::block::{default_catalog, BlockCatalog, BlockId, Direction};
    use crate::chunk::Chunk;
    use crate::coords::{ChunkCoord, LocalPos, CHUNK_HEIGHT_I32, CHUNK_WIDTH_I32};
    use crate::lighting::recompute_sky_light;
    use crate::worldgen::BlockClassifier;

    fn local(x: i32, y: i32, z: i32) -> LocalPos {
        LocalPos {
            x: x as u8,
            y: y as u8,
            z: z as u8,
        }
    }

    /// Counts exposed unit faces the naive way: every solid voxel
    /// contributes one face per transparent 6-neighbor, with voxels
    /// outside the chunk counting as air.
    fn naive_face_count(chunk: &Chunk, catalog: &BlockCatalog) -> usize {
        let mut count = 0;
        for z in 0..CHUNK_WIDTH_I32 {
            for y in 0..CHUNK_HEIGHT_I32 {
                for x in 0..CHUNK_WIDTH_I32 {
                    if catalog.is_transparent(chunk.get(local(x, y, z))) {
                        continue;
                    }
                    for direction in Direction::ALL {
                        let o = direction.offset();
                        let (nx, ny, nz) = (x + o.x, y + o.y, z + o.z);
                        let neighbor_transparent = if crate::lighting::in_chunk_bounds(nx, ny, nz)
                        {
                            catalog.is_transparent(chunk.get(local(nx, ny, nz)))
                        } else {
                            true
                        };
                        if neighbor_transparent {
                            count += 1;
                        }
                    }
                }
            }
        }
        count
    }

    /// Area of one emitted quad, recovered from its vertex extents.
    fn quad_area(mesh: &MeshBuffer, quad: usize) -> usize {
        // Copy out of the packed records before indexing.
        let positions: Vec<[f32; 3]> = mesh.vertices[quad * 6..quad * 6 + 6]
            .iter()
            .map(|v| v.position)
            .collect();
        let mut area = 1.0f32;
        for dim in 0..3 {
            let min = positions
                .iter()
                .map(|p| p[dim])
                .fold(f32::INFINITY, f32::min);
            let max = positions
                .iter()
                .map(|p| p[dim])
                .fold(f32::NEG_INFINITY, f32::max);
            if max > min {
                area *= max - min;
            }
        }
        area as usize
    }

    #[test]
    fn isolated_cube_meshes_to_six_quads() {
        let catalog = default_catalog();
        let mut chunk = Chunk::new_empty();
        for z in 7..9 {
            for y in 10..12 {
                for x in 7..9 {
                    chunk.set(local(x, y, z), BlockId::STONE);
                }
            }
        }
        recompute_sky_light(&mut chunk, &catalog);

        let mesh = build_mesh(
            &chunk,
            ChunkCoord::new(0, 0),
            &catalog,
            &ChunkNeighbors::default(),
        );

        // 2x2x2 cube: 24 unit faces, but each side merges into one
        // 2x2 rectangle.
        assert_eq!(mesh.quad_count(), 6);
        assert_eq!(mesh.vertices.len(), 36);
        for quad in 0..6 {
            assert_eq!(quad_area(&mesh, quad), 4);
        }
    }

    #[test]
    fn merged_quads_cover_exactly_the_exposed_faces() {
        let catalog = default_catalog();
        let classifier = BlockClassifier::new(5271998);
        let mut chunk = classifier.generate_chunk(ChunkCoord::new(0, 0));
        recompute_sky_light(&mut chunk, &catalog);

        let mesh = build_mesh(
            &chunk,
            ChunkCoord::new(0, 0),
            &catalog,
            &ChunkNeighbors::default(),
        );

        let merged_area: usize = (0..mesh.quad_count()).map(|q| quad_area(&mesh, q)).sum();
        assert_eq!(merged_area, naive_face_count(&chunk, &catalog));
        // Merging must actually reduce the quad count for terrain.
        assert!(mesh.quad_count() < naive_face_count(&chunk, &catalog));
    }

    #[test]
    fn flat_slab_top_merges_into_one_quad() {
        let catalog = default_catalog();
        let mut chunk = Chunk::new_empty();
        for z in 0..CHUNK_WIDTH_I32 {
            for x in 0..CHUNK_WIDTH_I32 {
                chunk.set(local(x, 0, z), BlockId::STONE);
            }
        }
        recompute_sky_light(&mut chunk, &catalog);

        let mesh = build_mesh(
            &chunk,
            ChunkCoord::new(0, 0),
            &catalog,
            &ChunkNeighbors::default(),
        );

        // One 16x16 top, one 16x16 bottom, four 16x1 sides.
        assert_eq!(mesh.quad_count(), 6);
        let areas: Vec<usize> = (0..6).map(|q| quad_area(&mesh, q)).collect();
        assert_eq!(areas.iter().filter(|&&a| a == 256).count(), 2);
        assert_eq!(areas.iter().filter(|&&a| a == 16).count(), 4);
    }

    #[test]
    fn quads_carry_world_space_positions() {
        let catalog = default_catalog();
        let mut chunk = Chunk::new_empty();
        chunk.set(local(0, 0, 0), BlockId::STONE);
        recompute_sky_light(&mut chunk, &catalog);

        let coord = ChunkCoord::new(-32, 48);
        let mesh = build_mesh(&chunk, coord, &catalog, &ChunkNeighbors::default());

        assert_eq!(mesh.quad_count(), 6);
        for vertex in &mesh.vertices {
            let [x, y, z] = vertex.position;
            assert!((-32.0..=-31.0).contains(&x));
            assert!((0.0..=1.0).contains(&y));
            assert!((48.0..=49.0).contains(&z));
        }
    }

    #[test]
    fn grass_top_and_side_textures_split_quads() {
        let catalog = default_catalog();
        let mut chunk = Chunk::new_empty();
        chunk.set(local(4, 4, 4), BlockId::GRASS);
        recompute_sky_light(&mut chunk, &catalog);

        let mesh = build_mesh(
            &chunk,
            ChunkCoord::new(0, 0),
            &catalog,
            &ChunkNeighbors::default(),
        );

        let layers: std::collections::BTreeSet<u32> =
            mesh.vertices.iter().map(|v| v.layer as u32).collect();
        // Side, top, and bottom textures all appear.
        assert_eq!(layers.len(), 3);
    }
}

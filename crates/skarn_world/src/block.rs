use bytemuck::{Pod, Zeroable};
use glam::IVec3;
use serde::{Deserialize, Serialize};

/// Identifier of a block type. Zero is AIR, the universal empty
/// sentinel, so default-initialized voxel arrays start empty.
#[repr(transparent)]
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Pod,
    Zeroable,
)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const AIR: Self = Self(0);
    pub const STONE: Self = Self(1);
    pub const DIRT: Self = Self(2);
    pub const GRASS: Self = Self(3);
    pub const SAND: Self = Self(4);
}

/// Texture-array layers referenced by the default catalog. Grass is the
/// only registered block whose faces differ.
pub const TEX_STONE: u16 = 1;
pub const TEX_DIRT: u16 = 2;
pub const TEX_GRASS_SIDE: u16 = 3;
pub const TEX_SAND: u16 = 4;
pub const TEX_GRASS_TOP: u16 = 60;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    West,
    East,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
        Direction::Up,
        Direction::Down,
    ];

    /// The four compass directions chunks neighbor each other in.
    pub const HORIZONTAL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::West => 2,
            Direction::East => 3,
            Direction::Up => 4,
            Direction::Down => 5,
        }
    }

    /// Unit offset toward the face this direction names. North is +z.
    pub fn offset(self) -> IVec3 {
        match self {
            Direction::North => IVec3::new(0, 0, 1),
            Direction::South => IVec3::new(0, 0, -1),
            Direction::West => IVec3::new(-1, 0, 0),
            Direction::East => IVec3::new(1, 0, 0),
            Direction::Up => IVec3::new(0, 1, 0),
            Direction::Down => IVec3::new(0, -1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// Per-type record shared by every chunk through the catalog; never
/// copied per voxel.
#[derive(Clone, Debug)]
pub struct BlockDescriptor {
    pub name: String,
    pub transparent: bool,
    /// Texture layer per face, indexed by `Direction::index`.
    pub face_textures: [u16; 6],
}

/// Immutable registry of block descriptors. Constructed once at world
/// startup and passed by shared reference to every consumer; there is
/// no process-wide singleton.
#[derive(Default, Debug, Clone)]
pub struct BlockCatalog {
    descriptors: Vec<Option<BlockDescriptor>>,
}

impl BlockCatalog {
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    pub fn register(&mut self, id: BlockId, descriptor: BlockDescriptor) {
        let index = usize::from(id.0);
        if index >= self.descriptors.len() {
            self.descriptors.resize(index + 1, None);
        }
        self.descriptors[index] = Some(descriptor);
    }

    fn get(&self, id: BlockId) -> Option<&BlockDescriptor> {
        self.descriptors.get(usize::from(id.0))?.as_ref()
    }

    /// Texture layer for one face of a block. Unregistered types fall
    /// back to their own base id on all six faces; this runs in the
    /// mesher's per-face loop and must never fail.
    pub fn side_texture(&self, id: BlockId, direction: Direction) -> u16 {
        match self.get(id) {
            Some(descriptor) => descriptor.face_textures[direction.index()],
            None => id.0,
        }
    }

    /// AIR is always transparent; unregistered types degrade to opaque.
    pub fn is_transparent(&self, id: BlockId) -> bool {
        if id == BlockId::AIR {
            return true;
        }
        match self.get(id) {
            Some(descriptor) => descriptor.transparent,
            None => false,
        }
    }

    pub fn display_name(&self, id: BlockId) -> &str {
        match self.get(id) {
            Some(descriptor) => &descriptor.name,
            None => "unknown",
        }
    }
}

pub fn default_catalog() -> BlockCatalog {
    fn uniform(name: &str, transparent: bool, texture: u16) -> BlockDescriptor {
        BlockDescriptor {
            name: name.to_string(),
            transparent,
            face_textures: [texture; 6],
        }
    }

    let mut catalog = BlockCatalog::new();

    catalog.register(BlockId::AIR, uniform("air", true, 0));
    catalog.register(BlockId::STONE, uniform("stone", false, TEX_STONE));
    catalog.register(BlockId::DIRT, uniform("dirt", false, TEX_DIRT));
    catalog.register(BlockId::SAND, uniform("sand", false, TEX_SAND));
    catalog.register(
        BlockId::GRASS,
        BlockDescriptor {
            name: "grass".to_string(),
            transparent: false,
            // N, S, W, E sides; dirt underneath.
            face_textures: [
                TEX_GRASS_SIDE,
                TEX_GRASS_SIDE,
                TEX_GRASS_SIDE,
                TEX_GRASS_SIDE,
                TEX_GRASS_TOP,
                TEX_DIRT,
            ],
        },
    );

    catalog
}

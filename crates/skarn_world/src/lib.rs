pub mod block;
pub mod chunk;
pub mod coords;
pub mod lighting;
pub mod loader;
pub mod mesh;
pub mod store;
pub mod worldgen;

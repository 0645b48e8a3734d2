//! # Voxel World
//!
//! The dungeon's static geometry: a dense grid of tiles, the mesh generated
//! from it and the code that fills it from a dungeon graph.
//!
//! ## Architecture
//!
//! * **Tile**: tile identities, their atlas frames and the six cell faces
//! * **Grid**: dense cell storage, solidity queries, meshing and per-vertex lighting slots
//! * **Level**: the dungeon-graph boundary and grid population
//!
//! ## Data Flow
//!
//! 1. A dungeon graph is copied into the grid on level load
//! 2. The grid generates its mesh once
//! 3. Lights are baked into the mesh's vertex colors
//! 4. The renderer reads the mesh; gameplay reads solidity

pub mod grid;
pub mod level;
pub mod tile;

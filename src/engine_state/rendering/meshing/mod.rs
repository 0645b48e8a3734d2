//! Mesh generation for the level geometry.
//!
//! The level is meshed in one pass on every level load; there is no
//! incremental remeshing. See [`crate::engine_state::voxels::grid::VoxelGrid::generate_geometry`].

pub mod mesh;

pub use mesh::{Face, Mesh};

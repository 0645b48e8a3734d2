//! Mesh generation for voxel rendering.
//!
//! # Architecture
//! - [`Mesh`]: vertex and index buffers of the whole level
//! - [`Face`]: a single visible quad of a voxel cell

mod face;
mod mesh;

pub use face::Face;
pub use mesh::*;

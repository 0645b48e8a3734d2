//! Vertex data structures for voxel rendering.
//!
//! This module defines the vertex format handed to the renderer for level
//! geometry. The renderer owns the buffer layout; the core only fills the data.

use cgmath::{Point3, Vector3};

/// A vertex of the level mesh.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
/// - Normal: 3x f32 (12 bytes)
/// - Light Color: 3x f32 (12 bytes)
///
/// Total size: 44 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in world space
    pub position: [f32; 3],
    /// Atlas texture coordinates
    pub tex_coords: [f32; 2],
    /// Outward face normal
    pub normal: [f32; 3],
    /// Accumulated light color, additive
    pub color: [f32; 3],
}

impl Vertex {
    /// Creates an unlit vertex.
    pub fn new(position: Point3<f32>, tex_coords: [f32; 2], normal: Vector3<f32>) -> Self {
        Vertex {
            position: position.into(),
            tex_coords,
            normal: normal.into(),
            color: [0.0; 3],
        }
    }

    /// Position as a point.
    pub fn point(&self) -> Point3<f32> {
        Point3::from(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_cast_to_bytes() {
        let vertices = [Vertex::new(
            Point3::new(1.0, 2.0, 3.0),
            [0.5, 0.5],
            Vector3::unit_y(),
        )];
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 44);
    }
}

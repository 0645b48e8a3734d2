//! Mesh data structures for the level geometry.
//!
//! A `Mesh` is a flat vertex list plus a triangle index list. Faces are pushed
//! four vertices at a time, so a face's vertex offset stays valid until the
//! mesh is cleared.

use super::face::Face;
use crate::engine_state::{rendering::Vertex, voxels::tile::tile_side::FACE_INDICES};

/// Vertices per quad face.
pub const VERTICES_PER_FACE: u32 = 4;

/// Vertex and index buffers of a built level.
#[derive(Debug, Default, Clone)]
pub struct Mesh {
    /// Vertex data, four per face
    pub vertices: Vec<Vertex>,
    /// Triangle list, six indices per face
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all geometry, invalidating every stored face offset.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Appends a face and returns the offset of its first vertex.
    pub fn push_face(&mut self, face: &Face) -> u32 {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&face.vertices());
        self.indices
            .extend(FACE_INDICES.iter().map(|index| index + offset));
        offset
    }

    /// Number of quads in the mesh.
    pub fn face_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_FACE as usize
    }

    /// Overwrites the light color of one vertex.
    pub fn set_color(&mut self, index: u32, color: [f32; 3]) {
        self.vertices[index as usize].color = color;
    }

    /// Adds to the light color of one vertex.
    pub fn add_color(&mut self, index: u32, color: [f32; 3]) {
        let current = &mut self.vertices[index as usize].color;
        for (channel, add) in current.iter_mut().zip(color) {
            *channel += add;
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::engine_state::voxels::tile::{tile_side::TileSide, AtlasFrame};

    #[test]
    fn faces_get_consecutive_offsets_and_shifted_indices() {
        let mut mesh = Mesh::new();
        let face = Face::new(Point3::new(0.0, 0.0, 0.0), 1.0, TileSide::TOP, AtlasFrame::new(0, 0));
        assert_eq!(mesh.push_face(&face), 0);
        assert_eq!(mesh.push_face(&face), 4);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(&mesh.indices[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn colors_accumulate() {
        let mut mesh = Mesh::new();
        let face = Face::new(Point3::new(0.0, 0.0, 0.0), 1.0, TileSide::TOP, AtlasFrame::new(0, 0));
        mesh.push_face(&face);
        mesh.set_color(2, [0.25, 0.25, 0.25]);
        mesh.add_color(2, [0.5, 0.0, 0.125]);
        assert_eq!(mesh.vertices[2].color, [0.75, 0.25, 0.375]);
    }
}

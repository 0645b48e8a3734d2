use cgmath::{Point3, Vector3};

use crate::engine_state::{
    rendering::Vertex,
    voxels::tile::{
        tile_side::{TileSide, FACE_UVS},
        AtlasFrame,
    },
};

/// A single visible quad of a voxel cell.
///
/// A face is defined by the world-space centre of its cell, the half extent of
/// the cell and the side it looks out of. The atlas frame picks the texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Centre of the owning cell in world space
    pub center: Point3<f32>,
    /// Half the edge length of the cell
    pub half_extent: f32,
    /// Which side of the cell this face represents
    pub side: TileSide,
    /// Atlas frame sampled by this face
    pub frame: AtlasFrame,
}

impl Face {
    /// Creates a face for the cell centred at `center`.
    pub fn new(center: Point3<f32>, half_extent: f32, side: TileSide, frame: AtlasFrame) -> Self {
        Face {
            center,
            half_extent,
            side,
            frame,
        }
    }

    /// World-space position of corner `slot` (0..4).
    pub fn corner(&self, slot: usize) -> Point3<f32> {
        self.center + Vector3::from(self.side.corners()[slot]) * self.half_extent
    }

    /// The four unlit vertices of the quad, counter-clockwise from outside.
    pub fn vertices(&self) -> [Vertex; 4] {
        let normal = self.side.normal();
        std::array::from_fn(|slot| {
            Vertex::new(self.corner(slot), self.frame.map_uv(FACE_UVS[slot]), normal)
        })
    }
}

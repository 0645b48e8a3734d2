//! # Tile Side Module
//!
//! This module defines the six faces of a voxel cell together with the static
//! geometry of a unit box face: corner offsets, normals, neighbour offsets and
//! texture coordinates.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel cell.
///
/// Each variant is assigned a fixed integer value used to index per-face
/// tables, including the grid's vertex-offset table.
///
/// The order is: [FRONT, BACK, TOP, BOTTOM, LEFT, RIGHT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum TileSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The top face (facing positive Y)
    TOP = 2,

    /// The bottom face (facing negative Y)
    BOTTOM = 3,

    /// The left face (facing negative X)
    LEFT = 4,

    /// The right face (facing positive X)
    RIGHT = 5,
}

/// Which of a tile definition's atlas frames a face samples.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum FaceGroup {
    /// Upward-facing faces
    Top,
    /// The four vertical faces
    Side,
    /// Downward-facing faces
    Bottom,
}

/// Corner offsets of each face of a cube spanning -1..+1, ordered
/// counter-clockwise when viewed from outside the cube.
#[rustfmt::skip]
const FACE_CORNERS: [[[f32; 3]; 4]; 6] = [
    [[-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0]], // front
    [[ 1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0]], // back
    [[-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0]], // top
    [[-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0]], // bottom
    [[-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0]], // left
    [[ 1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0]], // right
];

/// Texture coordinates of the four corners, shared by every face.
/// `v` grows downward in the atlas.
pub const FACE_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

/// Triangle list for one quad, relative to its first vertex.
pub const FACE_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

impl TileSide {
    /// Returns an array containing all six faces in table order.
    ///
    /// The order is: [FRONT, BACK, TOP, BOTTOM, LEFT, RIGHT]
    pub fn all() -> [TileSide; 6] {
        [
            TileSide::FRONT,
            TileSide::BACK,
            TileSide::TOP,
            TileSide::BOTTOM,
            TileSide::LEFT,
            TileSide::RIGHT,
        ]
    }

    /// Offset from a cell to the neighbour this face looks at.
    pub fn neighbor_offset(self) -> (i32, i32, i32) {
        match self {
            TileSide::FRONT => (0, 0, 1),
            TileSide::BACK => (0, 0, -1),
            TileSide::TOP => (0, 1, 0),
            TileSide::BOTTOM => (0, -1, 0),
            TileSide::LEFT => (-1, 0, 0),
            TileSide::RIGHT => (1, 0, 0),
        }
    }

    /// Outward unit normal of this face.
    pub fn normal(self) -> Vector3<f32> {
        let (x, y, z) = self.neighbor_offset();
        Vector3::new(x as f32, y as f32, z as f32)
    }

    /// Corner offsets of this face on a cube spanning -1..+1.
    pub fn corners(self) -> &'static [[f32; 3]; 4] {
        &FACE_CORNERS[self as usize]
    }

    /// Which atlas frame of a tile definition this face uses.
    pub fn face_group(self) -> FaceGroup {
        match self {
            TileSide::TOP => FaceGroup::Top,
            TileSide::BOTTOM => FaceGroup::Bottom,
            _ => FaceGroup::Side,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn corners_lie_on_the_face_plane() {
        for side in TileSide::all() {
            let normal = side.normal();
            for corner in side.corners() {
                let along = corner[0] * normal.x + corner[1] * normal.y + corner[2] * normal.z;
                assert_eq!(along, 1.0, "{:?} corner {:?} off plane", side, corner);
            }
        }
    }

    #[test]
    fn winding_is_counter_clockwise_from_outside() {
        for side in TileSide::all() {
            let c = side.corners();
            for tri in FACE_INDICES.chunks(3) {
                let a = Vector3::from(c[tri[0] as usize]);
                let b = Vector3::from(c[tri[1] as usize]);
                let d = Vector3::from(c[tri[2] as usize]);
                let n = (b - a).cross(d - a);
                assert!(n.dot(side.normal()) > 0.0, "{:?} winds inward", side);
            }
        }
    }
}

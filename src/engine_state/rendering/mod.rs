//! Rendering boundary of the dungeon core.
//!
//! The core never talks to a graphics API. It produces:
//! - the level mesh, as [`Vertex`] and index slices ready for upload
//! - per-vertex baked lighting inside that mesh
//! - a [`DrawList`] per frame: one [`DrawItem`] per drawable with a pose, a
//!   mesh handle and material parameters
//!
//! Textures and glyph meshes are referenced by name only; resolving those
//! names is the renderer's business.

use cgmath::{Matrix4, Point3, Rad, Vector3};

use super::camera_state::camera::CameraUniform;

pub mod lighting;
pub mod meshing;
mod vertex;

// Re-export commonly used types
pub use vertex::Vertex;

/// Texture key of the level atlas.
pub const ATLAS_TEXTURE: &str = "atlas";
/// Texture key of the mob billboard sheet.
pub const MOB_TEXTURE: &str = "mob";
/// Texture key of the door sprite.
pub const DOOR_TEXTURE: &str = "door";
/// Texture key of item sprites.
pub const ITEM_TEXTURE: &str = "item";
/// Texture key of the glyph font.
pub const FONT_TEXTURE: &str = "font";

/// Opaque reference to geometry owned by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshHandle {
    /// The level mesh returned by [`crate::engine_state::EngineState::level_mesh`]
    Level,
    /// A unit quad facing +z
    Billboard,
    /// A run of glyphs laid out by the renderer
    Glyphs(String),
    /// A single spark
    Particle,
}

/// How a mesh is shaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Texture key
    pub texture: &'static str,
    /// Sub-rectangle of the texture as `[u0, v0, u1, v1]`
    pub uv_rect: [f32; 4],
    /// RGBA tint
    pub tint: [f32; 4],
}

impl Material {
    /// The whole of `texture`, untinted.
    pub fn plain(texture: &'static str) -> Self {
        Material {
            texture,
            uv_rect: [0.0, 0.0, 1.0, 1.0],
            tint: [1.0; 4],
        }
    }

    /// Replaces the tint.
    pub fn tinted(mut self, tint: [f32; 4]) -> Self {
        self.tint = tint;
        self
    }

    /// Replaces the texture sub-rectangle.
    pub fn framed(mut self, uv_rect: [f32; 4]) -> Self {
        self.uv_rect = uv_rect;
        self
    }
}

/// One thing to draw this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    /// Model matrix
    pub pose: Matrix4<f32>,
    /// Geometry to draw
    pub mesh: MeshHandle,
    /// Shading parameters
    pub material: Material,
}

/// Everything the renderer needs for a frame apart from the level mesh.
#[derive(Debug, Clone)]
pub struct DrawList {
    /// Camera matrices
    pub camera: CameraUniform,
    /// Drawables in back-to-front-agnostic order
    pub items: Vec<DrawItem>,
}

/// Pose of a camera-facing quad of the given size centred on `position`.
pub fn billboard_pose(position: Point3<f32>, camera_yaw: Rad<f32>, width: f32, height: f32) -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(position.x, position.y, position.z))
        * Matrix4::from_angle_y(-camera_yaw)
        * Matrix4::from_nonuniform_scale(width, height, 1.0)
}

#[cfg(test)]
mod tests {
    use cgmath::{EuclideanSpace, Transform};

    use super::*;

    #[test]
    fn billboards_sit_at_their_position() {
        let pose = billboard_pose(Point3::new(4.0, 2.0, -6.0), Rad(1.2), 2.0, 3.0);
        let centre = pose.transform_point(Point3::origin());
        assert!((centre.x - 4.0).abs() < 1e-5);
        assert!((centre.y - 2.0).abs() < 1e-5);
        assert!((centre.z + 6.0).abs() < 1e-5);
    }
}

//! # Lighting
//!
//! Bakes point lights into the per-vertex colors of the level mesh.
//!
//! Lighting runs once per level load: every emitted vertex is reset to a low
//! ambient base, then each light adds an inverse-square contribution,
//! clamped per light, tinted to torchlight. Cost is
//! O(cells × lights × 24), which must never be paid per frame.

use cgmath::{MetricSpace, Point3, Vector3};
use web_time::Instant;

use crate::engine_state::voxels::grid::VoxelGrid;

/// Base color of every vertex before lights are added.
pub const AMBIENT: [f32; 3] = [0.1, 0.1, 0.1];

/// Color multiplier applied to every light's brightness.
pub const LIGHT_TINT: [f32; 3] = [226.0 / 255.0, 188.0 / 255.0, 134.0 / 255.0];

/// Upper bound of a single light's brightness at one vertex.
pub const MAX_BRIGHTNESS: f32 = 2.0;

/// A static light placed in the level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// World-space position
    pub position: Point3<f32>,
    /// Brightness at unit distance
    pub intensity: f32,
}

impl PointLight {
    /// Creates a light.
    pub fn new(position: Point3<f32>, intensity: f32) -> Self {
        PointLight {
            position,
            intensity,
        }
    }

    /// Tinted contribution of this light at a vertex.
    pub fn illuminate(&self, vertex: Point3<f32>, normal: Vector3<f32>) -> [f32; 3] {
        let brightness = point_light(self.position, self.intensity, vertex, normal);
        LIGHT_TINT.map(|channel| channel * brightness)
    }
}

/// Inverse-square brightness of a light at a vertex, clamped to
/// `[0, MAX_BRIGHTNESS]`.
///
/// The normal is accepted for the illumination-function signature but does not
/// attenuate the result.
pub fn point_light(
    light: Point3<f32>,
    intensity: f32,
    vertex: Point3<f32>,
    _normal: Vector3<f32>,
) -> f32 {
    let distance2 = light.distance2(vertex);
    if distance2 <= f32::EPSILON {
        return MAX_BRIGHTNESS;
    }
    (intensity / distance2).clamp(0.0, MAX_BRIGHTNESS)
}

/// Resets the grid's vertex colors to [`AMBIENT`] and adds every light.
///
/// Cells without emitted faces are skipped entirely.
pub fn bake_lights(grid: &mut VoxelGrid, lights: &[PointLight]) {
    let started = Instant::now();
    let (width, height, depth) = (grid.width(), grid.height(), grid.depth());

    for y in 0..height {
        for z in 0..depth {
            for x in 0..width {
                if !grid.has_faces(x, y, z) {
                    continue;
                }
                grid.light_box_set(x, y, z, |_, _| AMBIENT);
                for light in lights {
                    grid.light_box_add(x, y, z, |pos, normal| light.illuminate(pos, normal));
                }
            }
        }
    }

    log::info!(
        "Baked {} lights into {} faces in {:?}",
        lights.len(),
        grid.mesh().face_count(),
        started.elapsed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::tile::TileKey;

    #[test]
    fn brightness_falls_off_with_distance_squared() {
        let light = Point3::new(0.0, 0.0, 0.0);
        let up = Vector3::unit_y();
        assert_eq!(point_light(light, 4.0, Point3::new(0.0, 4.0, 0.0), up), 0.25);
        assert_eq!(point_light(light, 4.0, Point3::new(0.0, 1.0, 0.0), up), 2.0);
        assert_eq!(point_light(light, -4.0, Point3::new(0.0, 1.0, 0.0), up), 0.0);
    }

    #[test]
    fn baking_starts_from_ambient_and_adds_tinted_light() {
        let mut grid = VoxelGrid::new(1, 1, 1);
        grid.set(0, 0, 0, Some(TileKey::FLOOR));
        grid.generate_geometry();

        bake_lights(&mut grid, &[]);
        assert!(grid.mesh().vertices.iter().all(|v| v.color == AMBIENT));

        // far enough that each corner gets less than the clamp
        let light = PointLight::new(Point3::new(0.0, 11.0, 0.0), 10.0);
        bake_lights(&mut grid, &[light]);
        for vertex in &grid.mesh().vertices {
            let b = point_light(light.position, light.intensity, vertex.point(), Vector3::unit_y());
            assert!(b > 0.0 && b < MAX_BRIGHTNESS);
            for channel in 0..3 {
                let expected = AMBIENT[channel] + LIGHT_TINT[channel] * b;
                assert!((vertex.color[channel] - expected).abs() < 1e-6);
            }
        }
    }
}

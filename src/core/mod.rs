//! # Core Module
//!
//! Small building blocks shared by every system in the dungeon core:
//! dice notation and planar distance helpers.
//!
//! ## Usage
//! ```rust
//! use voxel_dungeon::core::{dice::Dice, horizontal_distance};
//! use cgmath::Point3;
//!
//! let dice: Dice = "2d3+1".parse().unwrap();
//! assert_eq!(dice.min(), 3);
//!
//! let d = horizontal_distance(Point3::new(0.0, 5.0, 0.0), Point3::new(3.0, 0.0, 4.0));
//! assert_eq!(d, 5.0);
//! ```

use cgmath::{InnerSpace, Point3, Vector3};

pub mod dice;

/// Distance between two points ignoring height.
pub fn horizontal_distance(a: Point3<f32>, b: Point3<f32>) -> f32 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    (dx * dx + dz * dz).sqrt()
}

/// Unit vector from `from` to `to` in the xz plane, or `None` when they coincide.
pub fn horizontal_direction(from: Point3<f32>, to: Point3<f32>) -> Option<Vector3<f32>> {
    let delta = Vector3::new(to.x - from.x, 0.0, to.z - from.z);
    if delta.magnitude2() < f32::EPSILON {
        return None;
    }
    Some(delta.normalize())
}

/// Facing vector for a yaw angle, matching the camera convention
/// (yaw 0 looks down -z, positive yaw turns toward +x).
pub fn facing(yaw: f32) -> Vector3<f32> {
    Vector3::new(yaw.sin(), 0.0, -yaw.cos())
}

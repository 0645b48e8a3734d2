//! # Camera State Management
//!
//! This module handles all camera-related functionality including:
//! - Following the body tagged with a `CameraController`
//! - View and projection matrix calculations
//! - Player input processing for turning and thrust
//! - Lunge and jolt feedback from combat
//!
//! ## Core Components
//! - `Camera`: eye position, orientation and shake spring
//! - `CameraSteering`: collects held keys and pointer delta for one tick
//! - `Projection`: the camera's projection matrix
//! - `CameraUniform`: packed matrices for the renderer

use cgmath::{Deg, Point3, Rad};

use super::{entities::components::Physics, PlayerAction};

pub mod camera;

/// Vertical field of view.
pub const FIELD_OF_VIEW: Deg<f32> = Deg(60.0);
/// Near clip plane distance.
pub const Z_NEAR: f32 = 0.01;
/// Far clip plane distance.
pub const Z_FAR: f32 = 1000.0;

/// The camera, its projection and its pending steering input.
#[derive(Debug)]
pub struct CameraState {
    /// Eye and orientation
    pub camera: camera::Camera,
    /// Perspective for the current viewport
    pub projection: camera::Projection,
    /// Steering input waiting for the next update
    pub steering: camera::CameraSteering,
}

impl CameraState {
    /// Creates a camera for a viewport of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        CameraState {
            camera: camera::Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0)),
            projection: camera::Projection::new(width, height, FIELD_OF_VIEW, Z_NEAR, Z_FAR),
            steering: camera::CameraSteering::default(),
        }
    }

    /// Hands one tick of player actions to the steering.
    pub fn intake_actions(&mut self, actions: &PlayerAction) {
        self.steering.intake_actions(actions);
    }

    /// Moves the eye to the followed body, advances shake and applies steering
    /// thrust to the body.
    pub fn update(&mut self, body: &mut Physics) {
        self.camera.follow(body.pos);
        body.vel += self.steering.apply_and_reset(&mut self.camera);
    }

    /// The packed matrices for this frame.
    pub fn uniform(&self) -> camera::CameraUniform {
        camera::CameraUniform::new(&self.camera, &self.projection)
    }
}

//! # Camera Implementation
//!
//! This module contains the core camera implementation including:
//! - Camera position, orientation and spring-damped shake
//! - Projection matrix handling
//! - Steering controller turning held keys into body thrust and turning
//! - Uniform data handed to the renderer
//!
//! ## Conventions
//! Yaw 0 looks down -z and positive yaw turns toward +x. Positive pitch looks
//! down.

use cgmath::*;
use std::f32::consts::FRAC_PI_2;

use crate::{core::facing, engine_state::PlayerAction};

/// Maps OpenGL-style clip depth in `[-1, 1]` to the `[0, 1]` range of modern
/// graphics APIs.
#[rustfmt::skip]
pub const CLIP_DEPTH_CORRECTION: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,  // Scale Z from [-1,1] to [-0.5,0.5]
    0.0, 0.0, 0.5, 1.0,  // Translate Z from [-0.5,0.5] to [0,1]
);

const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0001;

/// Spring constant pulling the shake offset back to rest.
pub const SHAKE_SPRING: f32 = 0.1;
/// Velocity kept by the shake offset per tick.
pub const SHAKE_DAMPING: f32 = 0.75;
/// Velocity added to the followed body per tick of held thrust.
pub const THRUST: f32 = 0.01;
/// Yaw change per tick of a held turn key, in radians.
pub const TURN_SPEED: f32 = 0.03;
/// Radians per pixel of pointer movement.
pub const LOOK_SENSITIVITY: f32 = 0.002;

/// A first-person camera following a body, with a spring-damped shake offset.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye position, body position plus shake
    pub position: Point3<f32>,
    /// Rotation about the y axis
    pub yaw: Rad<f32>,
    /// Rotation about the view's x axis
    pub pitch: Rad<f32>,
    /// Current shake displacement
    pub shake: Vector3<f32>,
    /// Current shake velocity
    pub shake_vel: Vector3<f32>,
}

impl Camera {
    /// Creates a camera at rest.
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
            shake: Vector3::zero(),
            shake_vel: Vector3::zero(),
        }
    }

    /// Horizontal unit vector the camera looks along.
    pub fn facing(&self) -> Vector3<f32> {
        facing(self.yaw.0)
    }

    /// Kicks the shake offset with a velocity impulse.
    ///
    /// The impulse replaces the current shake velocity.
    pub fn lunge(&mut self, direction: Vector3<f32>, strength: f32) {
        self.shake_vel = direction * strength;
    }

    /// Advances the shake spring one tick and moves the eye to `anchor` plus shake.
    pub fn follow(&mut self, anchor: Point3<f32>) {
        self.position = anchor + self.shake;

        self.shake_vel += -self.shake * SHAKE_SPRING;
        self.shake_vel *= SHAKE_DAMPING;
        self.shake += self.shake_vel;
    }

    /// Adds pitch, clamped short of straight up or down.
    pub fn add_pitch(&mut self, delta: f32) {
        self.pitch += Rad(delta);
        if self.pitch < -Rad(SAFE_FRAC_PI_2) {
            self.pitch = -Rad(SAFE_FRAC_PI_2);
        } else if self.pitch > Rad(SAFE_FRAC_PI_2) {
            self.pitch = Rad(SAFE_FRAC_PI_2);
        }
    }

    /// World-to-view transform.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_angle_x(self.pitch)
            * Matrix4::from_angle_y(self.yaw)
            * Matrix4::from_translation(-self.position.to_vec())
    }
}

/// Perspective projection for a viewport.
#[derive(Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    /// Creates a projection for a `width` by `height` viewport.
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        let aspect = width as f32 / height.max(1) as f32;
        let fovy: Rad<f32> = fovy.into();
        Self {
            aspect,
            fovy,
            znear,
            zfar,
        }
    }

    /// Follows a viewport size change.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// View-to-clip transform.
    pub fn calc_matrix(&self) -> Matrix4<f32> {
        CLIP_DEPTH_CORRECTION * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Collects one tick of steering input and applies it.
#[derive(Debug, Default)]
pub struct CameraSteering {
    amount_forward: f32,
    amount_backward: f32,
    amount_left: f32,
    amount_right: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
}

impl CameraSteering {
    /// Records the held keys and pointer motion of one tick.
    ///
    /// Pointer motion adds up until [`CameraSteering::apply_and_reset`] runs.
    pub fn intake_actions(&mut self, actions: &PlayerAction) {
        if actions.move_forward {
            self.amount_forward = THRUST;
        }
        if actions.move_backward {
            self.amount_backward = THRUST;
        }
        if actions.turn_left {
            self.amount_left = TURN_SPEED;
        }
        if actions.turn_right {
            self.amount_right = TURN_SPEED;
        }
        if let Some((delta_x, delta_y)) = actions.rotate_view {
            self.rotate_horizontal += delta_x as f32 * LOOK_SENSITIVITY;
            self.rotate_vertical += delta_y as f32 * LOOK_SENSITIVITY;
        }
    }

    /// Turns the camera and returns the velocity to add to the followed body.
    ///
    /// Resets the collected input.
    pub fn apply_and_reset(&mut self, camera: &mut Camera) -> Vector3<f32> {
        camera.yaw += Rad(self.amount_right - self.amount_left + self.rotate_horizontal);
        camera.add_pitch(self.rotate_vertical);
        let thrust = camera.facing() * (self.amount_forward - self.amount_backward);
        *self = CameraSteering::default();
        thrust
    }
}

/// Camera matrices in the layout the renderer uploads.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    // cgmath types are not Pod, so matrices are stored as plain arrays
    view_proj: [[f32; 4]; 4],
    position: [f32; 4],
}

impl CameraUniform {
    /// Packs the combined view-projection matrix and eye position.
    pub fn new(camera: &Camera, projection: &Projection) -> Self {
        let view_proj = projection.calc_matrix() * camera.calc_matrix();
        let pos3: [f32; 3] = camera.position.into();
        Self {
            view_proj: view_proj.into(),
            position: [pos3[0], pos3[1], pos3[2], 0.0],
        }
    }

    /// The packed view-projection matrix.
    pub fn view_proj(&self) -> Matrix4<f32> {
        Matrix4::from(self.view_proj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_direction_is_in_front_of_the_view() {
        for yaw in [0.0, 0.7, -2.0] {
            let camera = Camera::new(Point3::new(3.0, 2.0, -1.0), Rad(yaw), Rad(0.0));
            let ahead = camera.position + camera.facing() * 5.0;
            let view = camera.calc_matrix() * ahead.to_homogeneous();
            assert!(view.x.abs() < 1e-4 && view.y.abs() < 1e-4);
            assert!((view.z + 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn shake_settles_back_to_rest() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
        camera.lunge(camera.facing(), 0.5);
        camera.follow(Point3::new(0.0, 1.0, 0.0));
        assert_eq!(camera.position, Point3::new(0.0, 1.0, 0.0));
        assert!(camera.shake.magnitude() > 0.0);
        for _ in 0..200 {
            camera.follow(Point3::new(0.0, 1.0, 0.0));
        }
        assert!(camera.shake.magnitude() < 1e-3);
    }

    #[test]
    fn steering_turns_and_thrusts_once() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
        let mut steering = CameraSteering::default();
        steering.intake_actions(&PlayerAction {
            move_forward: true,
            turn_right: true,
            ..Default::default()
        });
        let thrust = steering.apply_and_reset(&mut camera);
        assert!((camera.yaw.0 - TURN_SPEED).abs() < 1e-6);
        assert!((thrust.magnitude() - THRUST).abs() < 1e-6);
        assert_eq!(steering.apply_and_reset(&mut camera), Vector3::zero());
    }

    #[test]
    fn projected_depth_spans_zero_to_one() {
        let projection = Projection::new(800, 600, Deg(60.0), 0.1, 100.0);
        let matrix = projection.calc_matrix();
        for (distance, depth) in [(0.1, 0.0), (100.0, 1.0)] {
            let clip = matrix * Vector4::new(0.0, 0.0, -distance, 1.0);
            assert!((clip.z / clip.w - depth).abs() < 1e-4);
        }
    }
}

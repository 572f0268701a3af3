//! Camera with a slow ambient sway.
//!
//! The camera rests slightly above the volume looking at its centre. Unless
//! reduced motion is on, it drifts a few hundredths of a unit around that rest
//! position and the model yaws gently back and forth.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Rest pose, projection and sway parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    pub rest_position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Horizontal / vertical sway amplitudes.
    pub sway_x: f32,
    pub sway_y: f32,
    /// Sway angular rates.
    pub sway_rate_x: f32,
    pub sway_rate_y: f32,
    /// Peak model yaw in radians and its rate.
    pub yaw_amplitude: f32,
    pub yaw_rate: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            rest_position: Vec3::new(0.0, 0.1, 3.2),
            target: Vec3::ZERO,
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            sway_x: 0.03,
            sway_y: 0.02,
            sway_rate_x: 0.05,
            sway_rate_y: 0.04,
            yaw_amplitude: 0.03,
            yaw_rate: 0.02,
        }
    }
}

/// Camera and model transform for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub view: Mat4,
    pub proj: Mat4,
    pub model: Mat4,
}

impl CameraPose {
    /// Distance of a model-space point along the camera's view axis.
    #[inline]
    pub fn view_depth(&self, model_point: Vec3) -> f32 {
        -(self.view * self.model).transform_point3(model_point).z
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }
}

/// Ambient-sway camera.
#[derive(Debug, Clone)]
pub struct DriftCamera {
    params: CameraParams,
    aspect: f32,
    position: Vec3,
    yaw: f32,
}

impl DriftCamera {
    pub fn new(params: CameraParams, width: u32, height: u32) -> Self {
        let position = params.rest_position;
        let mut camera = Self {
            params,
            aspect: 1.0,
            position,
            yaw: 0.0,
        };
        camera.set_viewport(width, height);
        camera
    }

    /// Update the aspect ratio. Zero-sized viewports are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Advance the sway to `elapsed`. With `reduced_motion` the camera snaps to
    /// its rest pose and stays there.
    pub fn update(&mut self, elapsed: f32, reduced_motion: bool) {
        let p = &self.params;
        if reduced_motion {
            self.position = p.rest_position;
            self.yaw = 0.0;
            return;
        }
        self.position = p.rest_position
            + Vec3::new(
                (elapsed * p.sway_rate_x).sin() * p.sway_x,
                (elapsed * p.sway_rate_y).cos() * p.sway_y,
                0.0,
            );
        self.yaw = (elapsed * p.yaw_rate).sin() * p.yaw_amplitude;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn pose(&self) -> CameraPose {
        let p = &self.params;
        CameraPose {
            position: self.position,
            view: Mat4::look_at_rh(self.position, p.target, Vec3::Y),
            proj: Mat4::perspective_rh(p.fov_degrees.to_radians(), self.aspect, p.near, p.far),
            model: Mat4::from_rotation_y(self.yaw),
        }
    }
}

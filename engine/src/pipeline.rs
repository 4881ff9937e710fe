//! Render Pipeline Hand-off
//!
//! The camera controller never talks to a renderer directly. Each update it
//! hands the resolved view matrices (and FOV, when it changes) to a
//! [`Pipeline`].

use glam::{Mat4, Vec3};

/// Receiver of the camera's output.
pub trait Pipeline {
    /// New world-to-camera and camera-to-world matrices.
    fn set_world_to_camera(&mut self, w2c: Mat4, c2w: Mat4);

    /// New field of view, degrees.
    fn set_fov(&mut self, fov_w: f32, fov_h: f32);
}

/// Last output of the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraOutput {
    pub pos: Vec3,
    /// Point of aim after panning
    pub poa: Vec3,
    pub up: Vec3,
    pub world_to_camera: Mat4,
    pub camera_to_world: Mat4,
}

impl Default for CameraOutput {
    fn default() -> Self {
        Self {
            pos: Vec3::ZERO,
            poa: Vec3::Y,
            up: Vec3::Z,
            world_to_camera: Mat4::IDENTITY,
            camera_to_world: Mat4::IDENTITY,
        }
    }
}

/// Pipeline that remembers what it was given.
#[derive(Debug, Clone, Default)]
pub struct RecordingPipeline {
    pub world_to_camera: Option<Mat4>,
    pub camera_to_world: Option<Mat4>,
    pub fov: Option<(f32, f32)>,
    /// Number of matrix hand-offs received
    pub frames: u32,
}

impl RecordingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera position implied by the last camera-to-world matrix.
    pub fn camera_position(&self) -> Option<Vec3> {
        self.camera_to_world.map(|m| m.w_axis.truncate())
    }
}

impl Pipeline for RecordingPipeline {
    fn set_world_to_camera(&mut self, w2c: Mat4, c2w: Mat4) {
        self.world_to_camera = Some(w2c);
        self.camera_to_world = Some(c2w);
        self.frames += 1;
    }

    fn set_fov(&mut self, fov_w: f32, fov_h: f32) {
        self.fov = Some((fov_w, fov_h));
    }
}

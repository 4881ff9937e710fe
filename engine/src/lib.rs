//! Plasma Camera Engine
//!
//! A stack-based virtual camera controller. Authored cameras pair a brain
//! (fixed, avatar-following, first person, circling, free-fly drive) with a
//! target object; the controller keeps them on a stack, blends between them
//! with a transition camera, applies panning and script overrides, and hands
//! the resulting view to a render [`Pipeline`].
//!
//! # Modules
//!
//! - [`camera`] - Brains, camera modifiers and the [`VirtualCamera`] controller
//! - [`command`] - Commands the controller consumes
//! - [`config`] - Controller tuning and authored scene descriptions
//! - [`input`] - Platform-agnostic key and mouse translation into commands
//! - [`scene`] - The object graph cameras look at
//! - [`pipeline`] - Output hand-off to a renderer
//!
//! # Example
//!
//! ```ignore
//! use plasma_cam_engine::{CameraConfig, RecordingPipeline, SceneGraph, VirtualCamera};
//! use plasma_cam_engine::command::CameraCommand;
//!
//! let mut scene = SceneGraph::new();
//! let avatar = scene.spawn("Avatar", glam::Mat4::IDENTITY);
//! scene.set_local_player(Some(avatar));
//!
//! let mut camera = VirtualCamera::new(scene, CameraConfig::default());
//! camera.set_render(true);
//! camera.queue(CameraCommand::CreateDefaultCamera { subject: avatar });
//!
//! let mut pipe = RecordingPipeline::new();
//! camera.update(1.0 / 60.0, &mut pipe);
//! ```

pub mod camera;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod input;
pub mod pipeline;
pub mod scene;

pub use camera::{CameraId, CameraModifier, VirtualCamera};
pub use command::{AvatarBehavior, CameraCommand};
pub use config::{CameraConfig, SceneDesc};
pub use error::{CameraError, ConfigError, Result};
pub use events::CameraEvent;
pub use input::{InputState, KeyCode};
pub use pipeline::{CameraOutput, Pipeline, RecordingPipeline};
pub use scene::{ObjectId, SceneGraph, SceneProvider};

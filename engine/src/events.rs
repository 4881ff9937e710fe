//! Outbound Camera Events
//!
//! Effects the camera system requests from the rest of the engine. The
//! controller collects them during command handling and update; the host
//! drains them once per frame with [`crate::VirtualCamera::drain_events`].

use serde::{Deserialize, Serialize};

use crate::scene::ObjectId;

/// Command for an animated camera target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimCommand {
    Start,
    Stop,
    Reset,
}

/// A side effect requested by the camera system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CameraEvent {
    /// Fade the avatar mesh out (camera too close) or back in.
    AvatarFade { subject: ObjectId, fade_out: bool },
    /// Show or hide the avatar's drawables outright.
    AvatarDrawable { subject: ObjectId, enabled: bool },
    /// The output field of view changed.
    FovChanged { fov_w: f32, fov_h: f32 },
    /// Avatar input should switch to third-person (`true`) or first-person steering.
    ThirdPersonInput(bool),
    /// Keep the mouse cursor pinned to the window centre while set.
    RecenterMouse(bool),
    /// Drive the animation on a camera's target object.
    Animation { target: ObjectId, command: AnimCommand },
}

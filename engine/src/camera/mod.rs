//! Camera Module
//!
//! Camera brains, the modifiers that host them, and the stack-based
//! [`VirtualCamera`] controller that picks which one the player looks through.
//! This module is window-system agnostic - it only deals with camera state and math.

pub mod brain;
pub mod circle;
pub mod drive;
pub mod flags;
pub mod modifier;
pub mod motion;
pub mod virtual_cam;

pub use brain::{BrainCommand, BrainKind, CameraBrain};
pub use circle::CircleState;
pub use flags::{BrainFlags, CameraFlags};
pub use modifier::{CamTrans, CameraId, CameraModifier, CameraState, FovInstruction};
pub use motion::SpeedLimits;
pub use virtual_cam::{DRIVE_CAMERA, PanState, TRANSITION_CAMERA, TransitionState, VirtualCamera};

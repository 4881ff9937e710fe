//! Camera Commands
//!
//! Everything that tells the camera controller to do something arrives as a
//! [`CameraCommand`]. Commands are queued and drained at the start of the
//! next update, in arrival order.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::camera::CameraId;
use crate::camera::brain::BrainCommand;
use crate::input::ControlCode;
use crate::scene::ObjectId;

/// Avatar behaviour notifications the camera reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvatarBehavior {
    /// The local avatar finished linking into an age
    LinkIn,
    /// The local avatar is linking out
    LinkOut,
    /// Fall started (`true`) or ended
    Fall(bool),
    /// Run started (`true`) or ended
    Run(bool),
}

/// A request to the camera controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CameraCommand {
    /// A control was pressed or released
    Control { code: ControlCode, activated: bool },
    /// Mouse motion, normalized to the window size
    MouseDelta { dx: f32, dy: f32 },
    /// Mouse wheel, in wheel units (120 per notch)
    MouseWheel(f32),
    /// Camera region entered or exited
    Region {
        camera: CameraId,
        entering: bool,
        /// Replace the whole stack when entering
        as_default: bool,
        /// Cut the transition this change causes
        cut: bool,
        triggerer: Option<ObjectId>,
    },
    /// Script takes over the camera
    PythonOverridePush {
        camera: CameraId,
        /// Cut instead of blending to the script camera
        cut: bool,
        triggerer: Option<ObjectId>,
    },
    /// Script releases the camera
    PythonOverridePop { triggerer: Option<ObjectId> },
    /// Script enables (`true`) or disables first person
    PythonFirstPersonEnable(bool),
    /// Script forces the player out of first person
    PythonUndoFirstPerson,
    /// Responder forces third person
    ResponderSetThirdPerson,
    /// Responder releases forced third person
    ResponderUndoThirdPerson,
    Behavior(AvatarBehavior),
    /// The avatar warped; cut the next transition
    Warp,
    /// Recenter the pan
    ResetPanning,
    /// Reset cameras on age entry
    ResetOnEnter,
    /// Reset cameras on age exit, cutting the next transition
    ResetOnExit,
    /// Build (or retarget) the built-in cameras for this avatar
    CreateDefaultCamera { subject: ObjectId },
    /// Output resolution changed
    RefreshFov { width: u32, height: u32 },
    /// Cut the current camera and the next transition
    SetCutNext,
    ToggleDrive,
    /// A camera is being destroyed
    CameraDestroyed(CameraId),
    /// Command for one camera's brain
    Brain {
        camera: CameraId,
        command: BrainCommand,
    },
}

/// FIFO of pending camera commands.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    pending: VecDeque<CameraCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: CameraCommand) {
        self.pending.push_back(cmd);
    }

    pub fn pop(&mut self) -> Option<CameraCommand> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl Extend<CameraCommand> for CommandQueue {
    fn extend<I: IntoIterator<Item = CameraCommand>>(&mut self, iter: I) {
        self.pending.extend(iter);
    }
}

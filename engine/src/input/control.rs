//! Camera Control Codes
//!
//! Logical controls the camera system reacts to, plus a compact bitset used
//! to track which of them are currently held.

use serde::{Deserialize, Serialize};

/// Logical control consumed by the camera system.
///
/// Avatar movement controls are included because the controller uses them to
/// decide when to recenter a panned view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlCode {
    // Avatar movement
    MoveForward,
    MoveBackward,
    RotateLeft,
    RotateRight,

    // Looking around
    FreeLook,
    WalkPan,
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
    Recenter,

    // Mode switches
    ToggleDriveMode,
    FirstPersonToggle,

    // Telescope zoom
    ZoomIn,
    ZoomOut,

    // Drive (free-fly) camera
    CamMoveForward,
    CamMoveBackward,
    CamMoveLeft,
    CamMoveRight,
    CamMoveUp,
    CamMoveDown,
    CamRotateLeft,
    CamRotateRight,
    CamRotateUp,
    CamRotateDown,
    DriveSpeedUp,
    DriveSpeedDown,
    ModifierFast,
}

impl ControlCode {
    #[inline]
    fn bit(self) -> u64 {
        1u64 << (self as u64)
    }

    /// Controls that steer the avatar and therefore recenter a panned view.
    pub fn is_avatar_steering(self) -> bool {
        matches!(
            self,
            ControlCode::MoveForward
                | ControlCode::MoveBackward
                | ControlCode::RotateLeft
                | ControlCode::RotateRight
        )
    }
}

/// Set of currently held controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlFlags(u64);

impl ControlFlags {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, code: ControlCode) -> bool {
        self.0 & code.bit() != 0
    }

    #[inline]
    pub fn set(&mut self, code: ControlCode, held: bool) {
        if held {
            self.0 |= code.bit();
        } else {
            self.0 &= !code.bit();
        }
    }

    #[inline]
    pub fn insert(&mut self, code: ControlCode) {
        self.set(code, true);
    }

    #[inline]
    pub fn remove(&mut self, code: ControlCode) {
        self.set(code, false);
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }
}

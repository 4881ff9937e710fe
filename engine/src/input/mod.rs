//! Input Module
//!
//! Platform-agnostic input translation for the camera system. The host feeds
//! key and mouse events in; camera commands come out. Nothing here depends on
//! a windowing system.
//!
//! # Example
//!
//! ```rust,ignore
//! use plasma_cam_engine::input::{InputState, KeyCode};
//!
//! let mut input = InputState::new(800.0, 600.0);
//! input.handle_key(KeyCode::F1, true);
//! input.mouse.accumulate_delta(12.0, 0.0);
//!
//! for cmd in input.drain_commands() {
//!     camera.queue(cmd);
//! }
//! ```

pub mod bindings;
pub mod control;
pub mod keyboard;
pub mod mouse_state;

use std::collections::HashSet;

pub use bindings::KeyBindings;
pub use control::{ControlCode, ControlFlags};
pub use keyboard::KeyCode;
pub use mouse_state::MouseAccumulator;

use crate::command::CameraCommand;

/// Combined keyboard and mouse state feeding the camera.
#[derive(Debug, Clone)]
pub struct InputState {
    pub bindings: KeyBindings,
    pub mouse: MouseAccumulator,
    pressed: HashSet<KeyCode>,
    pending: Vec<CameraCommand>,
}

impl InputState {
    /// Create input state with default bindings for a window of the given size.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            bindings: KeyBindings::new(),
            mouse: MouseAccumulator::new(width, height),
            pressed: HashSet::new(),
            pending: Vec::new(),
        }
    }

    /// Handle a key press or release.
    ///
    /// Key repeat (a press for an already held key) is filtered out.
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        let changed = if pressed {
            self.pressed.insert(key)
        } else {
            self.pressed.remove(&key)
        };
        if !changed {
            return;
        }
        if let Some(cmd) = self.bindings.command_for(key, pressed) {
            self.pending.push(cmd);
        }
    }

    /// Whether a control is currently held.
    pub fn is_held(&self, control: ControlCode) -> bool {
        self.bindings.is_control_held(control, &self.pressed)
    }

    /// Take all commands produced since the last call, keys first.
    pub fn drain_commands(&mut self) -> Vec<CameraCommand> {
        let mut commands = std::mem::take(&mut self.pending);
        commands.extend(self.mouse.drain_commands());
        commands
    }

    /// Release every held key, e.g. on focus loss.
    pub fn reset(&mut self) {
        let held: Vec<KeyCode> = self.pressed.iter().copied().collect();
        for key in held {
            self.handle_key(key, false);
        }
        self.mouse.set_captured(false);
    }
}

//! Input Bindings Module
//!
//! Maps physical keys to camera control codes so the host can remap keys
//! without touching camera logic.

use std::collections::{HashMap, HashSet};

use super::{ControlCode, KeyCode};
use crate::command::CameraCommand;

/// Maps physical keys to logical camera controls.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    /// Map from physical key to control
    key_to_control: HashMap<KeyCode, ControlCode>,
    /// Map from control to physical key (for reverse lookup and display)
    control_to_key: HashMap<ControlCode, KeyCode>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyBindings {
    /// Create a bindings table with the default layout.
    ///
    /// Default bindings:
    /// - W / S = avatar forward / backward
    /// - A / D = avatar rotate left / right
    /// - ControlLeft = free look
    /// - ShiftLeft = fast modifier (drive camera)
    /// - PageUp / PageDown / Delete / End = pan up / down / left / right
    /// - Home = recenter
    /// - F1 = first-person toggle, F5 = drive mode toggle
    /// - Z / X = zoom in / out
    /// - Numpad 8 / 2 / 4 / 6 = drive camera forward / back / left / right
    /// - Q / E = drive camera up / down
    /// - Numpad + / - = drive speed up / down
    pub fn new() -> Self {
        let mut bindings = Self {
            key_to_control: HashMap::new(),
            control_to_key: HashMap::new(),
        };

        bindings.bind(KeyCode::W, ControlCode::MoveForward);
        bindings.bind(KeyCode::S, ControlCode::MoveBackward);
        bindings.bind(KeyCode::A, ControlCode::RotateLeft);
        bindings.bind(KeyCode::D, ControlCode::RotateRight);
        bindings.bind(KeyCode::ControlLeft, ControlCode::FreeLook);
        bindings.bind(KeyCode::ShiftLeft, ControlCode::ModifierFast);
        bindings.bind(KeyCode::PageUp, ControlCode::PanUp);
        bindings.bind(KeyCode::PageDown, ControlCode::PanDown);
        bindings.bind(KeyCode::Delete, ControlCode::PanLeft);
        bindings.bind(KeyCode::End, ControlCode::PanRight);
        bindings.bind(KeyCode::Home, ControlCode::Recenter);
        bindings.bind(KeyCode::F1, ControlCode::FirstPersonToggle);
        bindings.bind(KeyCode::F5, ControlCode::ToggleDriveMode);
        bindings.bind(KeyCode::Z, ControlCode::ZoomIn);
        bindings.bind(KeyCode::X, ControlCode::ZoomOut);
        bindings.bind(KeyCode::Numpad8, ControlCode::CamMoveForward);
        bindings.bind(KeyCode::Numpad2, ControlCode::CamMoveBackward);
        bindings.bind(KeyCode::Numpad4, ControlCode::CamMoveLeft);
        bindings.bind(KeyCode::Numpad6, ControlCode::CamMoveRight);
        bindings.bind(KeyCode::Q, ControlCode::CamMoveUp);
        bindings.bind(KeyCode::E, ControlCode::CamMoveDown);
        bindings.bind(KeyCode::NumpadAdd, ControlCode::DriveSpeedUp);
        bindings.bind(KeyCode::NumpadSubtract, ControlCode::DriveSpeedDown);

        bindings
    }

    /// Bind a physical key to a control.
    ///
    /// Any previous binding of either the key or the control is removed.
    pub fn bind(&mut self, key: KeyCode, control: ControlCode) {
        if let Some(old_control) = self.key_to_control.remove(&key) {
            self.control_to_key.remove(&old_control);
        }
        if let Some(old_key) = self.control_to_key.remove(&control) {
            self.key_to_control.remove(&old_key);
        }

        self.key_to_control.insert(key, control);
        self.control_to_key.insert(control, key);
    }

    /// Remove the binding for a specific key.
    pub fn unbind_key(&mut self, key: KeyCode) {
        if let Some(control) = self.key_to_control.remove(&key) {
            self.control_to_key.remove(&control);
        }
    }

    /// Get the control bound to a physical key, if any.
    pub fn get_control(&self, key: KeyCode) -> Option<ControlCode> {
        self.key_to_control.get(&key).copied()
    }

    /// Get the key bound to a control, if any.
    pub fn get_key(&self, control: ControlCode) -> Option<KeyCode> {
        self.control_to_key.get(&control).copied()
    }

    /// Check whether a control is held, given the set of pressed keys.
    pub fn is_control_held(&self, control: ControlCode, pressed_keys: &HashSet<KeyCode>) -> bool {
        self.control_to_key
            .get(&control)
            .is_some_and(|key| pressed_keys.contains(key))
    }

    /// Translate a key event into a camera command.
    ///
    /// Unbound keys produce nothing.
    pub fn command_for(&self, key: KeyCode, pressed: bool) -> Option<CameraCommand> {
        self.get_control(key).map(|code| CameraCommand::Control {
            code,
            activated: pressed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::new();

        assert_eq!(bindings.get_control(KeyCode::W), Some(ControlCode::MoveForward));
        assert_eq!(bindings.get_control(KeyCode::F1), Some(ControlCode::FirstPersonToggle));
        assert_eq!(bindings.get_control(KeyCode::F5), Some(ControlCode::ToggleDriveMode));
        assert_eq!(bindings.get_control(KeyCode::Home), Some(ControlCode::Recenter));
        assert_eq!(bindings.get_control(KeyCode::Unknown), None);
    }

    #[test]
    fn test_rebind_key() {
        let mut bindings = KeyBindings::new();

        bindings.bind(KeyCode::ArrowUp, ControlCode::MoveForward);

        assert_eq!(bindings.get_control(KeyCode::W), None);
        assert_eq!(bindings.get_control(KeyCode::ArrowUp), Some(ControlCode::MoveForward));
        assert_eq!(bindings.get_key(ControlCode::MoveForward), Some(KeyCode::ArrowUp));
    }

    #[test]
    fn test_is_control_held() {
        let bindings = KeyBindings::new();

        let mut pressed = HashSet::new();
        pressed.insert(KeyCode::ControlLeft);

        assert!(bindings.is_control_held(ControlCode::FreeLook, &pressed));
        assert!(!bindings.is_control_held(ControlCode::MoveForward, &pressed));
    }

    #[test]
    fn test_command_for_key() {
        let mut bindings = KeyBindings::new();

        assert_eq!(
            bindings.command_for(KeyCode::F1, true),
            Some(CameraCommand::Control {
                code: ControlCode::FirstPersonToggle,
                activated: true,
            })
        );

        bindings.unbind_key(KeyCode::F1);
        assert_eq!(bindings.command_for(KeyCode::F1, true), None);
    }
}

//! Keyboard Key Codes
//!
//! Generic key codes, independent of any windowing system. The host
//! translates its native key events into these before handing them to
//! [`super::KeyBindings`].

use serde::{Deserialize, Serialize};

/// Generic key codes for camera input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    // Movement keys
    W,
    A,
    S,
    D,
    Q,
    E,
    Space,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,

    // Arrow keys
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    // Navigation cluster (camera pan)
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,

    // Numpad (drive camera)
    Numpad2,
    Numpad4,
    Numpad6,
    Numpad8,
    NumpadAdd,
    NumpadSubtract,

    // Letter keys
    C,
    F,
    L,
    R,
    Z,
    X,

    /// Catch-all for unhandled keys
    Unknown,
}

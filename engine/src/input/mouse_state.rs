//! Mouse Delta Accumulator
//!
//! Collects raw mouse motion and wheel clicks between frames and turns them
//! into camera commands. The camera works in window-normalized deltas, so a
//! full sweep across the window is 1.0 regardless of resolution.

use crate::command::CameraCommand;

/// Mouse state with delta accumulation.
///
/// - **Delta accumulation**: Raw pixel deltas accumulate until consumed
/// - **Cursor capture tracking**: Knows whether the cursor is currently captured
/// - **Normalization**: `drain_commands()` divides by the window size
///
/// # Example
///
/// ```rust,ignore
/// use plasma_cam_engine::input::MouseAccumulator;
///
/// let mut mouse = MouseAccumulator::new(800.0, 600.0);
/// mouse.accumulate_delta(40.0, -30.0);
///
/// for cmd in mouse.drain_commands() {
///     camera.queue(cmd);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MouseAccumulator {
    /// Accumulated horizontal delta in pixels since last drain.
    delta_x: f32,
    /// Accumulated vertical delta in pixels since last drain.
    delta_y: f32,
    /// Accumulated wheel motion since last drain (120 per notch).
    wheel: f32,
    /// Window width used for normalization.
    width: f32,
    /// Window height used for normalization.
    height: f32,
    /// Whether the cursor is currently captured (hidden and confined).
    cursor_captured: bool,
    /// Set when the camera asks for the cursor to be warped back to centre.
    recenter_requested: bool,
}

impl Default for MouseAccumulator {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl MouseAccumulator {
    /// Create an accumulator for a window of the given size.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            delta_x: 0.0,
            delta_y: 0.0,
            wheel: 0.0,
            width: width.max(1.0),
            height: height.max(1.0),
            cursor_captured: false,
            recenter_requested: false,
        }
    }

    /// Accumulate raw mouse motion in pixels.
    #[inline]
    pub fn accumulate_delta(&mut self, dx: f32, dy: f32) {
        self.delta_x += dx;
        self.delta_y += dy;
    }

    /// Accumulate wheel motion.
    #[inline]
    pub fn accumulate_wheel(&mut self, amount: f32) {
        self.wheel += amount;
    }

    /// Update the window size after a resize.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
    }

    /// Consume the accumulated motion as normalized deltas.
    #[inline]
    pub fn consume_delta(&mut self) -> (f32, f32) {
        let delta = (self.delta_x / self.width, self.delta_y / self.height);
        self.delta_x = 0.0;
        self.delta_y = 0.0;
        delta
    }

    /// Consume everything accumulated since the last call as camera commands.
    ///
    /// Zero motion produces no commands.
    pub fn drain_commands(&mut self) -> Vec<CameraCommand> {
        let mut commands = Vec::new();

        let (dx, dy) = self.consume_delta();
        if dx != 0.0 || dy != 0.0 {
            commands.push(CameraCommand::MouseDelta { dx, dy });
        }
        if self.wheel != 0.0 {
            commands.push(CameraCommand::MouseWheel(self.wheel));
            self.wheel = 0.0;
        }

        commands
    }

    /// Set whether the cursor is captured.
    #[inline]
    pub fn set_captured(&mut self, captured: bool) {
        self.cursor_captured = captured;
        // Clear accumulated deltas when capture state changes to prevent jumps
        if !captured {
            self.delta_x = 0.0;
            self.delta_y = 0.0;
        }
    }

    #[inline]
    pub fn is_captured(&self) -> bool {
        self.cursor_captured
    }

    /// Record a recenter request from the camera (see `CameraEvent::RecenterMouse`).
    pub fn request_recenter(&mut self, recenter: bool) {
        self.recenter_requested = recenter;
    }

    /// Take a pending recenter request, clearing it.
    pub fn take_recenter(&mut self) -> bool {
        std::mem::take(&mut self.recenter_requested)
    }

    /// Peek at the raw pixel delta without consuming it.
    #[inline]
    pub fn peek_delta(&self) -> (f32, f32) {
        (self.delta_x, self.delta_y)
    }
}

//! Drive Brain
//!
//! Free-fly debug camera. Movement controls translate along the camera's own
//! axes, mouse motion yaws about the up axis and pitches about the right axis.
//! The pose is written directly; there is no goal seeking.

use glam::{Quat, Vec3};

use super::brain::{BrainContext, BrainCore};
use super::modifier::CameraState;
use crate::config::CameraConfig;
use crate::input::ControlCode;

/// Longest step the drive camera integrates in one update.
const MAX_STEP: f32 = 0.01;

/// Mouse deltas beyond this (window-normalized) are treated as a warp.
const MOUSE_JUMP: f32 = 0.4;

/// How fast the speed controls change accel, decel and top speed.
const SPEED_CHANGE_RATE: f32 = 5.0;

/// Distance from the camera to its point of aim.
const POA_DISTANCE: f32 = 2.0;

/// Tuning and mouse state of the drive camera.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveState {
    pub accel: f32,
    pub decel: f32,
    pub max_velocity: f32,
    /// Radians per second per unit of normalized mouse motion
    pub turn_rate: f32,
    up: Vec3,
    delta_x: f32,
    delta_y: f32,
    disregard_x: bool,
    disregard_y: bool,
}

impl DriveState {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            accel: config.drive.accel,
            decel: config.drive.decel,
            max_velocity: config.drive.max_velocity,
            turn_rate: config.drive.turn_rate,
            up: Vec3::Z,
            delta_x: 0.0,
            delta_y: 0.0,
            disregard_x: false,
            disregard_y: false,
        }
    }

    pub(super) fn on_push(&mut self) {
        self.delta_x = 0.0;
        self.delta_y = 0.0;
        self.disregard_x = false;
        self.disregard_y = false;
    }

    /// Turn mouse motion into rotate flags.
    ///
    /// A large jump on one axis makes the next nonzero delta on the other
    /// axis be ignored; the jump itself is ignored too.
    pub(super) fn handle_mouse(&mut self, core: &mut BrainCore, dx: f32, dy: f32) {
        if dx.abs() > MOUSE_JUMP {
            self.disregard_y = true;
            return;
        }
        if dy.abs() > MOUSE_JUMP {
            self.disregard_x = true;
            return;
        }
        if self.disregard_y && dy != 0.0 {
            self.disregard_y = false;
            return;
        }
        if self.disregard_x && dx != 0.0 {
            self.disregard_x = false;
            return;
        }

        if dx < 0.0 {
            core.movement.insert(ControlCode::CamRotateRight);
            self.delta_x = dx;
        } else if dx > 0.0 {
            core.movement.insert(ControlCode::CamRotateLeft);
            self.delta_x = dx;
        } else if dy > 0.0 {
            core.movement.insert(ControlCode::CamRotateDown);
            self.delta_y = dy;
        } else if dy < 0.0 {
            core.movement.insert(ControlCode::CamRotateUp);
            self.delta_y = dy;
        }
    }

    fn adjust_speed(&mut self, core: &BrainCore, delta: f32) {
        if core.movement.contains(ControlCode::DriveSpeedUp) {
            self.accel += delta;
            self.decel += delta;
            self.max_velocity += delta;
        }
        if core.movement.contains(ControlCode::DriveSpeedDown) {
            self.accel = (self.accel - delta).max(0.0);
            self.decel = (self.decel - delta).max(0.0);
            self.max_velocity = (self.max_velocity - delta).max(0.0);
        }
    }

    pub(super) fn update(
        &mut self,
        core: &mut BrainCore,
        state: &mut CameraState,
        ctx: &mut BrainContext<'_>,
        dt: f32,
    ) {
        let step = dt.min(MAX_STEP);
        self.adjust_speed(core, SPEED_CHANGE_RATE * step);
        if let Some(over) = ctx.config.accel_override() {
            self.max_velocity = over.velocity;
        }

        let mut speed = self.max_velocity;
        let mut turn = 1.0;
        if core.movement.contains(ControlCode::ModifierFast) {
            turn *= 0.25;
            speed *= 10.0;
        }

        let mut view = (core.poa_goal - core.goal).normalize_or(Vec3::Y);
        let mut right = view.cross(self.up).normalize_or(Vec3::X);
        let mut up = right.cross(view);

        let moves = [
            (ControlCode::CamMoveForward, view),
            (ControlCode::CamMoveBackward, -view),
            (ControlCode::CamMoveLeft, -right),
            (ControlCode::CamMoveRight, right),
            (ControlCode::CamMoveUp, up),
            (ControlCode::CamMoveDown, -up),
        ];
        let mut pos = state.pos;
        for (code, dir) in moves {
            if core.movement.contains(code) {
                pos += dir * speed * step;
            }
        }
        core.goal = pos;

        // Level the camera against world up before turning
        right = Vec3::new(right.x, right.y, 0.0).normalize_or(Vec3::X);
        up = right.cross(view).normalize_or(Vec3::Z);

        if core.movement.contains(ControlCode::CamRotateLeft)
            || core.movement.contains(ControlCode::CamRotateRight)
        {
            let q = Quat::from_axis_angle(up, turn * self.turn_rate * step * self.delta_x);
            view = q * view;
            right = q * right;
            core.movement.remove(ControlCode::CamRotateLeft);
            core.movement.remove(ControlCode::CamRotateRight);
        }
        if core.movement.contains(ControlCode::CamRotateUp)
            || core.movement.contains(ControlCode::CamRotateDown)
        {
            let q = Quat::from_axis_angle(right, turn * self.turn_rate * step * self.delta_y);
            view = q * view;
            core.movement.remove(ControlCode::CamRotateUp);
            core.movement.remove(ControlCode::CamRotateDown);
        }
        self.up = right.cross(view).normalize_or(Vec3::Z);

        core.poa_goal = core.goal + view * POA_DISTANCE;
        state.pos = core.goal;
        state.poa = core.poa_goal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::brain::CameraBrain;
    use crate::camera::brain::BrainKind;
    use crate::scene::SceneGraph;

    const EPSILON: f32 = 1e-4;

    fn drive_brain(config: &CameraConfig) -> CameraBrain {
        let mut brain = CameraBrain::drive(config);
        brain.set_goal(Vec3::ZERO);
        brain.set_poa_goal(Vec3::new(0.0, 2.0, 0.0));
        brain
    }

    fn deltas(brain: &CameraBrain) -> (f32, f32) {
        match &brain.kind {
            BrainKind::Drive(d) => (d.delta_x, d.delta_y),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_mouse_jump_disregards_other_axis() {
        let config = CameraConfig::default();
        let mut brain = drive_brain(&config);

        brain.handle_mouse(0.5, 0.0);
        assert!(!brain.core.movement.contains(ControlCode::CamRotateLeft));

        // Next nonzero dy is swallowed
        brain.handle_mouse(0.0, 0.1);
        assert!(!brain.core.movement.contains(ControlCode::CamRotateDown));

        brain.handle_mouse(0.0, 0.1);
        assert!(brain.core.movement.contains(ControlCode::CamRotateDown));
        assert!((deltas(&brain).1 - 0.1).abs() < EPSILON);
    }

    #[test]
    fn test_mouse_sets_rotate_flags() {
        let config = CameraConfig::default();
        let mut brain = drive_brain(&config);
        brain.handle_mouse(-0.1, 0.0);
        assert!(brain.core.movement.contains(ControlCode::CamRotateRight));
        brain.handle_mouse(0.0, -0.2);
        assert!(brain.core.movement.contains(ControlCode::CamRotateUp));
        assert_eq!(deltas(&brain), (-0.1, -0.2));
    }

    #[test]
    fn test_forward_moves_along_view() {
        let mut config = CameraConfig::default();
        config.use_accel_override = false;
        let scene = SceneGraph::new();
        let mut events = Vec::new();
        let mut ctx = BrainContext::new(&scene, &config, &mut events);
        ctx.is_current = true;

        let mut brain = drive_brain(&config);
        brain.core.movement.insert(ControlCode::CamMoveForward);
        let mut st = CameraState::default();
        brain.update(&mut st, &mut ctx, 0.5, false);

        // Step is capped at 0.01 s
        let expected = config.drive.max_velocity * MAX_STEP;
        assert!((st.pos - Vec3::new(0.0, expected, 0.0)).length() < EPSILON);
        assert!((st.poa - Vec3::new(0.0, expected + POA_DISTANCE, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_rotation_consumes_flags() {
        let config = CameraConfig::default();
        let scene = SceneGraph::new();
        let mut events = Vec::new();
        let mut ctx = BrainContext::new(&scene, &config, &mut events);

        let mut brain = drive_brain(&config);
        brain.handle_mouse(-0.2, 0.0);
        let mut st = CameraState::default();
        brain.update(&mut st, &mut ctx, 0.01, false);

        assert!(!brain.core.movement.contains(ControlCode::CamRotateRight));
        // Turned right: POA swung toward +X
        assert!(st.poa.x > 0.0);
        assert!(st.poa.z.abs() < EPSILON);
    }

    #[test]
    fn test_speed_down_never_negative() {
        let mut config = CameraConfig::default();
        config.use_accel_override = false;
        config.drive.accel = 0.01;
        config.drive.decel = 0.01;
        config.drive.max_velocity = 0.01;
        let scene = SceneGraph::new();
        let mut events = Vec::new();
        let mut ctx = BrainContext::new(&scene, &config, &mut events);

        let mut brain = drive_brain(&config);
        brain.core.movement.insert(ControlCode::DriveSpeedDown);
        let mut st = CameraState::default();
        for _ in 0..10 {
            brain.update(&mut st, &mut ctx, 0.01, false);
        }
        let BrainKind::Drive(drive) = &brain.kind else {
            unreachable!()
        };
        assert_eq!(drive.accel, 0.0);
        assert_eq!(drive.max_velocity, 0.0);
    }
}

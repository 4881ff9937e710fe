//! View panning: pan-limit interpolation, unpan decay and the output view
//! rotation.

use glam::{Quat, Vec3};

use super::VirtualCamera;
use crate::camera::flags::CameraFlags;
use crate::input::ControlCode;
use crate::scene::SceneProvider;

/// Rate pan controls move the pan pair, per second.
const PAN_CONTROL_SPEED: f32 = 0.5;

/// Unpan duration while falling, seconds.
const FALLING_UNPAN_TIME: f32 = 0.5;

/// Distance the panned POA is re-projected along the view.
const PANNED_POA_DISTANCE: f32 = 15.0;

/// Normalized pan offsets and limits. 0.5 is centred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanState {
    /// Horizontal pan; above 0.5 looks right
    pub x: f32,
    /// Vertical pan; above 0.5 looks down
    pub y: f32,
    /// Vertical pan kept across first-person toggles
    pub retained_y: f32,
    /// Active horizontal limit, radians
    pub x_limit: f32,
    /// Active vertical limit, radians
    pub z_limit: f32,
    x_limit_goal: f32,
    z_limit_goal: f32,
    x_interp_rate: f32,
    z_interp_rate: f32,
    x_unpan_rate: f32,
    z_unpan_rate: f32,
}

impl Default for PanState {
    fn default() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            retained_y: 0.5,
            x_limit: 0.0,
            z_limit: 0.0,
            x_limit_goal: 0.0,
            z_limit_goal: 0.0,
            x_interp_rate: 0.0,
            z_interp_rate: 0.0,
            x_unpan_rate: 0.0,
            z_unpan_rate: 0.0,
        }
    }
}

impl PanState {
    pub fn is_centred(&self) -> bool {
        self.x == 0.5 && self.y == 0.5
    }

    /// Snap both axes back to centre.
    pub fn recentre(&mut self) {
        self.x = 0.5;
        self.y = 0.5;
    }

    /// Clamp both axes into `[0, 1]`.
    pub fn clamp(&mut self) {
        self.x = self.x.clamp(0.0, 1.0);
        self.y = self.y.clamp(0.0, 1.0);
    }

    pub fn limit_goals(&self) -> (f32, f32) {
        (self.x_limit_goal, self.z_limit_goal)
    }
}

/// Advance `value` by `rate * dt`, stopping at `goal`. A zero rate snaps.
fn step_toward(value: &mut f32, rate: &mut f32, goal: f32, dt: f32) {
    *value += *rate * dt;
    if (*rate > 0.0 && *value >= goal) || (*rate < 0.0 && *value <= goal) {
        *value = goal;
        *rate = 0.0;
    }
    if *rate == 0.0 {
        *value = goal;
    }
}

impl<S: SceneProvider> VirtualCamera<S> {
    /// Start blending the pan limits toward the active brain's over one second.
    pub(super) fn start_interp_pan_limits(&mut self) {
        let brain = self
            .python
            .and_then(|id| self.brain(id))
            .or_else(|| self.current_stack_camera().and_then(|id| self.brain(id)));
        let Some((x_goal, z_goal)) = brain.map(|b| b.get_pan_limits()) else {
            return;
        };

        let pan = &mut self.pan;
        if x_goal == pan.x_limit && z_goal == pan.z_limit {
            self.flags.remove(CameraFlags::INTERP_PAN_LIMITS);
            return;
        }
        pan.x_limit_goal = x_goal;
        pan.z_limit_goal = z_goal;
        pan.x_interp_rate = x_goal - pan.x_limit;
        pan.z_interp_rate = z_goal - pan.z_limit;
        self.flags.insert(CameraFlags::INTERP_PAN_LIMITS);
    }

    fn interp_pan_limits(&mut self, dt: f32) {
        let pan = &mut self.pan;
        if pan.x_limit_goal == pan.x_limit && pan.z_limit_goal == pan.z_limit {
            self.flags.remove(CameraFlags::INTERP_PAN_LIMITS);
            return;
        }
        step_toward(&mut pan.z_limit, &mut pan.z_interp_rate, pan.z_limit_goal, dt);
        step_toward(&mut pan.x_limit, &mut pan.x_interp_rate, pan.x_limit_goal, dt);
    }

    /// Start decaying the pan back to centre.
    pub(super) fn start_unpan(&mut self) {
        if self.flags.contains(CameraFlags::UNPAN) {
            return;
        }
        self.flags.insert(CameraFlags::UNPAN);
        let time = if self.flags.contains(CameraFlags::FALLING) {
            FALLING_UNPAN_TIME
        } else {
            self.config.pan_response_time
        };
        self.pan.x_unpan_rate = (0.5 - self.pan.x) / time;
        self.pan.z_unpan_rate = (0.5 - self.pan.y) / time;
    }

    fn unpan_if_needed(&mut self, dt: f32) {
        if !self.flags.contains(CameraFlags::UNPAN) {
            return;
        }
        let pan = &mut self.pan;
        if pan.is_centred() {
            self.flags.remove(CameraFlags::UNPAN);
            return;
        }
        pan.x += pan.x_unpan_rate * dt;
        pan.y += pan.z_unpan_rate * dt;
        if (pan.x_unpan_rate > 0.0 && pan.x >= 0.5) || (pan.x_unpan_rate < 0.0 && pan.x <= 0.5) {
            pan.x = 0.5;
            pan.x_unpan_rate = 0.0;
        }
        if (pan.z_unpan_rate > 0.0 && pan.y >= 0.5) || (pan.z_unpan_rate < 0.0 && pan.y <= 0.5) {
            pan.y = 0.5;
            pan.z_unpan_rate = 0.0;
        }
    }

    /// Apply pan controls and decay, then rotate the view from `pos` toward
    /// `poa` by the pan pair. Returns the panned POA.
    pub(super) fn adjust_for_input(&mut self, pos: Vec3, poa: Vec3) -> Vec3 {
        let dt = self.frame_dt;
        let first_person = self.first_person_override.is_some();

        if !first_person {
            if self.flags.contains(CameraFlags::INTERP_PAN_LIMITS) {
                self.interp_pan_limits(dt);
            }
            self.unpan_if_needed(dt);

            let step = PAN_CONTROL_SPEED * dt;
            if self.movement.contains(ControlCode::PanUp) {
                self.pan.y -= step;
            }
            if self.movement.contains(ControlCode::PanDown) {
                self.pan.y += step;
            }
            if self.movement.contains(ControlCode::PanLeft) {
                self.pan.x -= step;
            }
            if self.movement.contains(ControlCode::PanRight) {
                self.pan.x += step;
            }
        }

        if self.pan.is_centred() && !first_person {
            return poa;
        }
        self.pan.clamp();
        if self.pan.x_limit == 0.0 && self.pan.z_limit == 0.0 && !first_person {
            return poa;
        }

        let forward = (poa - pos).normalize_or(Vec3::Y);
        let right = forward.cross(Vec3::Z).normalize_or(Vec3::X);
        let up = right.cross(forward);

        let yaw = if first_person {
            0.0
        } else {
            self.pan.x_limit * (self.pan.x - 0.5) / 0.5
        };
        let z_limit = if first_person {
            self.config.first_person_pan_limit
        } else {
            self.pan.z_limit
        };
        let pitch = z_limit * (self.pan.y - 0.5) / 0.5;

        let view = Quat::from_axis_angle(right, -pitch) * (Quat::from_axis_angle(-up, yaw) * forward);
        log::trace!("pan ({:.3}, {:.3}) -> yaw {yaw:.3} pitch {pitch:.3}", self.pan.x, self.pan.y);
        pos + view * PANNED_POA_DISTANCE
    }
}

//! Circle Brain
//!
//! Keeps the camera on a horizontal circle around a centre point, at the
//! angle nearest (or farthest from) the subject. The camera swings round the
//! circle at a fixed number of circles per second; the position itself snaps
//! to the point on the circle, so all smoothing happens in the angle.

use std::f32::consts::TAU;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::brain::{BrainContext, BrainCore};
use super::flags::BrainFlags;
use super::modifier::CameraState;
use super::motion::{step_angle, wrap_angle};
use crate::scene::{ObjectId, translation};

/// Angular speed used to warp onto the goal angle.
const WARP_CIRCLES_PER_SEC: f32 = 100.0;

/// Orbit parameters and current angle of a circle brain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleState {
    /// Fixed centre, used when no centre object is set
    pub center: Vec3,
    /// Object whose position is the centre
    #[serde(default)]
    pub center_object: Option<ObjectId>,
    /// Object to look at instead of the centre
    #[serde(default)]
    pub poa_object: Option<ObjectId>,
    pub radius: f32,
    pub circles_per_sec: f32,
    /// Sit on the far side of the circle from the subject
    #[serde(default)]
    pub farthest: bool,
    /// Look at the local avatar
    #[serde(default)]
    pub local_avatar: bool,
    #[serde(skip)]
    cur_rad: f32,
    #[serde(skip)]
    goal_rad: f32,
}

impl CircleState {
    pub fn new(center: Vec3, radius: f32, circles_per_sec: f32) -> Self {
        Self {
            center,
            center_object: None,
            poa_object: None,
            radius,
            circles_per_sec,
            farthest: false,
            local_avatar: false,
            cur_rad: 0.0,
            goal_rad: 0.0,
        }
    }

    /// Current angle around the circle, radians in `[0, 2π)`.
    pub fn angle(&self) -> f32 {
        self.cur_rad
    }

    pub fn goal_angle(&self) -> f32 {
        self.goal_rad
    }

    fn center_point(&self, ctx: &BrainContext<'_>) -> Vec3 {
        self.center_object
            .and_then(|id| ctx.scene.local_to_world(id))
            .map(|m| translation(&m))
            .unwrap_or(self.center)
    }

    /// Point on the circle nearest `to` (or farthest), at height `z`.
    ///
    /// Records the matching goal angle.
    fn closest_point(&mut self, center: Vec3, to: Vec3, z: f32) -> Vec3 {
        let on_plane = Vec3::new(to.x, to.y, center.z);
        let dir = if self.farthest {
            center - on_plane
        } else {
            on_plane - center
        }
        .normalize_or_zero();

        self.goal_rad = wrap_angle(dir.y.atan2(dir.x));
        let mut p = center + dir * self.radius;
        p.z = z;
        p
    }

    /// Swing the current angle toward the goal angle and return the
    /// resulting point on the circle.
    fn step_toward_goal(&mut self, center: Vec3, z: f32, secs: f32, warp: bool) -> Vec3 {
        let cps = if warp {
            WARP_CIRCLES_PER_SEC
        } else {
            self.circles_per_sec
        };
        self.cur_rad = step_angle(self.cur_rad, self.goal_rad, TAU * cps * secs);

        Vec3::new(
            center.x + self.cur_rad.cos() * self.radius,
            center.y + self.cur_rad.sin() * self.radius,
            z,
        )
    }

    pub(super) fn update(
        &mut self,
        core: &mut BrainCore,
        state: &mut CameraState,
        ctx: &mut BrainContext<'_>,
        secs: f32,
        dt: f32,
    ) {
        let Some(subject) = core.subject.and_then(|s| ctx.scene.local_to_world(s)) else {
            return;
        };
        let center = self.center_point(ctx);
        let z = state.pos.z;
        core.goal = self.closest_point(center, translation(&subject), z);

        let poa_object = if self.local_avatar {
            ctx.scene.local_player()
        } else {
            self.poa_object
        };
        core.poa_goal = poa_object
            .and_then(|id| ctx.scene.local_to_world(id))
            .map(|m| translation(&m))
            .unwrap_or(center)
            + core.poa_offset;

        if core.has_flag(BrainFlags::CUT_POS_ONCE) {
            core.goal = self.step_toward_goal(center, z, secs, true);
            core.flags.remove(BrainFlags::CUT_POS);
        } else {
            core.goal = self.step_toward_goal(center, z, secs, false);
            core.flags.insert(BrainFlags::CUT_POS);
        }

        core.adjust_for_input();
        core.move_toward_goal(state, ctx, secs);
        core.point_toward_goal(state, ctx, secs);
        if core.has_flag(BrainFlags::ANIMATE_FOV) {
            core.animate_fov(state, dt);
        }
    }
}

//! Camera Motion Helpers
//!
//! Acceleration-limited goal seeking shared by every brain, plus the FOV and
//! angle math the controller needs. All functions are pure.
//!
//! Positions and points of aim are integrated independently: each keeps a
//! scalar speed, which is re-aimed along the current goal direction every
//! step, accelerated or decelerated, then clamped to the step's maximum.

use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// Max speed used while a camera has fallen badly behind its subject.
pub const PANIC_VELOCITY: f32 = 1000.0;

/// Minimum speed for cameras following a running avatar.
pub const RUNNING_VELOCITY: f32 = 16.0;

/// Distances under this are not stop-smoothed.
const STOP_SMOOTH_MIN: f32 = 0.1;
/// Distances over this are not stop-smoothed.
const STOP_SMOOTH_MAX: f32 = 5.0;

/// Acceleration, deceleration and top speed for one integrated quantity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedLimits {
    /// Units per second squared
    pub accel: f32,
    /// Units per second squared
    pub decel: f32,
    /// Units per second
    pub velocity: f32,
}

impl SpeedLimits {
    pub const fn new(accel: f32, decel: f32, velocity: f32) -> Self {
        Self {
            accel,
            decel,
            velocity,
        }
    }
}

/// Whether a body moving at `speed` must start braking to stop within `dist`.
///
/// A zero deceleration never brakes.
pub fn should_decelerate(decel: f32, speed: f32, dist: f32) -> bool {
    if decel == 0.0 {
        return false;
    }
    let stop_time = speed / decel;
    let stop_dist = speed * 0.5 * stop_time;
    dist.abs() <= stop_dist.abs()
}

/// Top speed reduced as the goal gets close, so arrival is not abrupt.
pub fn stop_smoothed_velocity(velocity: f32, dist: f32) -> f32 {
    if dist <= STOP_SMOOTH_MAX && dist > STOP_SMOOTH_MIN {
        let mult = (dist - STOP_SMOOTH_MAX) * 0.1;
        velocity - (velocity * mult).abs()
    } else {
        velocity
    }
}

/// Re-aim `speed` along `dir` and apply one step of acceleration.
///
/// A zero effective rate jumps straight to `max_speed`.
pub fn adjust_velocity(
    dir: Vec3,
    speed: f32,
    limits: SpeedLimits,
    max_speed: f32,
    dist: f32,
    dt: f32,
) -> Vec3 {
    let vel = dir * speed;
    let rate = if should_decelerate(limits.decel, speed, dist) {
        -limits.decel
    } else {
        limits.accel
    };

    if rate != 0.0 {
        vel + dir * rate * dt
    } else {
        dir * max_speed
    }
}

/// Turn a velocity into this step's displacement, clamped to `max_speed * dt`.
///
/// Returns the displacement and its length.
pub fn clamp_velocity(vel: Vec3, max_speed: f32, dt: f32) -> (Vec3, f32) {
    let step = vel * dt;
    let max_step = max_speed * dt;
    let moved = step.length();
    if moved > max_step {
        (step.normalize_or_zero() * max_step, max_step)
    } else {
        (step, moved)
    }
}

/// Advance `current` one step toward `goal`.
///
/// `adjust` drives acceleration (its `velocity` is the cap used when the rate
/// is zero) and `clamp_max` bounds the displacement. `speed` is read and
/// updated in place. Overshooting the goal snaps onto it.
pub fn approach(
    current: Vec3,
    goal: Vec3,
    speed: &mut f32,
    adjust: SpeedLimits,
    clamp_max: f32,
    dt: f32,
) -> Vec3 {
    let offset = goal - current;
    let dist = offset.length();
    let dir = if dist > 0.0 { offset / dist } else { Vec3::ZERO };

    let vel = adjust_velocity(dir, *speed, adjust, adjust.velocity, dist, dt);
    *speed = vel.length();

    let (step, moved) = clamp_velocity(vel, clamp_max, dt);
    if moved > dist { goal } else { current + step }
}

// ============================================================================
// FOV MATH
// ============================================================================

/// Width that keeps the current width/height relation when zooming to `goal_h`.
pub fn zoom_fov_w(goal_h: f32, cur_w: f32, cur_h: f32) -> f32 {
    let num = (goal_h * 0.5).to_radians().tan() * (cur_w * 0.5).to_radians().tan();
    let denom = (cur_h * 0.5).to_radians().tan();
    if denom == 0.0 {
        return cur_w;
    }
    2.0 * (num / denom).atan().to_degrees().abs()
}

/// Horizontal FOV authored for 4:3, corrected for the actual aspect ratio.
pub fn aspect_corrected_fov_w(w: f32, aspect_ratio: f32) -> f32 {
    const FOUR_BY_THREE: f32 = 4.0 / 3.0;
    if aspect_ratio == FOUR_BY_THREE {
        return w;
    }
    let scale = aspect_ratio / FOUR_BY_THREE;
    2.0 * (scale * (w * 0.5).to_radians().tan()).atan().to_degrees()
}

// ============================================================================
// ANGLES
// ============================================================================

/// Map any angle into `[0, 2π)`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Move `current` toward `goal` (both in `[0, 2π]`) by at most `speed`,
/// taking the short way round and wrapping through zero when needed.
pub fn step_angle(current: f32, goal: f32, speed: f32) -> f32 {
    if current == goal {
        return current;
    }
    if !speed.is_finite() {
        return goal;
    }
    let must_wrap = (goal - current).abs() > PI;
    let mut cur = current;

    if cur < goal {
        if must_wrap {
            cur -= speed;
            if cur < 0.0 {
                cur = wrap_angle(cur);
                if cur < goal {
                    cur = goal;
                }
            }
        } else {
            cur = (cur + speed).min(goal);
        }
    } else if must_wrap {
        cur += speed;
        if cur > TAU {
            cur = wrap_angle(cur);
            if cur > goal {
                cur = goal;
            }
        }
    } else {
        cur = (cur - speed).max(goal);
    }
    cur
}

//! Camera Brains
//!
//! A brain computes where its camera wants to be (the goal position and goal
//! point of aim) and moves the camera there under acceleration limits.
//!
//! Every brain shares a [`BrainCore`] holding goals, speeds, flags and FOV
//! animation. Variant-specific state lives in the closed [`BrainKind`] set:
//!
//! - **Basic**: sits on its target object, looks at its subject
//! - **Fixed**: like basic, with an optional "look at another camera's goal"
//! - **Avatar**: follows the subject at an offset, keeping line of sight
//! - **FirstPerson**: avatar rules locked to the head, hides the avatar mesh
//! - **Drive**: free-fly debug camera steered by controls and mouse
//! - **Circle**: orbits a centre, staying on the circle nearest the subject
//!
//! Brains never write to the scene. They write the camera's resolved pose
//! ([`CameraState`]) and report side effects through [`BrainContext`].

use glam::{Mat4, Vec3};

use super::circle::CircleState;
use super::drive::DriveState;
use super::flags::BrainFlags;
use super::modifier::{CameraId, CameraState};
use super::motion::{
    PANIC_VELOCITY, RUNNING_VELOCITY, SpeedLimits, approach, stop_smoothed_velocity, zoom_fov_w,
};
use crate::config::CameraConfig;
use crate::events::CameraEvent;
use crate::input::{ControlCode, ControlFlags};
use crate::scene::{LosHit, ObjectId, SceneProvider, right_axis, translation, view_axis};

/// Step used when a brain is primed on push.
pub const FORCED_STEP: f32 = 10.0;

/// Default accel/decel/velocity for both position and POA.
const DEFAULT_SPEED: f32 = 30.0;

/// Squared offset under which an obstructed avatar camera fades the avatar.
const FADE_DIST_SQ: f32 = 16.0;

/// How far off the blocker surface an obstructed camera sits.
const OBSTRUCTION_STANDOFF: f32 = 0.5;

// ============================================================================
// CONTEXT
// ============================================================================

/// Requests a brain makes of the controller during an update.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BrainRequests {
    /// Raise (`Some(true)`) or clear the controller's falling state
    pub falling: Option<bool>,
    /// Start decaying the pan back to centre
    pub start_unpan: bool,
}

/// Everything a brain may read or emit during one update.
pub struct BrainContext<'a> {
    pub scene: &'a dyn SceneProvider,
    pub config: &'a CameraConfig,
    /// Local-to-world of the camera's own target object, if loaded
    pub target: Option<Mat4>,
    /// This camera is the one being rendered
    pub is_current: bool,
    /// This camera is the top of the stack
    pub is_stack_top: bool,
    /// Goal of the camera a fixed brain aims at, if any
    pub target_point_goal: Option<Vec3>,
    /// Controller clock in seconds
    pub now: f64,
    pub events: &'a mut Vec<CameraEvent>,
    pub requests: BrainRequests,
}

impl<'a> BrainContext<'a> {
    pub fn new(
        scene: &'a dyn SceneProvider,
        config: &'a CameraConfig,
        events: &'a mut Vec<CameraEvent>,
    ) -> Self {
        Self {
            scene,
            config,
            target: None,
            is_current: false,
            is_stack_top: false,
            target_point_goal: None,
            now: 0.0,
            events,
            requests: BrainRequests::default(),
        }
    }
}

/// Commands addressed to a brain rather than the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BrainCommand {
    StartZoomIn,
    StartZoomOut,
    StopZoom,
    NonPhysOn,
    NonPhysOff,
}

// ============================================================================
// CORE
// ============================================================================

/// In-flight FOV animation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct FovAnimation {
    w_goal: f32,
    h_goal: f32,
    w_rate: f32,
    h_rate: f32,
}

/// State and motion shared by every brain variant.
#[derive(Debug, Clone)]
pub struct BrainCore {
    pub flags: BrainFlags,
    /// Where the camera wants to be
    pub goal: Vec3,
    /// Where the camera wants to look
    pub poa_goal: Vec3,
    /// Camera offset from the subject (avatar-type brains)
    pub offset: Vec3,
    /// POA offset from the subject
    pub poa_offset: Vec3,
    pub pos_limits: SpeedLimits,
    pub poa_limits: SpeedLimits,
    /// Current position speed (units/s)
    pub cur_cam_speed: f32,
    /// Current POA speed (units/s)
    pub cur_view_speed: f32,
    /// Horizontal pan limit in radians
    pub x_pan_limit: f32,
    /// Vertical pan limit in radians
    pub z_pan_limit: f32,
    pub pan_speed: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub zoom_rate: f32,
    /// Fraction of the full offset kept (mouse-wheel zoom on avatar cameras)
    pub offset_pct: f32,
    /// Object this brain follows or looks at
    pub subject: Option<ObjectId>,
    /// Controls currently held, as seen by this brain
    pub movement: ControlFlags,
    fov_anim: FovAnimation,
    fall_timer: f64,
}

impl Default for BrainCore {
    fn default() -> Self {
        Self {
            flags: BrainFlags::empty(),
            goal: Vec3::ONE,
            poa_goal: Vec3::ZERO,
            offset: Vec3::ZERO,
            poa_offset: Vec3::ZERO,
            pos_limits: SpeedLimits::new(DEFAULT_SPEED, DEFAULT_SPEED, DEFAULT_SPEED),
            poa_limits: SpeedLimits::new(DEFAULT_SPEED, DEFAULT_SPEED, DEFAULT_SPEED),
            cur_cam_speed: 0.0,
            cur_view_speed: 0.0,
            x_pan_limit: 0.0,
            z_pan_limit: 0.0,
            pan_speed: 0.5,
            zoom_min: 0.0,
            zoom_max: 0.0,
            zoom_rate: 0.0,
            offset_pct: 1.0,
            subject: None,
            movement: ControlFlags::new(),
            fov_anim: FovAnimation::default(),
            fall_timer: 0.0,
        }
    }
}

impl BrainCore {
    #[inline]
    pub fn has_flag(&self, flag: BrainFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Limits used to accelerate, and the cap used to clamp one step.
    fn step_limits(
        &self,
        own: SpeedLimits,
        fall: SpeedLimits,
        dist: f32,
        config: &CameraConfig,
    ) -> (SpeedLimits, f32) {
        let falling = self.has_flag(BrainFlags::FALLING);
        let panic = self.has_flag(BrainFlags::PANIC_VELOCITY);
        let running = self.has_flag(BrainFlags::RUNNING) && own.velocity < RUNNING_VELOCITY;

        let adjust = if falling {
            fall
        } else if let Some(over) = config.accel_override() {
            over
        } else if panic {
            SpeedLimits {
                velocity: PANIC_VELOCITY,
                ..own
            }
        } else if running {
            SpeedLimits {
                velocity: RUNNING_VELOCITY,
                ..own
            }
        } else {
            SpeedLimits {
                velocity: stop_smoothed_velocity(own.velocity, dist),
                ..own
            }
        };

        let clamp = if panic {
            PANIC_VELOCITY
        } else if falling {
            fall.velocity
        } else if running {
            RUNNING_VELOCITY
        } else {
            own.velocity
        };

        (adjust, clamp)
    }

    /// Move the camera position toward `goal`.
    pub fn move_toward_goal(&mut self, state: &mut CameraState, ctx: &BrainContext<'_>, dt: f32) {
        if self.flags.intersects(BrainFlags::CUT_POS | BrainFlags::NON_PHYS) || !ctx.is_current {
            state.pos = self.goal;
            return;
        }
        if self.has_flag(BrainFlags::CUT_POS_ONCE) {
            state.pos = self.goal;
            self.flags.remove(BrainFlags::CUT_POS_ONCE);
            return;
        }

        let dist = (self.goal - state.pos).length();
        let (adjust, clamp) = self.step_limits(self.pos_limits, ctx.config.fall_limits(), dist, ctx.config);
        state.pos = approach(state.pos, self.goal, &mut self.cur_cam_speed, adjust, clamp, dt);
    }

    /// Move the camera point of aim toward `poa_goal`.
    pub fn point_toward_goal(&mut self, state: &mut CameraState, ctx: &BrainContext<'_>, dt: f32) {
        if self.flags.intersects(BrainFlags::CUT_POA | BrainFlags::NON_PHYS) || !ctx.is_current {
            state.poa = self.poa_goal;
            return;
        }
        if self.has_flag(BrainFlags::CUT_POA_ONCE) {
            state.poa = self.poa_goal;
            self.flags.remove(BrainFlags::CUT_POA_ONCE);
            return;
        }

        let dist = (self.poa_goal - state.poa).length();
        let (adjust, clamp) =
            self.step_limits(self.poa_limits, ctx.config.fall_poa_limits(), dist, ctx.config);
        state.poa = approach(state.poa, self.poa_goal, &mut self.cur_view_speed, adjust, clamp, dt);
    }

    /// Pull the goal toward the POA by the mouse-wheel offset percentage.
    pub fn adjust_for_input(&mut self) {
        if self.offset_pct < 1.0 {
            let v = self.poa_goal - self.goal;
            let len = v.length();
            let pull = len - len * self.offset_pct;
            self.goal += v.normalize_or_zero() * pull;
        }
    }

    /// Animate the camera FOV to `w` x `h` over `secs`.
    ///
    /// A zero `w` derives the width from the current width/height relation.
    pub fn set_fov_goal(&mut self, w: f32, h: f32, secs: f32, state: &mut CameraState) {
        let h_settled = self.fov_anim.h_goal == h || h == state.fov_h;
        let w_settled = self.fov_anim.w_goal == w || w == state.fov_w;
        if h_settled && w_settled {
            return;
        }

        let w = if w == 0.0 {
            zoom_fov_w(h, state.fov_w, state.fov_h)
        } else {
            w
        };
        if secs <= 0.0 {
            state.fov_w = w;
            state.fov_h = h;
            self.flags.remove(BrainFlags::ANIMATE_FOV);
            return;
        }
        self.fov_anim = FovAnimation {
            w_goal: w,
            h_goal: h,
            w_rate: (w - state.fov_w) / secs,
            h_rate: (h - state.fov_h) / secs,
        };
        self.flags.insert(BrainFlags::ANIMATE_FOV);
    }

    /// Advance the FOV animation one step.
    pub fn animate_fov(&mut self, state: &mut CameraState, dt: f32) {
        let anim = self.fov_anim;
        let mut h = state.fov_h + anim.h_rate * dt;
        let mut w = state.fov_w + anim.w_rate * dt;

        if (anim.h_rate < 0.0 && h <= anim.h_goal) || (anim.h_rate > 0.0 && h >= anim.h_goal) {
            h = anim.h_goal;
        }
        if (anim.w_rate < 0.0 && w <= anim.w_goal) || (anim.w_rate > 0.0 && w >= anim.w_goal) {
            w = anim.w_goal;
        }
        if w == anim.w_goal && h == anim.h_goal {
            self.flags.remove(BrainFlags::ANIMATE_FOV);
        }
        state.fov_w = w;
        state.fov_h = h;
    }

    fn start_zoom(&mut self, goal_h: f32, rate: f32, state: &CameraState) {
        self.flags.insert(BrainFlags::ANIMATE_FOV);
        self.fov_anim = FovAnimation {
            w_goal: zoom_fov_w(goal_h, state.fov_w, state.fov_h),
            h_goal: goal_h,
            w_rate: rate,
            h_rate: rate,
        };
    }

    /// React to a brain-level command.
    pub fn handle_command(&mut self, cmd: BrainCommand, state: &CameraState) {
        match cmd {
            BrainCommand::StartZoomIn => self.start_zoom(self.zoom_min, -self.zoom_rate, state),
            BrainCommand::StartZoomOut => self.start_zoom(self.zoom_max, self.zoom_rate, state),
            BrainCommand::StopZoom => self.flags.remove(BrainFlags::ANIMATE_FOV),
            BrainCommand::NonPhysOn => self.flags.insert(BrainFlags::NON_PHYS),
            BrainCommand::NonPhysOff => self.flags.remove(BrainFlags::NON_PHYS),
        }
    }

    /// Track a control press or release; handles free-look and telescope zoom.
    pub fn handle_control(
        &mut self,
        code: ControlCode,
        activated: bool,
        state: &CameraState,
        events: &mut Vec<CameraEvent>,
    ) {
        self.movement.set(code, activated);
        let zoom = self.has_flag(BrainFlags::ZOOM_ENABLED);

        if activated {
            match code {
                ControlCode::FreeLook => events.push(CameraEvent::RecenterMouse(true)),
                ControlCode::ZoomIn if zoom => {
                    self.start_zoom(self.zoom_min, -self.zoom_rate, state);
                }
                ControlCode::ZoomOut if zoom => {
                    self.start_zoom(self.zoom_max, self.zoom_rate, state);
                }
                ControlCode::Recenter if zoom => {
                    let mid = self.zoom_min + (self.zoom_max - self.zoom_min) / 2.0;
                    let rate = if state.fov_h >= mid {
                        -self.zoom_rate
                    } else {
                        self.zoom_rate
                    };
                    self.start_zoom(mid, rate, state);
                }
                _ => {}
            }
        } else {
            match code {
                ControlCode::FreeLook => events.push(CameraEvent::RecenterMouse(false)),
                ControlCode::ZoomIn | ControlCode::ZoomOut if zoom => {
                    self.flags.remove(BrainFlags::ANIMATE_FOV);
                }
                _ => {}
            }
        }
    }

    /// Base push: prime the pose with a forced, cut update.
    fn prime(&mut self, recenter: bool, events: &mut Vec<CameraEvent>) {
        if recenter {
            events.push(CameraEvent::RecenterMouse(false));
        }
        self.offset_pct = 1.0;
        self.flags.insert(BrainFlags::CUT_POA_ONCE | BrainFlags::CUT_POS_ONCE);
    }

    /// Goal from the subject's frame and the brain's offsets.
    ///
    /// `from` is the point offsets are measured from; `frame` supplies the axes.
    fn subject_relative(&self, from: Vec3, frame: &Mat4, offset: Vec3, worldspace: bool) -> Vec3 {
        if worldspace {
            return from + offset;
        }
        let view = view_axis(frame);
        let right = right_axis(frame);
        let mut p = from - view * offset.y - right * offset.x;
        p.z += offset.z;
        p
    }

    fn finish_update(&mut self, state: &mut CameraState, ctx: &BrainContext<'_>, secs: f32, dt: f32) {
        self.move_toward_goal(state, ctx, secs);
        self.point_toward_goal(state, ctx, secs);
        if self.has_flag(BrainFlags::ANIMATE_FOV) {
            self.animate_fov(state, dt);
        }
    }
}

// ============================================================================
// AVATAR STATE
// ============================================================================

/// Line-of-sight and fade state of avatar-following brains.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AvatarState {
    /// Something blocks the view between POA and camera
    pub obscured: bool,
    /// Last blocker hit
    pub hit: Option<LosHit>,
    /// The avatar has been faded out by this camera
    pub faded: bool,
}

impl AvatarState {
    fn send_fade(&self, core: &BrainCore, ctx: &mut BrainContext<'_>, fade_out: bool) {
        if !ctx.is_current {
            return;
        }
        if let Some(subject) = core.subject {
            log::debug!(
                "current camera fading avatar {}",
                if fade_out { "out" } else { "in" }
            );
            ctx.events.push(CameraEvent::AvatarFade { subject, fade_out });
        }
    }

    /// Compute goal and POA goal from the subject, handling falling, lag and
    /// line of sight.
    fn calculate_position(
        &mut self,
        core: &mut BrainCore,
        subject_l2w: &Mat4,
        head: Option<Vec3>,
        first_person: bool,
        state: &CameraState,
        ctx: &mut BrainContext<'_>,
    ) {
        let from = head.unwrap_or_else(|| translation(subject_l2w));

        if !first_person && core.has_flag(BrainFlags::FALLING) && !core.has_flag(BrainFlags::WORLDSPACE_POS) {
            let mut goal = from - view_axis(subject_l2w) * 0.5;
            goal.z += 20.0;
            core.goal = goal;
        } else {
            let worldspace = core.has_flag(BrainFlags::WORLDSPACE_POS);
            core.goal = core.subject_relative(from, subject_l2w, core.offset, worldspace);
        }
        let worldspace_poa = core.has_flag(BrainFlags::WORLDSPACE_POA);
        core.poa_goal = core.subject_relative(from, subject_l2w, core.poa_offset, worldspace_poa);

        // Lagging far behind?
        let lag = state.pos - core.goal;
        let panic = lag.length_squared() > 4.0 * core.offset.length_squared();
        core.flags.set(BrainFlags::PANIC_VELOCITY, panic);

        if core.has_flag(BrainFlags::MAINTAIN_LOS) && ctx.is_stack_top {
            self.hit = ctx.scene.line_of_sight(core.poa_goal, core.goal);
            self.obscured = self.hit.is_some();
        }

        match (self.obscured, self.hit) {
            (true, Some(hit)) => {
                core.goal = hit.point + hit.normal * OBSTRUCTION_STANDOFF;

                let new_off = (core.goal - core.poa_goal).length_squared();
                let actual_off = (state.pos - core.poa_goal).length_squared();
                if new_off <= FADE_DIST_SQ && actual_off <= FADE_DIST_SQ && !self.faded {
                    self.send_fade(core, ctx, true);
                    self.faded = true;
                } else if new_off >= FADE_DIST_SQ && self.faded {
                    self.send_fade(core, ctx, false);
                    self.faded = false;
                }
            }
            _ => {
                if self.faded {
                    self.send_fade(core, ctx, false);
                    self.faded = false;
                }
            }
        }
    }
}

// ============================================================================
// BRAIN
// ============================================================================

/// Closed set of brain behaviours.
#[derive(Debug, Clone)]
pub enum BrainKind {
    Basic,
    Fixed {
        /// Camera whose goal this one looks at when it has no subject
        target_point: Option<CameraId>,
    },
    Avatar(AvatarState),
    FirstPerson {
        avatar: AvatarState,
        /// Head node used as the position source, when the avatar has one
        pos_node: Option<ObjectId>,
    },
    Drive(DriveState),
    Circle(CircleState),
}

impl BrainKind {
    /// Brains that track a moving avatar (first person included).
    pub fn is_tracking(&self) -> bool {
        matches!(self, BrainKind::Avatar(_) | BrainKind::FirstPerson { .. })
    }

    pub fn supports_line_of_sight(&self) -> bool {
        self.is_tracking()
    }

    pub fn supports_fading(&self) -> bool {
        self.is_tracking()
    }

    pub fn is_first_person(&self) -> bool {
        matches!(self, BrainKind::FirstPerson { .. })
    }

    pub fn is_drive(&self) -> bool {
        matches!(self, BrainKind::Drive(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            BrainKind::Basic => "basic",
            BrainKind::Fixed { .. } => "fixed",
            BrainKind::Avatar(_) => "avatar",
            BrainKind::FirstPerson { .. } => "first-person",
            BrainKind::Drive(_) => "drive",
            BrainKind::Circle(_) => "circle",
        }
    }
}

/// A camera brain: shared core plus variant behaviour.
#[derive(Debug, Clone)]
pub struct CameraBrain {
    pub core: BrainCore,
    pub kind: BrainKind,
}

impl CameraBrain {
    pub fn new(kind: BrainKind) -> Self {
        Self {
            core: BrainCore::default(),
            kind,
        }
    }

    pub fn basic() -> Self {
        Self::new(BrainKind::Basic)
    }

    pub fn fixed() -> Self {
        Self::new(BrainKind::Fixed { target_point: None })
    }

    /// Avatar-following brain. Cuts its POA by default.
    pub fn avatar() -> Self {
        let mut brain = Self::new(BrainKind::Avatar(AvatarState::default()));
        brain.core.flags.insert(BrainFlags::CUT_POA);
        brain
    }

    pub fn first_person() -> Self {
        let mut brain = Self::new(BrainKind::FirstPerson {
            avatar: AvatarState::default(),
            pos_node: None,
        });
        brain.core.flags.insert(BrainFlags::CUT_POA);
        brain
    }

    pub fn drive(config: &CameraConfig) -> Self {
        let mut brain = Self::new(BrainKind::Drive(DriveState::new(config)));
        brain.core.goal = Vec3::splat(100.0);
        brain.core.poa_goal = Vec3::ZERO;
        brain
    }

    pub fn circle(circle: CircleState) -> Self {
        Self::new(BrainKind::Circle(circle))
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    #[inline]
    pub fn has_flag(&self, flag: BrainFlags) -> bool {
        self.core.has_flag(flag)
    }

    #[inline]
    pub fn set_flags(&mut self, flags: BrainFlags) {
        self.core.flags.insert(flags);
    }

    #[inline]
    pub fn clear_flags(&mut self, flags: BrainFlags) {
        self.core.flags.remove(flags);
    }

    /// Request both cut-once flags.
    pub fn cut_once(&mut self) {
        self.set_flags(BrainFlags::CUT_POS_ONCE | BrainFlags::CUT_POA_ONCE);
    }

    pub fn get_goal(&self) -> Vec3 {
        self.core.goal
    }

    pub fn set_goal(&mut self, goal: Vec3) {
        self.core.goal = goal;
    }

    pub fn get_poa_goal(&self) -> Vec3 {
        self.core.poa_goal
    }

    pub fn set_poa_goal(&mut self, poa: Vec3) {
        self.core.poa_goal = poa;
    }

    pub fn get_offset(&self) -> Vec3 {
        self.core.offset
    }

    pub fn set_offset(&mut self, offset: Vec3) {
        self.core.offset = offset;
    }

    pub fn get_poa_offset(&self) -> Vec3 {
        self.core.poa_offset
    }

    pub fn set_poa_offset(&mut self, offset: Vec3) {
        self.core.poa_offset = offset;
    }

    pub fn get_subject(&self) -> Option<ObjectId> {
        self.core.subject
    }

    pub fn set_subject(&mut self, subject: Option<ObjectId>) {
        self.core.subject = subject;
        if let BrainKind::FirstPerson { pos_node, .. } = &mut self.kind {
            *pos_node = None;
        }
    }

    /// Pan limits as (horizontal, vertical), radians.
    pub fn get_pan_limits(&self) -> (f32, f32) {
        (self.core.x_pan_limit, self.core.z_pan_limit)
    }

    pub fn set_pan_limits(&mut self, x: f32, z: f32) {
        self.core.x_pan_limit = x;
        self.core.z_pan_limit = z;
    }

    pub fn set_accel(&mut self, accel: f32) {
        self.core.pos_limits.accel = accel;
    }

    pub fn set_decel(&mut self, decel: f32) {
        self.core.pos_limits.decel = decel;
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.core.pos_limits.velocity = velocity;
    }

    pub fn get_velocity(&self) -> f32 {
        self.core.pos_limits.velocity
    }

    /// Enable telescope zoom between `max` and `min` vertical FOV.
    pub fn set_zoom_params(&mut self, max: f32, min: f32, rate: f32) {
        self.core.zoom_max = max;
        self.core.zoom_min = min;
        self.core.zoom_rate = rate;
        self.core.flags.insert(BrainFlags::ZOOM_ENABLED);
    }

    pub fn set_fov_goal(&mut self, w: f32, h: f32, secs: f32, state: &mut CameraState) {
        self.core.set_fov_goal(w, h, secs, state);
    }

    /// Camera a fixed brain looks at when it has no subject.
    pub fn target_point(&self) -> Option<CameraId> {
        match &self.kind {
            BrainKind::Fixed { target_point } => *target_point,
            _ => None,
        }
    }

    pub fn set_target_point(&mut self, camera: Option<CameraId>) {
        if let BrainKind::Fixed { target_point } = &mut self.kind {
            *target_point = camera;
        }
    }

    /// Head node for first-person brains.
    pub fn set_position_node(&mut self, node: Option<ObjectId>) {
        if let BrainKind::FirstPerson { pos_node, .. } = &mut self.kind {
            *pos_node = node;
        }
    }

    pub fn is_faded(&self) -> bool {
        match &self.kind {
            BrainKind::Avatar(av) | BrainKind::FirstPerson { avatar: av, .. } => av.faded,
            _ => false,
        }
    }

    /// Adopt an existing fade. Returns `false` when this brain cannot fade.
    pub fn set_faded(&mut self, faded: bool) -> bool {
        match &mut self.kind {
            BrainKind::Avatar(av) | BrainKind::FirstPerson { avatar: av, .. } => {
                av.faded = faded;
                true
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Called when the camera becomes active.
    pub fn push(&mut self, recenter: bool, state: &mut CameraState, ctx: &mut BrainContext<'_>) {
        match &mut self.kind {
            BrainKind::Avatar(av) => {
                av.obscured = false;
                self.core.fall_timer = 0.0;
            }
            BrainKind::FirstPerson { avatar, .. } => {
                let Some(subject) = self.core.subject else {
                    return;
                };
                avatar.obscured = false;
                self.core.fall_timer = 0.0;
                ctx.events.push(CameraEvent::AvatarDrawable {
                    subject,
                    enabled: false,
                });
            }
            _ => {}
        }

        self.core.prime(recenter, ctx.events);
        self.update(state, ctx, 0.0, true);

        match &mut self.kind {
            BrainKind::FirstPerson { avatar, .. } => avatar.send_fade(&self.core, ctx, true),
            BrainKind::Drive(drive) => {
                drive.on_push();
                ctx.events.push(CameraEvent::RecenterMouse(true));
            }
            _ => {}
        }
    }

    /// Called when the camera stops being active.
    pub fn pop(&mut self, ctx: &mut BrainContext<'_>) {
        match &mut self.kind {
            BrainKind::Drive(_) => {
                ctx.events.push(CameraEvent::RecenterMouse(false));
                return;
            }
            BrainKind::Avatar(av) => {
                av.obscured = false;
                if av.faded {
                    av.send_fade(&self.core, ctx, false);
                }
            }
            BrainKind::FirstPerson { avatar, .. } => {
                if self.core.subject.is_some() {
                    avatar.send_fade(&self.core, ctx, false);
                }
            }
            _ => {}
        }
        self.core.movement.remove(ControlCode::FreeLook);
    }

    // ------------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------------

    /// Recompute goals and move the camera toward them.
    ///
    /// `forced` primes the pose with a long fixed step.
    pub fn update(&mut self, state: &mut CameraState, ctx: &mut BrainContext<'_>, dt: f32, forced: bool) {
        let secs = if forced { FORCED_STEP } else { dt };
        let core = &mut self.core;

        match &mut self.kind {
            BrainKind::Basic => {
                if let Some(target) = ctx.target {
                    core.goal = translation(&target);
                }
                match core.subject.and_then(|s| ctx.scene.local_to_world(s)) {
                    Some(subject) => core.poa_goal = translation(&subject) + core.poa_offset,
                    None => {
                        if let Some(target) = ctx.target {
                            core.poa_goal = core.goal - view_axis(&target) * 10.0;
                        }
                    }
                }
                core.adjust_for_input();
                core.finish_update(state, ctx, secs, dt);
            }
            BrainKind::Fixed { .. } => {
                if !core.has_flag(BrainFlags::IS_TRANSITION_CAMERA) {
                    update_fixed_goals(core, ctx);
                    core.adjust_for_input();
                }
                core.finish_update(state, ctx, secs, dt);
            }
            BrainKind::Avatar(av) => {
                update_avatar(core, av, None, false, state, ctx, secs, dt);
            }
            BrainKind::FirstPerson { avatar, pos_node } => {
                let head = pos_node
                    .and_then(|node| ctx.scene.local_to_world(node))
                    .map(|m| translation(&m));
                update_avatar(core, avatar, head, true, state, ctx, secs, dt);
            }
            BrainKind::Drive(drive) => drive.update(core, state, ctx, dt),
            BrainKind::Circle(circle) => circle.update(core, state, ctx, secs, dt),
        }
    }

    // ------------------------------------------------------------------------
    // Input and notifications
    // ------------------------------------------------------------------------

    pub fn handle_control(
        &mut self,
        code: ControlCode,
        activated: bool,
        state: &CameraState,
        events: &mut Vec<CameraEvent>,
    ) {
        self.core.handle_control(code, activated, state, events);
    }

    pub fn handle_command(&mut self, cmd: BrainCommand, state: &CameraState) {
        self.core.handle_command(cmd, state);
    }

    /// Mouse motion, in window-normalized units.
    pub fn handle_mouse(&mut self, dx: f32, dy: f32) {
        if let BrainKind::Drive(drive) = &mut self.kind {
            drive.handle_mouse(&mut self.core, dx, dy);
        }
    }

    /// Mouse wheel: avatar cameras move toward or away from the POA.
    pub fn handle_wheel(&mut self, delta: f32) {
        if !matches!(self.kind, BrainKind::Avatar(_)) || self.has_flag(BrainFlags::FALLING) {
            return;
        }
        self.core.offset_pct = (self.core.offset_pct - (delta / 24.0) * 0.01).clamp(0.1, 1.0);
    }

    /// Avatar fall notification.
    ///
    /// Returns `Some(false)` when the controller should clear its falling state.
    pub fn notify_fall(&mut self, falling: bool, now: f64, delay: f64) -> Option<bool> {
        if !self.kind.is_tracking() || !self.has_flag(BrainFlags::VERTICAL_WHEN_FALLING) {
            return None;
        }
        if falling {
            self.set_flags(BrainFlags::BEGIN_FALLING);
            self.core.fall_timer = now + delay;
            None
        } else if self.has_flag(BrainFlags::FALLING) {
            self.clear_flags(BrainFlags::FALLING);
            Some(false)
        } else {
            self.clear_flags(BrainFlags::BEGIN_FALLING);
            self.core.fall_timer = 0.0;
            None
        }
    }

    /// Avatar run notification.
    pub fn notify_running(&mut self, running: bool) {
        if !self.kind.is_tracking() {
            return;
        }
        let on = running && self.has_flag(BrainFlags::SPEED_UP_WHEN_RUNNING);
        self.core.flags.set(BrainFlags::RUNNING, on);
    }
}

fn update_fixed_goals(core: &mut BrainCore, ctx: &BrainContext<'_>) {
    let Some(target) = ctx.target else {
        return;
    };
    core.goal = translation(&target);

    match core.subject.and_then(|s| ctx.scene.local_to_world(s)) {
        Some(subject) => {
            let worldspace = core.has_flag(BrainFlags::WORLDSPACE_POA);
            core.poa_goal =
                core.subject_relative(translation(&subject), &subject, core.poa_offset, worldspace);
        }
        None => {
            core.poa_goal = ctx
                .target_point_goal
                .unwrap_or_else(|| core.goal - view_axis(&target) * 10.0);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn update_avatar(
    core: &mut BrainCore,
    av: &mut AvatarState,
    head: Option<Vec3>,
    first_person: bool,
    state: &mut CameraState,
    ctx: &mut BrainContext<'_>,
    secs: f32,
    dt: f32,
) {
    if core.has_flag(BrainFlags::BEGIN_FALLING) && ctx.now >= core.fall_timer {
        core.fall_timer = 0.0;
        core.flags.insert(BrainFlags::FALLING);
        core.flags.remove(BrainFlags::BEGIN_FALLING);
        ctx.requests.falling = Some(true);
        ctx.requests.start_unpan = true;
        core.offset_pct = 1.0;
    }

    // An unloaded subject keeps the last goals; the pose still integrates
    if !core.has_flag(BrainFlags::IS_TRANSITION_CAMERA)
        && let Some(subject_l2w) = core.subject.and_then(|s| ctx.scene.local_to_world(s))
    {
        av.calculate_position(core, &subject_l2w, head, first_person, state, ctx);
        core.adjust_for_input();
    }
    core.finish_update(state, ctx, secs, dt);
}

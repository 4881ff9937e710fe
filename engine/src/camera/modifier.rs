//! Camera Modifiers
//!
//! A [`CameraModifier`] is one authored (or built-in) camera: it binds a
//! brain to a target object and holds the camera's resolved pose and FOV.
//! The controller owns every modifier in an arena and refers to them by
//! [`CameraId`].
//!
//! While the local avatar rides a moving subworld (a platform, an elevator)
//! the modifier caches its pose in that subworld's frame, so the camera is
//! carried along with the platform between updates.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::brain::{BrainContext, CameraBrain};
use super::motion::SpeedLimits;
use crate::events::{AnimCommand, CameraEvent};
use crate::scene::ObjectId;

/// Default accel/decel/velocity for authored transitions.
pub const TRANS_DEFAULT_SPEED: f32 = 60.0;

/// Handle to a camera owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CameraId(pub u32);

/// Resolved pose and field of view of a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub pos: Vec3,
    /// Point of aim
    pub poa: Vec3,
    /// Horizontal FOV in degrees
    pub fov_w: f32,
    /// Vertical FOV in degrees
    pub fov_h: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            pos: Vec3::ZERO,
            poa: Vec3::ZERO,
            fov_w: 45.0,
            fov_h: 33.75,
        }
    }
}

/// Transition override used when this camera replaces another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CamTrans {
    /// Camera being replaced; `None` applies to any camera
    pub trans_to: Option<CameraId>,
    pub pos_limits: SpeedLimits,
    pub poa_limits: SpeedLimits,
    pub cut_pos: bool,
    pub cut_poa: bool,
    /// Refuse the push entirely
    pub ignore: bool,
}

impl CamTrans {
    pub fn new(trans_to: Option<CameraId>) -> Self {
        let speed = SpeedLimits::new(TRANS_DEFAULT_SPEED, TRANS_DEFAULT_SPEED, TRANS_DEFAULT_SPEED);
        Self {
            trans_to,
            pos_limits: speed,
            poa_limits: speed,
            cut_pos: false,
            cut_poa: false,
            ignore: false,
        }
    }

    /// Transition that snaps both position and POA.
    pub fn cut(trans_to: Option<CameraId>) -> Self {
        Self {
            cut_pos: true,
            cut_poa: true,
            ..Self::new(trans_to)
        }
    }
}

impl Default for CamTrans {
    fn default() -> Self {
        Self::new(None)
    }
}

/// FOV change fired when the camera's animation clock reaches `at`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FovInstruction {
    /// Seconds since the camera was pushed
    pub at: f32,
    pub fov_w: f32,
    pub fov_h: f32,
    /// Seconds to blend over; zero snaps
    #[serde(default)]
    pub duration: f32,
}

/// How pushing and popping drives the target object's animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimFlags {
    /// Target is animated; transitions to this camera always cut
    pub animated: bool,
    pub start_on_push: bool,
    pub stop_on_pop: bool,
    pub reset_on_pop: bool,
}

/// Pose expressed in a subworld's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SubworldCache {
    frame: ObjectId,
    pos: Vec3,
    poa: Vec3,
}

/// A camera's pose as handed from one camera to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub state: CameraState,
    subworld: Option<SubworldCache>,
}

/// One camera: a brain bound to a target object.
#[derive(Debug, Clone)]
pub struct CameraModifier {
    pub name: String,
    /// Object the camera sits on
    pub target: Option<ObjectId>,
    pub state: CameraState,
    pub brain: Option<CameraBrain>,
    pub transitions: Vec<CamTrans>,
    pub fov_instructions: Vec<FovInstruction>,
    pub anim: AnimFlags,
    anim_clock: f32,
    next_fov: usize,
    subworld: Option<SubworldCache>,
}

impl CameraModifier {
    pub fn new(name: impl Into<String>, target: Option<ObjectId>) -> Self {
        Self {
            name: name.into(),
            target,
            state: CameraState::default(),
            brain: None,
            transitions: Vec::new(),
            fov_instructions: Vec::new(),
            anim: AnimFlags::default(),
            anim_clock: 0.0,
            next_fov: 0,
            subworld: None,
        }
    }

    pub fn with_brain(mut self, brain: CameraBrain) -> Self {
        self.brain = Some(brain);
        self
    }

    pub fn with_fov(mut self, fov_w: f32, fov_h: f32) -> Self {
        self.state.fov_w = fov_w;
        self.state.fov_h = fov_h;
        self
    }

    pub fn brain(&self) -> Option<&CameraBrain> {
        self.brain.as_ref()
    }

    pub fn brain_mut(&mut self) -> Option<&mut CameraBrain> {
        self.brain.as_mut()
    }

    /// Replace the brain; the old one is dropped.
    pub fn set_brain(&mut self, brain: Option<CameraBrain>) {
        self.brain = brain;
    }

    pub fn is_animated(&self) -> bool {
        self.anim.animated
    }

    pub fn is_tracking(&self) -> bool {
        self.brain.as_ref().is_some_and(|b| b.kind.is_tracking())
    }

    pub fn is_first_person(&self) -> bool {
        self.brain.as_ref().is_some_and(|b| b.kind.is_first_person())
    }

    pub fn is_drive(&self) -> bool {
        self.brain.as_ref().is_some_and(|b| b.kind.is_drive())
    }

    pub fn is_faded(&self) -> bool {
        self.brain.as_ref().is_some_and(|b| b.is_faded())
    }

    /// Adopt an avatar fade. Returns whether this camera's brain can fade.
    pub fn set_faded(&mut self, faded: bool) -> bool {
        self.brain.as_mut().is_some_and(|b| b.set_faded(faded))
    }

    pub fn cut_once(&mut self) {
        if let Some(brain) = &mut self.brain {
            brain.cut_once();
        }
    }

    pub fn add_trans(&mut self, trans: CamTrans) {
        self.transitions.push(trans);
    }

    /// Transition to use when replacing `from`.
    ///
    /// An entry naming `from` wins; otherwise the last generic entry.
    pub fn find_trans(&self, from: CameraId) -> Option<&CamTrans> {
        self.transitions
            .iter()
            .find(|t| t.trans_to == Some(from))
            .or_else(|| self.transitions.iter().rev().find(|t| t.trans_to.is_none()))
    }

    /// Snapshot of the pose, FOV and subworld cache.
    pub fn pose(&self) -> CameraPose {
        CameraPose {
            state: self.state,
            subworld: self.subworld,
        }
    }

    /// Take over another camera's pose, FOV and subworld cache.
    pub fn set_pose(&mut self, pose: CameraPose) {
        self.state = pose.state;
        self.subworld = pose.subworld;
    }

    fn target_l2w(&self, ctx: &BrainContext<'_>) -> Option<Mat4> {
        self.target.and_then(|t| ctx.scene.local_to_world(t))
    }

    /// Run one update of this camera's brain.
    pub fn update(&mut self, ctx: &mut BrainContext<'_>, dt: f32, forced: bool) {
        if let Some(cache) = self.subworld
            && let Some(l2w) = ctx.scene.local_to_world(cache.frame)
        {
            self.state.pos = l2w.transform_point3(cache.pos);
            self.state.poa = l2w.transform_point3(cache.poa);
        }

        ctx.target = self.target_l2w(ctx);
        if let Some(brain) = &mut self.brain {
            brain.update(&mut self.state, ctx, dt, forced);
        }

        self.subworld = ctx.scene.avatar_subworld().and_then(|frame| {
            let w2l = ctx.scene.world_to_local(frame)?;
            Some(SubworldCache {
                frame,
                pos: w2l.transform_point3(self.state.pos),
                poa: w2l.transform_point3(self.state.poa),
            })
        });

        if !forced {
            self.run_fov_instructions(dt);
        }
    }

    fn run_fov_instructions(&mut self, dt: f32) {
        if self.next_fov >= self.fov_instructions.len() {
            return;
        }
        self.anim_clock += dt;
        while let Some(instr) = self.fov_instructions.get(self.next_fov) {
            if instr.at > self.anim_clock {
                break;
            }
            if let Some(brain) = &mut self.brain {
                log::debug!(
                    "camera '{}' fov instruction -> {}x{} over {}s",
                    self.name,
                    instr.fov_w,
                    instr.fov_h,
                    instr.duration
                );
                brain.set_fov_goal(instr.fov_w, instr.fov_h, instr.duration, &mut self.state);
            }
            self.next_fov += 1;
        }
    }

    /// The camera became active.
    pub fn push(&mut self, recenter: bool, ctx: &mut BrainContext<'_>) {
        self.anim_clock = 0.0;
        self.next_fov = 0;

        if self.anim.start_on_push
            && let Some(target) = self.target
        {
            ctx.events.push(CameraEvent::Animation {
                target,
                command: AnimCommand::Start,
            });
        }

        ctx.target = self.target_l2w(ctx);
        if let Some(brain) = &mut self.brain {
            brain.push(recenter, &mut self.state, ctx);
        }
    }

    /// The camera stopped being active.
    pub fn pop(&mut self, ctx: &mut BrainContext<'_>) {
        if let Some(target) = self.target {
            if self.anim.stop_on_pop {
                ctx.events.push(CameraEvent::Animation {
                    target,
                    command: AnimCommand::Stop,
                });
            }
            if self.anim.reset_on_pop {
                ctx.events.push(CameraEvent::Animation {
                    target,
                    command: AnimCommand::Reset,
                });
            }
        }
        if let Some(brain) = &mut self.brain {
            brain.pop(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::scene::SceneGraph;
    use crate::scene::SceneProvider;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_find_trans_prefers_named_entry() {
        let mut cam = CameraModifier::new("Cam", None);
        let generic_a = CamTrans::new(None);
        let mut generic_b = CamTrans::new(None);
        generic_b.cut_pos = true;
        let mut named = CamTrans::new(Some(CameraId(3)));
        named.ignore = true;
        cam.add_trans(generic_a);
        cam.add_trans(named);
        cam.add_trans(generic_b);

        assert!(cam.find_trans(CameraId(3)).is_some_and(|t| t.ignore));
        // Last generic wins for everything else
        assert!(cam.find_trans(CameraId(7)).is_some_and(|t| t.cut_pos));
        assert!(CameraModifier::new("Empty", None).find_trans(CameraId(0)).is_none());
    }

    #[test]
    fn test_cam_trans_defaults() {
        let t = CamTrans::default();
        assert_eq!(t.pos_limits.velocity, 60.0);
        assert_eq!(t.poa_limits.accel, 60.0);
        assert!(!t.cut_pos && !t.cut_poa && !t.ignore);
    }

    #[test]
    fn test_subworld_cache_carries_camera() {
        let mut scene = SceneGraph::new();
        let platform = scene.spawn("Platform", Mat4::IDENTITY);
        let avatar = scene.spawn_child(platform, "Avatar", Mat4::IDENTITY);
        scene.set_local_player(Some(avatar));
        let config = CameraConfig::default();
        let mut events = Vec::new();

        // Brainless camera: pose only changes through the subworld
        let mut cam = CameraModifier::new("Cam", None);
        cam.state.pos = Vec3::new(0.0, -10.0, 5.0);
        cam.state.poa = Vec3::new(0.0, 0.0, 5.0);
        {
            let mut ctx = BrainContext::new(&scene, &config, &mut events);
            cam.update(&mut ctx, 0.1, false);
        }

        scene.translate(platform, Vec3::new(100.0, 0.0, 0.0));
        {
            let mut ctx = BrainContext::new(&scene, &config, &mut events);
            cam.update(&mut ctx, 0.1, false);
        }
        assert!((cam.state.pos - Vec3::new(100.0, -10.0, 5.0)).length() < EPSILON);
        assert!((cam.state.poa - Vec3::new(100.0, 0.0, 5.0)).length() < EPSILON);

        // Leaving the subworld drops the cache
        scene.set_parent(avatar, None);
        scene.translate(platform, Vec3::new(100.0, 0.0, 0.0));
        {
            let mut ctx = BrainContext::new(&scene, &config, &mut events);
            cam.update(&mut ctx, 0.1, false);
            cam.update(&mut ctx, 0.1, false);
        }
        assert!(scene.avatar_subworld().is_none());
        assert!((cam.state.pos - Vec3::new(200.0, -10.0, 5.0)).length() < EPSILON);
    }

    #[test]
    fn test_fov_instructions_fire_in_order() {
        let scene = SceneGraph::new();
        let config = CameraConfig::default();
        let mut events = Vec::new();
        let mut ctx = BrainContext::new(&scene, &config, &mut events);

        let mut cam = CameraModifier::new("Cam", None).with_brain(CameraBrain::basic());
        cam.fov_instructions = vec![
            FovInstruction {
                at: 0.5,
                fov_w: 60.0,
                fov_h: 45.0,
                duration: 0.0,
            },
            FovInstruction {
                at: 1.0,
                fov_w: 30.0,
                fov_h: 22.5,
                duration: 0.0,
            },
        ];
        cam.push(false, &mut ctx);

        cam.update(&mut ctx, 0.25, false);
        assert_eq!(cam.state.fov_h, 33.75);
        cam.update(&mut ctx, 0.3, false);
        cam.update(&mut ctx, 0.01, false);
        assert!((cam.state.fov_h - 45.0).abs() < EPSILON);
        assert!((cam.state.fov_w - 60.0).abs() < EPSILON);
    }

    #[test]
    fn test_push_pop_animation_events() {
        let scene = SceneGraph::new();
        let config = CameraConfig::default();
        let mut events = Vec::new();
        let target = ObjectId(9);

        let mut cam = CameraModifier::new("Anim", Some(target));
        cam.anim = AnimFlags {
            animated: true,
            start_on_push: true,
            stop_on_pop: true,
            reset_on_pop: true,
        };
        {
            let mut ctx = BrainContext::new(&scene, &config, &mut events);
            cam.push(false, &mut ctx);
            cam.pop(&mut ctx);
        }
        assert_eq!(
            events,
            vec![
                CameraEvent::Animation {
                    target,
                    command: AnimCommand::Start
                },
                CameraEvent::Animation {
                    target,
                    command: AnimCommand::Stop
                },
                CameraEvent::Animation {
                    target,
                    command: AnimCommand::Reset
                },
            ]
        );
    }
}

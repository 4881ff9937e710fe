//! Virtual Camera Controller
//!
//! [`VirtualCamera`] decides which camera the player looks through. It owns
//! every [`CameraModifier`] in an arena and keeps a stack of them; the top of
//! the stack is the natural camera. Each frame the current camera is resolved
//! by precedence:
//!
//! 1. the drive camera, when it is the top of the stack
//! 2. a script (python) override
//! 3. the first-person override
//! 4. the transition camera, while a transition is following
//! 5. the top of the stack
//!
//! Commands are queued with [`VirtualCamera::queue`] and handled at the start
//! of the next [`VirtualCamera::update`], before any camera moves.
//!
//! ## Transitions
//!
//! Replacing the top of the stack either cuts or starts a transition. A
//! transition hosts a synthetic brain on the built-in transition camera which
//! chases the destination camera's pose, starting from the outgoing camera's
//! pose, until both position and POA arrive.
//!
//! ## Panning
//!
//! Mouse and pan controls move a normalized pan pair `(x, y)`, centred at
//! 0.5, which rotates the output view away from the camera's POA within the
//! active brain's pan limits.

mod commands;
mod output;
mod overrides;
mod pan;
mod stack;
mod transition;

pub use pan::PanState;

use super::brain::{BrainContext, BrainRequests, CameraBrain};
use super::flags::CameraFlags;
use super::modifier::{CameraId, CameraModifier};
use crate::command::{CameraCommand, CommandQueue};
use crate::config::{CameraConfig, SceneDesc};
use crate::error::{CameraError, Result};
use crate::events::CameraEvent;
use crate::input::ControlFlags;
use crate::pipeline::CameraOutput;
use crate::scene::SceneProvider;

use super::modifier::CamTrans;
use super::motion::SpeedLimits;

/// Handle of the built-in drive (free-fly) camera.
pub const DRIVE_CAMERA: CameraId = CameraId(0);

/// Handle of the built-in transition camera.
pub const TRANSITION_CAMERA: CameraId = CameraId(1);

/// Whether a transition is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionState {
    #[default]
    Off,
    /// The transition camera is chasing the destination camera
    Follow,
}

/// The camera controller.
pub struct VirtualCamera<S: SceneProvider> {
    scene: S,
    config: CameraConfig,
    cameras: Vec<Option<CameraModifier>>,
    stack: Vec<CameraId>,

    python: Option<CameraId>,
    first_person_override: Option<CameraId>,
    default_first_person: Option<CameraId>,
    third_person: Option<CameraId>,
    /// Camera a running transition started from
    prev: Option<CameraId>,
    trans_state: TransitionState,

    flags: CameraFlags,
    movement: ControlFlags,
    pan: PanState,

    /// Output FOV, width aspect-corrected
    fov_w: f32,
    fov_h: f32,
    aspect_ratio: f32,
    /// FOV last passed to `set_fov`, before aspect correction
    raw_fov: (f32, f32),
    freeze_counter: u32,
    fade_counter: u32,
    force_cut_once: bool,
    output: CameraOutput,

    commands: CommandQueue,
    events: Vec<CameraEvent>,
    clock: f64,
    frame_dt: f32,
}

impl<S: SceneProvider> VirtualCamera<S> {
    /// Create a controller with the drive camera on the stack.
    ///
    /// Output is off until [`set_render`](Self::set_render) enables it.
    pub fn new(scene: S, config: CameraConfig) -> Self {
        let drive = CameraModifier::new("DriveCamera", None)
            .with_brain(CameraBrain::drive(&config))
            .with_fov(config.fov_w, config.fov_h);
        let transition = CameraModifier::new("TransitionCamera", None).with_fov(config.fov_w, config.fov_h);

        let mut flags = CameraFlags::FIRST_PERSON_ENABLED;
        flags.set(CameraFlags::INVERT_MOUSE, config.invert_mouse);

        let mut cam = Self {
            scene,
            cameras: vec![Some(drive), Some(transition)],
            stack: Vec::new(),
            python: None,
            first_person_override: None,
            default_first_person: None,
            third_person: None,
            prev: None,
            trans_state: TransitionState::Off,
            flags,
            movement: ControlFlags::new(),
            pan: PanState::default(),
            fov_w: config.fov_w,
            fov_h: config.fov_h,
            aspect_ratio: config.aspect_ratio,
            raw_fov: (config.fov_w, config.fov_h),
            freeze_counter: 0,
            fade_counter: 0,
            force_cut_once: false,
            output: CameraOutput::default(),
            commands: CommandQueue::new(),
            events: Vec::new(),
            clock: 0.0,
            frame_dt: 0.0,
            config,
        };
        cam.output.pos = glam::Vec3::splat(100.0);
        cam.push_camera(DRIVE_CAMERA, false);
        cam.set_fov(cam.config.fov_w, cam.config.fov_h);
        cam
    }

    // ------------------------------------------------------------------------
    // Scene and configuration
    // ------------------------------------------------------------------------

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Mutable scene access, for hosts that move objects between updates.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Camera registry
    // ------------------------------------------------------------------------

    /// Hand a camera to the controller. It is not pushed.
    pub fn add_camera(&mut self, cam: CameraModifier) -> CameraId {
        let id = CameraId(self.cameras.len() as u32);
        log::debug!("registered camera '{}' as {:?}", cam.name, id);
        self.cameras.push(Some(cam));
        id
    }

    /// Remove a camera, detaching it from the stack and every override slot.
    pub fn remove_camera(&mut self, id: CameraId) -> Result<CameraModifier> {
        if id == DRIVE_CAMERA || id == TRANSITION_CAMERA {
            return Err(CameraError::BuiltIn(id));
        }
        let cam = self
            .cameras
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .ok_or(CameraError::UnknownCamera(id))?;

        let was_top = self.current_stack_camera() == Some(id);
        let was_dest = self.python.or(self.current_stack_camera()) == Some(id);
        self.stack.retain(|&c| c != id);
        if self.stack.is_empty() {
            self.stack.push(DRIVE_CAMERA);
        }
        for slot in [
            &mut self.python,
            &mut self.first_person_override,
            &mut self.default_first_person,
            &mut self.third_person,
            &mut self.prev,
        ] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        if was_dest && self.in_transition() {
            self.finish_transition();
        }
        // The camera underneath takes over without a blend
        if was_top && let Some(top) = self.current_stack_camera() {
            self.push_cam(top);
            self.cut_once(top);
            self.set_fov_from(top);
        }
        log::info!("removed camera '{}'", cam.name);
        Ok(cam)
    }

    /// Build and register every camera in `desc`.
    ///
    /// Names in transition tables and fixed-brain target points are resolved
    /// after all cameras are registered, so cameras may refer to each other.
    pub fn register_scene(&mut self, desc: &SceneDesc) -> Result<Vec<CameraId>> {
        desc.validate()?;

        let mut ids = Vec::with_capacity(desc.cameras.len());
        for cam_desc in &desc.cameras {
            let cam = {
                let scene = &self.scene;
                let find_object = |name: &str| scene.find_object(name);
                cam_desc.build(&self.config, &find_object)
            };
            ids.push(self.add_camera(cam));
        }

        for (cam_desc, &id) in desc.cameras.iter().zip(&ids) {
            let mut transitions = Vec::with_capacity(cam_desc.transitions.len());
            for t in &cam_desc.transitions {
                let trans_to = match &t.from {
                    Some(name) => Some(self.find_camera(name).ok_or_else(|| {
                        crate::error::ConfigError::UnknownReference {
                            camera: cam_desc.name.clone(),
                            name: name.clone(),
                        }
                    })?),
                    None => None,
                };
                transitions.push(CamTrans {
                    trans_to,
                    pos_limits: SpeedLimits::new(t.accel, t.decel, t.velocity),
                    poa_limits: SpeedLimits::new(t.poa_accel, t.poa_decel, t.poa_velocity),
                    cut_pos: t.cut_pos,
                    cut_poa: t.cut_poa,
                    ignore: t.ignore,
                });
            }

            let target_point = match &cam_desc.brain.kind {
                crate::config::BrainType::Fixed {
                    target_point: Some(name),
                } => self.find_camera(name),
                _ => None,
            };

            if let Some(cam) = self.camera_mut(id) {
                cam.transitions = transitions;
                if let Some(brain) = cam.brain_mut() {
                    brain.set_target_point(target_point);
                }
            }
        }

        log::info!("registered {} authored cameras", ids.len());
        Ok(ids)
    }

    pub fn camera(&self, id: CameraId) -> Option<&CameraModifier> {
        self.cameras.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn camera_mut(&mut self, id: CameraId) -> Option<&mut CameraModifier> {
        self.cameras.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Look a camera up by name (case-insensitive).
    pub fn find_camera(&self, name: &str) -> Option<CameraId> {
        self.cameras.iter().enumerate().find_map(|(i, cam)| {
            cam.as_ref()
                .filter(|c| c.name.eq_ignore_ascii_case(name))
                .map(|_| CameraId(i as u32))
        })
    }

    fn brain(&self, id: CameraId) -> Option<&CameraBrain> {
        self.camera(id).and_then(CameraModifier::brain)
    }

    fn brain_mut(&mut self, id: CameraId) -> Option<&mut CameraBrain> {
        self.camera_mut(id).and_then(CameraModifier::brain_mut)
    }

    fn contains(&self, id: CameraId) -> bool {
        self.camera(id).is_some()
    }

    // ------------------------------------------------------------------------
    // Commands and events
    // ------------------------------------------------------------------------

    /// Queue a command for the next update.
    pub fn queue(&mut self, cmd: CameraCommand) {
        self.commands.push(cmd);
    }

    /// Number of commands waiting for the next update.
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Take the events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<CameraEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[CameraEvent] {
        &self.events
    }

    // ------------------------------------------------------------------------
    // State queries
    // ------------------------------------------------------------------------

    /// The camera being rendered.
    pub fn current_camera(&self) -> Option<CameraId> {
        let top = self.current_stack_camera();
        if top == Some(DRIVE_CAMERA) {
            return top;
        }
        self.python
            .or(self.first_person_override)
            .or_else(|| self.in_transition().then_some(TRANSITION_CAMERA))
            .or(top)
    }

    /// Top of the camera stack.
    pub fn current_stack_camera(&self) -> Option<CameraId> {
        self.stack.last().copied()
    }

    /// Whether `id` is the camera whose brain moves under its speed limits.
    ///
    /// While a transition runs only the transition camera is current.
    pub fn is_current(&self, id: CameraId) -> bool {
        if self.in_transition() {
            id == TRANSITION_CAMERA
        } else {
            self.current_camera() == Some(id)
        }
    }

    /// True only while the first-person override is active.
    ///
    /// A first-person camera on top of the stack does not count.
    pub fn is_first_person_camera(&self) -> bool {
        if self.current_stack_camera() == Some(DRIVE_CAMERA) || self.python.is_some() {
            return false;
        }
        self.first_person_override.is_some()
    }

    pub fn in_transition(&self) -> bool {
        self.trans_state == TransitionState::Follow
    }

    pub fn transition_state(&self) -> TransitionState {
        self.trans_state
    }

    /// Stack entry at `index`, bottom first.
    pub fn camera_at(&self, index: usize) -> Option<CameraId> {
        self.stack.get(index).copied()
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn stack(&self) -> &[CameraId] {
        &self.stack
    }

    pub fn flags(&self) -> CameraFlags {
        self.flags
    }

    /// Controls currently held.
    pub fn movement(&self) -> ControlFlags {
        self.movement
    }

    pub fn pan(&self) -> &PanState {
        &self.pan
    }

    /// Last output pose.
    pub fn output(&self) -> &CameraOutput {
        &self.output
    }

    /// Output FOV as (width, height), degrees.
    pub fn fov(&self) -> (f32, f32) {
        (self.fov_w, self.fov_h)
    }

    pub fn python_override(&self) -> Option<CameraId> {
        self.python
    }

    pub fn first_person_override(&self) -> Option<CameraId> {
        self.first_person_override
    }

    /// Built-in first-person camera, once created.
    pub fn default_first_person(&self) -> Option<CameraId> {
        self.default_first_person
    }

    /// Built-in third-person camera, once created.
    pub fn third_person(&self) -> Option<CameraId> {
        self.third_person
    }

    /// Camera the last transition started from.
    pub fn previous_camera(&self) -> Option<CameraId> {
        self.prev
    }

    // ------------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------------

    /// Enable or disable output to the pipeline.
    pub fn set_render(&mut self, render: bool) {
        self.flags.set(CameraFlags::RENDER, render);
    }

    /// Cut the next stack change instead of blending. Enables output.
    pub fn set_cut_next_trans(&mut self) {
        self.flags.insert(CameraFlags::CUT_NEXT_TRANS);
        self.set_render(true);
    }

    /// Cut the current camera and the next stack change. Enables output.
    pub fn set_cut_next(&mut self) {
        if let Some(cur) = self.current_camera()
            && let Some(cam) = self.camera_mut(cur)
        {
            cam.cut_once();
        }
        self.set_cut_next_trans();
    }

    /// Ignore (or stop ignoring) camera region triggers.
    pub fn set_region_ignore(&mut self, ignore: bool) {
        self.flags.set(CameraFlags::REGION_IGNORE, ignore);
    }

    // ------------------------------------------------------------------------
    // Running cameras
    // ------------------------------------------------------------------------

    /// Run `f` against one camera with a brain context describing its role.
    fn run_camera<R>(
        &mut self,
        id: CameraId,
        f: impl FnOnce(&mut CameraModifier, &mut BrainContext<'_>) -> R,
    ) -> Option<R> {
        let is_current = self.is_current(id);
        let is_stack_top = self.current_stack_camera() == Some(id);
        let target_point_goal = self
            .brain(id)
            .and_then(CameraBrain::target_point)
            .and_then(|tp| self.brain(tp))
            .map(CameraBrain::get_goal);

        let cam = self.cameras.get_mut(id.0 as usize)?.as_mut()?;
        let mut ctx = BrainContext::new(&self.scene, &self.config, &mut self.events);
        ctx.is_current = is_current;
        ctx.is_stack_top = is_stack_top;
        ctx.target_point_goal = target_point_goal;
        ctx.now = self.clock;

        let result = f(cam, &mut ctx);
        let requests = ctx.requests;
        self.apply_requests(requests);
        Some(result)
    }

    fn apply_requests(&mut self, requests: BrainRequests) {
        if let Some(falling) = requests.falling {
            self.flags.set(CameraFlags::FALLING, falling);
        }
        if requests.start_unpan {
            self.start_unpan();
        }
    }

    fn push_cam(&mut self, id: CameraId) {
        let recenter = !self.flags.contains(CameraFlags::AVATAR_WALKING);
        self.run_camera(id, |cam, ctx| cam.push(recenter, ctx));
    }

    fn pop_cam(&mut self, id: CameraId) {
        self.run_camera(id, |cam, ctx| cam.pop(ctx));
    }

    fn update_cam(&mut self, id: CameraId) {
        let dt = self.frame_dt;
        self.run_camera(id, |cam, ctx| cam.update(ctx, dt, false));
    }

    fn cut_once(&mut self, id: CameraId) {
        if let Some(cam) = self.camera_mut(id) {
            cam.cut_once();
        }
    }

    /// Hold the output pose for `frames` updates.
    fn freeze_output(&mut self, frames: u32) {
        self.freeze_counter = frames;
    }

    /// Re-enable the avatar drawable after `frames` updates.
    fn unfade_avatar_in(&mut self, frames: u32) {
        self.fade_counter = frames;
    }

    fn emit(&mut self, event: CameraEvent) {
        self.events.push(event);
    }
}

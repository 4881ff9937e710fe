//! Camera stack: push, pop, reset and the built-in cameras.

use glam::Vec3;

use super::{DRIVE_CAMERA, VirtualCamera};
use crate::camera::brain::{BrainKind, CameraBrain};
use crate::camera::flags::{BrainFlags, CameraFlags};
use crate::camera::modifier::{CamTrans, CameraId, CameraModifier};
use crate::events::CameraEvent;
use crate::input::ControlCode;
use crate::scene::{ObjectId, SceneProvider};

/// FOV of the built-in cameras, degrees.
const BUILT_IN_FOV_W: f32 = 90.0;
const BUILT_IN_FOV_H: f32 = 66.7;

/// Child of the avatar the built-in first-person camera sits on.
const FIRST_PERSON_ORIGIN: &str = "FPCameraOrigin";

impl<S: SceneProvider> VirtualCamera<S> {
    fn add_camera_to_stack(&mut self, id: CameraId) {
        self.stack.push(id);
        if self.movement.contains(ControlCode::WalkPan)
            && let Some(brain) = self.brain_mut(id)
        {
            brain.core.movement.insert(ControlCode::WalkPan);
        }
    }

    /// Stock transition between two cameras with no authored override:
    /// blend when either tracks an avatar, otherwise cut.
    fn stock_trans(&self, dest: CameraId, other: CameraId) -> CamTrans {
        let tracking = |id| self.camera(id).is_some_and(CameraModifier::is_tracking);
        if tracking(dest) || tracking(other) {
            CamTrans::new(Some(dest))
        } else {
            CamTrans::cut(Some(dest))
        }
    }

    /// Make `id` the top of the stack.
    ///
    /// `as_default` replaces the whole stack with it.
    pub fn push_camera(&mut self, id: CameraId, as_default: bool) {
        let Some(incoming) = self.camera(id) else {
            log::warn!("push of unknown camera {id:?}");
            return;
        };
        if incoming.brain().is_none() {
            log::warn!("camera '{}' has no brain, push ignored", incoming.name);
            return;
        }

        let top = self.current_stack_camera();
        if top == Some(id) {
            log::debug!("camera '{}' pushed again", incoming.name);
            self.add_camera_to_stack(id);
            return;
        }

        let trans = top.and_then(|t| incoming.find_trans(t)).copied();
        if trans.is_some_and(|t| t.ignore) {
            log::debug!("camera '{}' ignores the current camera, push refused", incoming.name);
            return;
        }

        if self.current_stack_camera() == Some(DRIVE_CAMERA) {
            self.pop_camera(DRIVE_CAMERA);
        }

        let top = self.current_stack_camera();
        let is_drive = self.camera(id).is_some_and(CameraModifier::is_drive);
        let Some(top) = top.filter(|_| !is_drive) else {
            if let Some(top) = top {
                self.pop_cam(top);
            }
            self.push_cam(id);
            self.add_camera_to_stack(id);
            return;
        };

        if let Some(name) = self.camera(id).map(|c| c.name.clone()) {
            log::info!("pushing camera '{name}'");
        }

        let free_look = self
            .brain(top)
            .is_some_and(|b| b.core.movement.contains(ControlCode::FreeLook));
        if free_look && let Some(brain) = self.brain_mut(id) {
            brain.core.movement.insert(ControlCode::FreeLook);
        }

        let top_faded = self.camera(top).is_some_and(CameraModifier::is_faded);
        if top_faded && self.first_person_override.is_none() {
            let adopted = self.camera_mut(id).is_some_and(|c| c.set_faded(true));
            if !adopted && let Some(subject) = self.brain(top).and_then(CameraBrain::get_subject) {
                self.emit(CameraEvent::AvatarFade {
                    subject,
                    fade_out: false,
                });
            }
        } else if Some(top) == self.default_first_person
            || self.camera(top).is_some_and(CameraModifier::is_first_person)
        {
            self.freeze_output(2);
            self.unfade_avatar_in(1);
        }
        self.pop_cam(top);
        self.push_cam(id);

        if self.flags.contains(CameraFlags::CUT_NEXT_TRANS) {
            if self.in_transition() {
                self.finish_transition();
            }
            if Some(id) != self.default_first_person {
                self.flags.remove(CameraFlags::CUT_NEXT_TRANS);
            }
            self.add_camera_to_stack(id);
            self.cut_once(id);
            self.start_interp_pan_limits();
        } else if self.python.is_none() {
            self.prev = Some(top);
            self.add_camera_to_stack(id);
            let trans = trans.unwrap_or_else(|| self.stock_trans(id, top));
            self.start_transition(trans);
        } else {
            self.add_camera_to_stack(id);
        }

        if as_default {
            self.stack.clear();
            self.add_camera_to_stack(id);
        }
        if let Some(top) = self.current_stack_camera() {
            self.set_fov_from(top);
        }
    }

    /// Remove `id` from the stack. The last entry is never popped.
    pub fn pop_camera(&mut self, id: CameraId) {
        if self.stack.len() <= 1 {
            log::debug!("pop refused, stack would be empty");
            return;
        }
        // Popping one of several stacked copies of the top changes nothing
        if self.current_stack_camera() == Some(id) && self.stack.iter().rev().nth(1) == Some(&id) {
            self.stack.pop();
            return;
        }
        let free_look = self
            .brain(id)
            .is_some_and(|b| b.core.movement.contains(ControlCode::FreeLook));

        self.pop_cam(id);
        if self.camera(id).is_some_and(CameraModifier::is_first_person) {
            self.freeze_output(2);
            self.unfade_avatar_in(1);
        } else if self.camera(id).is_some_and(CameraModifier::is_drive) {
            match self.stack.iter().rposition(|&c| c == id) {
                Some(pos) => {
                    self.stack.remove(pos);
                }
                None => {
                    self.stack.pop();
                }
            }
            if let Some(top) = self.current_stack_camera() {
                self.push_cam(top);
            }
            return;
        }

        if self.current_stack_camera() == Some(id) {
            if let Some(name) = self.camera(id).map(|c| c.name.clone()) {
                log::info!("popping camera '{name}'");
            }
            self.stack.pop();
            if let Some(top) = self.current_stack_camera() {
                self.push_cam(top);
                if free_look && let Some(brain) = self.brain_mut(top) {
                    brain.core.movement.insert(ControlCode::FreeLook);
                }

                if self.camera(id).is_some_and(CameraModifier::is_faded) {
                    let adopted = self.camera_mut(top).is_some_and(|c| c.set_faded(true));
                    if !adopted && let Some(subject) = self.brain(id).and_then(CameraBrain::get_subject) {
                        self.emit(CameraEvent::AvatarFade {
                            subject,
                            fade_out: false,
                        });
                    }
                }

                let trans = self.camera(top).and_then(|c| c.find_trans(id)).copied();
                self.prev = Some(id);
                let trans = trans.unwrap_or_else(|| self.stock_trans(top, id));
                self.start_transition(trans);
            }
        } else if let Some(pos) = self.stack.iter().position(|&c| c == id) {
            log::info!("popping background camera {id:?}");
            self.stack.remove(pos);
        }

        if !self.in_transition()
            && let Some(top) = self.current_stack_camera()
        {
            self.set_fov_from(top);
        }
    }

    /// Empty the stack, then push the built-in first-person camera if it
    /// exists.
    pub fn clear_stack(&mut self) {
        self.stack.clear();
        if let Some(fp) = self.default_first_person {
            self.push_camera(fp, false);
        }
    }

    /// Back to the drive camera, with the built-in cameras pushed over it.
    pub fn reset(&mut self, render: bool) {
        log::info!("resetting camera stack");
        self.python = None;
        self.first_person_override = None;
        self.stack.clear();
        self.stack.push(DRIVE_CAMERA);
        if let Some(fp) = self.default_first_person {
            self.push_camera(fp, false);
        }
        if let Some(third) = self.third_person {
            self.push_camera(third, false);
        }
        self.set_render(render);

        self.pan.recentre();
        self.pan.retained_y = 0.5;
        for flag in [
            CameraFlags::AVATAR_WALKING,
            CameraFlags::UNPAN,
            CameraFlags::INTERP_PAN_LIMITS,
            CameraFlags::RESPONDER_FORCED_3RD,
            CameraFlags::SCRIPTS_DISABLED_1ST,
            CameraFlags::FALLING,
            CameraFlags::FIRST_PERSON_ENABLED,
        ] {
            self.flags.remove(flag);
        }
    }

    /// Clear the stack and cut to the built-in third-person camera, or fall
    /// back to first person when there is none.
    pub fn push_third_person(&mut self) {
        match self.third_person {
            Some(third) => {
                self.clear_stack();
                self.set_cut_next_trans();
                self.push_camera(third, false);
            }
            None => {
                log::warn!("no third-person camera, forcing first person");
                self.toggle_first_person();
            }
        }
    }

    /// Restore a saved stack entry without a transition.
    ///
    /// A lone built-in first-person camera is replaced. Unknown cameras fall
    /// back to third person.
    pub fn rebuild_stack(&mut self, id: Option<CameraId>) {
        if self.in_transition() {
            self.finish_transition();
        }
        if self.stack.len() == 1 && self.stack.first() == self.default_first_person.as_ref() {
            self.stack.clear();
        }
        match id.filter(|&id| self.contains(id)) {
            Some(id) => self.add_camera_to_stack(id),
            None => self.push_third_person(),
        }
        if !self.flags.contains(CameraFlags::FIRST_PERSON_AT_LINK_OUT)
            && let Some(subject) = self.scene.local_player()
        {
            self.emit(CameraEvent::AvatarDrawable {
                subject,
                enabled: true,
            });
        }
        self.force_cut_once = true;
    }

    /// [`rebuild_stack`](Self::rebuild_stack) by camera name. Returns whether
    /// a camera with that name is registered.
    pub fn restore_from_name(&mut self, name: &str) -> bool {
        match self.find_camera(name) {
            Some(id) => {
                self.rebuild_stack(Some(id));
                true
            }
            None => false,
        }
    }

    /// Toggle the drive camera, starting it from the current pose.
    pub fn toggle_drive(&mut self) {
        if self.current_camera() == Some(DRIVE_CAMERA) {
            log::info!("drive mode off");
            self.pop_camera(DRIVE_CAMERA);
            return;
        }

        let state = self.current_camera().and_then(|id| self.camera(id)).map(|c| c.state);
        if let Some(state) = state
            && let Some(drive) = self.camera_mut(DRIVE_CAMERA)
        {
            drive.state.pos = state.pos;
            drive.state.poa = state.poa;
            if let Some(brain) = drive.brain_mut() {
                brain.set_goal(state.pos);
                brain.set_poa_goal(state.poa);
            }
        }
        log::info!("drive mode on");
        self.push_camera(DRIVE_CAMERA, false);
    }

    /// Create the built-in first- and third-person cameras for `subject`, or
    /// retarget them when they already exist.
    pub fn create_default_camera(&mut self, subject: ObjectId) {
        match self.default_first_person {
            Some(fp) => {
                if self.brain(fp).and_then(CameraBrain::get_subject) == Some(subject) {
                    return;
                }
                self.retarget_first_person(fp, subject);
            }
            None => {
                let mut brain = CameraBrain::first_person();
                brain.set_offset(Vec3::new(0.0, 0.0, 5.5));
                brain.set_poa_offset(Vec3::new(0.0, -10.0, 5.5));
                let limit = self.config.first_person_pan_limit;
                brain.set_pan_limits(limit, limit);
                brain.set_flags(BrainFlags::CUT_POA | BrainFlags::CUT_POS);
                let cam = CameraModifier::new("DefaultFirstPersonCamera", None)
                    .with_brain(brain)
                    .with_fov(BUILT_IN_FOV_W, BUILT_IN_FOV_H);
                let fp = self.add_camera(cam);
                self.default_first_person = Some(fp);
                self.retarget_first_person(fp, subject);
                log::info!("created built-in first-person camera");
                self.push_camera(fp, false);
            }
        }

        match self.third_person {
            Some(third) => {
                if self.brain(third).and_then(CameraBrain::get_subject) == Some(subject) {
                    return;
                }
                if let Some(brain) = self.brain_mut(third) {
                    brain.set_subject(Some(subject));
                }
            }
            None => {
                let mut brain = CameraBrain::avatar();
                brain.set_subject(Some(subject));
                brain.set_offset(Vec3::new(0.0, 15.0, 10.0));
                brain.set_poa_offset(Vec3::new(0.0, 0.0, 5.5));
                let limit = self.config.first_person_pan_limit;
                brain.set_pan_limits(limit, limit);
                brain.set_velocity(20.0);
                brain.set_decel(10.0);
                brain.set_accel(5.0);
                brain.set_flags(BrainFlags::CUT_POA | BrainFlags::MAINTAIN_LOS);
                let cam = CameraModifier::new("BuiltIn3rdPersonCamera", None)
                    .with_brain(brain)
                    .with_fov(BUILT_IN_FOV_W, BUILT_IN_FOV_H);
                let third = self.add_camera(cam);
                log::info!("created built-in third-person camera");
                self.push_camera(third, false);
                self.third_person = Some(third);
            }
        }
    }

    /// Point the built-in first-person camera at `subject`, locking it to the
    /// avatar's head node when there is one.
    fn retarget_first_person(&mut self, fp: CameraId, subject: ObjectId) {
        let head = self.scene.find_child(subject, FIRST_PERSON_ORIGIN);
        let Some(brain) = self.brain_mut(fp) else {
            return;
        };
        brain.set_subject(Some(subject));
        if let Some(head) = head {
            brain.set_position_node(Some(head));
            brain.set_offset(Vec3::ZERO);
            brain.set_poa_offset(Vec3::new(0.0, -10.0, 0.0));
        }
    }

    /// Set the current avatar camera's offset.
    pub fn set_offset(&mut self, offset: Vec3) {
        let Some(cur) = self.current_camera() else {
            return;
        };
        if let Some(brain) = self.brain_mut(cur)
            && matches!(brain.kind, BrainKind::Avatar(_))
        {
            brain.set_offset(offset);
        }
    }
}

//! Command dispatch: input, regions, scripts and avatar notifications.

use super::{DRIVE_CAMERA, VirtualCamera};
use crate::camera::brain::BrainCommand;
use crate::camera::flags::CameraFlags;
use crate::camera::modifier::CameraId;
use crate::command::{AvatarBehavior, CameraCommand};
use crate::error::{CameraError, Result};
use crate::input::ControlCode;
use crate::scene::SceneProvider;

/// Mouse deltas at or beyond this size are jumps, not panning.
const MOUSE_PAN_JUMP: f32 = 0.4;

impl<S: SceneProvider> VirtualCamera<S> {
    /// Handle one command immediately. [`queue`](Self::queue) defers it to
    /// the next update instead.
    pub fn handle_command(&mut self, cmd: CameraCommand) {
        log::trace!("camera command {cmd:?}");
        match cmd {
            CameraCommand::Control { code, activated } => self.handle_control(code, activated),
            CameraCommand::MouseDelta { dx, dy } => self.handle_mouse(dx, dy),
            CameraCommand::MouseWheel(delta) => {
                if let Some(current) = self.current_camera()
                    && let Some(brain) = self.brain_mut(current)
                {
                    brain.handle_wheel(delta);
                }
            }
            CameraCommand::Region {
                camera,
                entering,
                as_default,
                cut,
                triggerer,
            } => {
                if self.flags.contains(CameraFlags::REGION_IGNORE) || !self.accepts_triggerer(triggerer) {
                    return;
                }
                if entering {
                    self.push_camera(camera, as_default);
                } else {
                    self.pop_camera(camera);
                }
                if cut {
                    self.flags.insert(CameraFlags::CUT_NEXT_TRANS);
                }
            }
            CameraCommand::PythonOverridePush { camera, cut, triggerer } => {
                if self.accepts_triggerer(triggerer) {
                    self.push_python_override(camera, cut);
                }
            }
            CameraCommand::PythonOverridePop { triggerer } => {
                if self.accepts_triggerer(triggerer) {
                    self.pop_python_override();
                }
            }
            CameraCommand::PythonFirstPersonEnable(enable) => self.python_first_person_enable(enable),
            CameraCommand::PythonUndoFirstPerson => self.python_undo_first_person(),
            CameraCommand::ResponderSetThirdPerson => self.responder_set_third_person(),
            CameraCommand::ResponderUndoThirdPerson => self.responder_undo_third_person(),
            CameraCommand::Behavior(behavior) => self.handle_behavior(behavior),
            CameraCommand::Warp => self.set_cut_next_trans(),
            CameraCommand::ResetPanning => {
                self.pan.recentre();
                self.pan.retained_y = 0.5;
            }
            CameraCommand::ResetOnEnter => self.reset(false),
            CameraCommand::ResetOnExit => {
                self.flags.insert(CameraFlags::CUT_NEXT_TRANS);
                self.reset(false);
            }
            CameraCommand::CreateDefaultCamera { subject } => {
                if self.scene.local_player() == Some(subject) {
                    self.create_default_camera(subject);
                } else {
                    log::debug!("default cameras are only built for the local player");
                }
            }
            CameraCommand::RefreshFov { width, height } => self.refresh(width, height),
            CameraCommand::SetCutNext => self.set_cut_next(),
            CameraCommand::ToggleDrive => self.toggle_drive(),
            CameraCommand::CameraDestroyed(id) => {
                if let Err(e) = self.remove_camera(id) {
                    log::warn!("camera destroyed: {e}");
                }
            }
            CameraCommand::Brain { camera, command } => {
                if let Err(e) = self.brain_command(camera, command) {
                    log::warn!("brain command {command:?}: {e}");
                }
            }
        }
    }

    /// Send a command straight to one camera's brain.
    pub fn brain_command(&mut self, camera: CameraId, command: BrainCommand) -> Result<()> {
        let cam = self.camera_mut(camera).ok_or(CameraError::UnknownCamera(camera))?;
        let state = cam.state;
        let brain = cam.brain_mut().ok_or(CameraError::NoBrain(camera))?;
        brain.handle_command(command, &state);
        Ok(())
    }

    fn handle_control(&mut self, code: ControlCode, activated: bool) {
        self.movement.set(code, activated);

        if code == ControlCode::FreeLook && activated {
            self.flags.remove(CameraFlags::UNPAN);
        }
        if code.is_avatar_steering() && !self.movement.contains(ControlCode::FreeLook) {
            self.start_unpan();
        }

        match code {
            ControlCode::MoveForward | ControlCode::MoveBackward => {
                self.flags.set(CameraFlags::AVATAR_WALKING, activated);
            }
            ControlCode::FirstPersonToggle if activated => {
                if self.flags.contains(CameraFlags::FIRST_PERSON_ENABLED) {
                    let selected = self.flags.contains(CameraFlags::FIRST_PERSON_USER_SELECTED);
                    self.flags.set(CameraFlags::FIRST_PERSON_USER_SELECTED, !selected);
                }
                self.toggle_first_person();
                return;
            }
            ControlCode::Recenter if activated => {
                self.pan.recentre();
                self.pan.retained_y = 0.5;
            }
            _ => {}
        }

        if code == ControlCode::ToggleDriveMode && activated {
            self.toggle_drive();
            return;
        }

        if let Some(over) = self.python.or(self.first_person_override) {
            self.control_brain(over, code, activated);
        }
        if let Some(top) = self.current_stack_camera() {
            self.control_brain(top, code, activated);
        }
    }

    fn control_brain(&mut self, id: CameraId, code: ControlCode, activated: bool) {
        let Some(cam) = self.cameras.get_mut(id.0 as usize).and_then(Option::as_mut) else {
            return;
        };
        let state = cam.state;
        if let Some(brain) = cam.brain.as_mut() {
            brain.handle_control(code, activated, &state, &mut self.events);
        }
    }

    fn handle_mouse(&mut self, dx: f32, dy: f32) {
        if !self.flags.contains(CameraFlags::FALLING) {
            let sign = if self.flags.contains(CameraFlags::INVERT_MOUSE) {
                -1.0
            } else {
                1.0
            };
            if self.movement.contains(ControlCode::FreeLook) {
                if dx.abs() < MOUSE_PAN_JUMP {
                    self.pan.x -= dx * sign;
                }
                if dy.abs() < MOUSE_PAN_JUMP {
                    self.pan.y -= dy * sign;
                }
            }
            let walk_pan = self.first_person_override.is_some() || self.config.walk_pan_3rd_person;
            if self.movement.contains(ControlCode::WalkPan) && walk_pan && dy.abs() < MOUSE_PAN_JUMP {
                self.pan.y -= dy * sign;
            }
        }

        if let Some(drive) = self.brain_mut(DRIVE_CAMERA) {
            drive.handle_mouse(dx, dy);
        }
    }

    /// Cameras that hear avatar notifications: every stack entry and the
    /// overrides, once each.
    fn listening_cameras(&self) -> Vec<CameraId> {
        let mut ids: Vec<CameraId> = self
            .stack
            .iter()
            .copied()
            .chain(self.python)
            .chain(self.first_person_override)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    fn handle_behavior(&mut self, behavior: AvatarBehavior) {
        match behavior {
            AvatarBehavior::LinkIn => self.link_in(),
            AvatarBehavior::LinkOut => self.link_out(),
            AvatarBehavior::Fall(falling) => {
                let now = self.clock;
                let delay = f64::from(self.config.fall_timer_delay);
                for id in self.listening_cameras() {
                    let cleared = self
                        .brain_mut(id)
                        .and_then(|b| b.notify_fall(falling, now, delay));
                    if cleared == Some(false) {
                        self.flags.remove(CameraFlags::FALLING);
                    }
                }
            }
            AvatarBehavior::Run(running) => {
                for id in self.listening_cameras() {
                    if let Some(brain) = self.brain_mut(id) {
                        brain.notify_running(running);
                    }
                }
            }
        }
    }
}

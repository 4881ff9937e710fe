//! Script (python) and first-person overrides, and the rules that let
//! scripts, responders and linking force the player between first and third
//! person.

use super::{TransitionState, VirtualCamera};
use crate::camera::flags::CameraFlags;
use crate::camera::modifier::{CamTrans, CameraId};
use crate::events::CameraEvent;
use crate::scene::{ObjectId, SceneProvider};

impl<S: SceneProvider> VirtualCamera<S> {
    /// Region and script triggers only count for the local avatar.
    pub(super) fn accepts_triggerer(&self, triggerer: Option<ObjectId>) -> bool {
        triggerer.is_none_or(|t| self.scene.local_player() == Some(t))
    }

    /// Switch between the first-person override and the stack.
    ///
    /// Does nothing while output is off.
    pub fn toggle_first_person(&mut self) {
        if !self.flags.contains(CameraFlags::RENDER) {
            return;
        }
        let top = self.current_stack_camera();

        if let Some(first_person) = self.first_person_override {
            self.pop_cam(first_person);
            if let Some(top) = top {
                self.push_cam(top);
                self.cut_once(top);
            }
            self.first_person_override = None;
            if let Some(top) = top {
                self.set_fov_from(top);
                self.push_cam(top);
            }
            self.emit(CameraEvent::ThirdPersonInput(true));
            self.freeze_output(2);
            self.unfade_avatar_in(1);
            self.pan.retained_y = self.pan.y;
            self.pan.recentre();
            log::info!("left first person");
            return;
        }

        if !self.flags.contains(CameraFlags::FIRST_PERSON_ENABLED) {
            log::debug!("first person is disabled");
            return;
        }
        let Some(first_person) = self.default_first_person else {
            return;
        };
        self.first_person_override = Some(first_person);
        if let Some(top) = top {
            self.pop_cam(top);
        }
        self.push_cam(first_person);
        self.set_fov_from(first_person);
        self.emit(CameraEvent::ThirdPersonInput(false));
        if self.trans_state == TransitionState::Follow {
            self.finish_transition();
        }
        self.pan.y = self.pan.retained_y;
        log::info!("entered first person");
    }

    /// A script takes over the camera.
    pub(super) fn push_python_override(&mut self, camera: CameraId, cut: bool) {
        if !self.contains(camera) {
            log::warn!("script override with unknown camera {camera:?}");
            return;
        }
        let previous = self.current_camera();

        if let Some(old) = self.python {
            self.pop_cam(old);
            if self.camera(old).is_some_and(|c| c.is_first_person()) {
                self.freeze_output(2);
                self.unfade_avatar_in(1);
            }
        }

        self.python = Some(camera);
        if self.first_person_override.is_some() {
            self.emit(CameraEvent::ThirdPersonInput(true));
        }
        self.push_cam(camera);
        self.prev = previous.filter(|&p| p != camera);

        let trans = if cut {
            CamTrans::cut(Some(camera))
        } else {
            CamTrans::new(Some(camera))
        };
        self.start_transition(trans);
        self.set_fov_from(camera);
        self.flags.remove(CameraFlags::FIRST_PERSON_ENABLED);
        log::info!("script camera {camera:?} pushed");
    }

    /// A script releases the camera.
    pub(super) fn pop_python_override(&mut self) {
        if let Some(python) = self.python {
            self.pop_cam(python);
            self.finish_transition();
            if self.first_person_override.is_none() && self.camera(python).is_some_and(|c| c.is_first_person()) {
                self.freeze_output(2);
                self.unfade_avatar_in(1);
            }
            if let Some(top) = self.current_stack_camera() {
                self.cut_once(top);
            }
            self.pan.recentre();
            log::info!("script camera {python:?} popped");
        }
        self.python = None;
        self.flags.insert(CameraFlags::FIRST_PERSON_ENABLED);

        let resume = self.first_person_override.or(self.current_stack_camera());
        if let Some(resume) = resume {
            self.set_fov_from(resume);
            self.push_cam(resume);
        }
        self.start_interp_pan_limits();
        if self.first_person_override.is_some() {
            self.emit(CameraEvent::ThirdPersonInput(false));
        }
    }

    pub(super) fn python_first_person_enable(&mut self, enable: bool) {
        if enable {
            self.flags.insert(CameraFlags::FIRST_PERSON_ENABLED);
            self.flags.remove(CameraFlags::SCRIPTS_DISABLED_1ST);
            if self.flags.contains(CameraFlags::SCRIPTS_FORCED_3RD) {
                self.flags.remove(CameraFlags::SCRIPTS_FORCED_3RD);
                self.toggle_first_person();
            }
        } else {
            self.flags.remove(CameraFlags::FIRST_PERSON_ENABLED);
            self.flags.insert(CameraFlags::SCRIPTS_DISABLED_1ST);
        }
    }

    pub(super) fn python_undo_first_person(&mut self) {
        if self.flags.contains(CameraFlags::FIRST_PERSON_AT_LINK_OUT) {
            self.flags.insert(CameraFlags::SCRIPTS_FORCED_3RD);
        } else if self.first_person_override.is_some() {
            self.flags.insert(CameraFlags::SCRIPTS_FORCED_3RD);
            self.toggle_first_person();
            if let Some(top) = self.current_stack_camera() {
                self.set_fov_from(top);
            }
        }
    }

    pub(super) fn responder_set_third_person(&mut self) {
        if self.config.stay_in_first_person_forever || self.flags.contains(CameraFlags::SCRIPTS_FORCED_3RD) {
            return;
        }
        if self.first_person_override.is_some() {
            self.flags.insert(CameraFlags::RESPONDER_FORCED_3RD);
            self.toggle_first_person();
            if let Some(top) = self.current_stack_camera() {
                self.set_fov_from(top);
            }
        }
        self.flags.remove(CameraFlags::FIRST_PERSON_ENABLED);
    }

    pub(super) fn responder_undo_third_person(&mut self) {
        if self
            .flags
            .intersects(CameraFlags::SCRIPTS_FORCED_3RD | CameraFlags::SCRIPTS_DISABLED_1ST)
        {
            return;
        }
        self.flags.insert(CameraFlags::FIRST_PERSON_ENABLED);
        if self.flags.contains(CameraFlags::RESPONDER_FORCED_3RD) {
            self.toggle_first_person();
            self.flags.remove(CameraFlags::RESPONDER_FORCED_3RD);
        }
    }

    /// The local avatar finished linking in.
    pub(super) fn link_in(&mut self) {
        if !self
            .flags
            .intersects(CameraFlags::SCRIPTS_DISABLED_1ST | CameraFlags::SCRIPTS_FORCED_3RD)
        {
            self.flags.insert(CameraFlags::FIRST_PERSON_ENABLED);
        }
        if self.flags.contains(CameraFlags::FIRST_PERSON_USER_SELECTED) {
            self.flags.remove(CameraFlags::FIRST_PERSON_AT_LINK_OUT);
            self.flags.remove(CameraFlags::SCRIPTS_FORCED_3RD);
            self.toggle_first_person();
        } else if self.first_person_override.is_none() {
            self.emit(CameraEvent::ThirdPersonInput(true));
        }
    }

    /// The local avatar is linking out.
    pub(super) fn link_out(&mut self) {
        self.flags.remove(CameraFlags::FIRST_PERSON_ENABLED);
        if self.first_person_override.is_some() || self.flags.contains(CameraFlags::RESPONDER_FORCED_3RD) {
            self.flags.insert(CameraFlags::FIRST_PERSON_AT_LINK_OUT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::DRIVE_CAMERA;
    use super::*;
    use crate::camera::brain::CameraBrain;
    use crate::camera::modifier::CameraModifier;
    use crate::config::CameraConfig;
    use crate::scene::SceneGraph;
    use glam::Mat4;

    fn controller_with_avatar() -> (VirtualCamera<SceneGraph>, ObjectId) {
        let mut scene = SceneGraph::new();
        let avatar = scene.spawn("Avatar", Mat4::IDENTITY);
        scene.set_local_player(Some(avatar));
        let mut cam = VirtualCamera::new(scene, CameraConfig::default());
        cam.set_render(true);
        cam.create_default_camera(avatar);
        (cam, avatar)
    }

    #[test]
    fn test_toggle_first_person_round_trip() {
        let (mut cam, _) = controller_with_avatar();
        let fp = cam.default_first_person().expect("first person built");
        cam.pan.retained_y = 0.3;

        cam.toggle_first_person();
        assert_eq!(cam.first_person_override(), Some(fp));
        assert_eq!(cam.current_camera(), Some(fp));
        assert!((cam.pan().y - 0.3).abs() < 1e-6);
        assert!(cam.events().contains(&CameraEvent::ThirdPersonInput(false)));

        cam.pan.y = 0.7;
        cam.toggle_first_person();
        assert_eq!(cam.first_person_override(), None);
        assert!((cam.pan().retained_y - 0.7).abs() < 1e-6);
        assert!(cam.pan().is_centred());
        assert!(cam.events().contains(&CameraEvent::ThirdPersonInput(true)));
    }

    #[test]
    fn test_toggle_needs_render_and_enable() {
        let (mut cam, _) = controller_with_avatar();
        cam.set_render(false);
        cam.toggle_first_person();
        assert_eq!(cam.first_person_override(), None);

        cam.set_render(true);
        cam.flags.remove(CameraFlags::FIRST_PERSON_ENABLED);
        cam.toggle_first_person();
        assert_eq!(cam.first_person_override(), None);
    }

    #[test]
    fn test_python_override_wins_and_releases() {
        let (mut cam, _) = controller_with_avatar();
        let script = cam.add_camera(CameraModifier::new("ScriptCam", None).with_brain(CameraBrain::fixed()));
        let top = cam.current_stack_camera();

        cam.push_python_override(script, true);
        assert_eq!(cam.current_camera(), Some(script));
        assert!(!cam.flags().contains(CameraFlags::FIRST_PERSON_ENABLED));

        cam.pop_python_override();
        assert_eq!(cam.python_override(), None);
        assert_eq!(cam.current_stack_camera(), top);
        assert!(cam.flags().contains(CameraFlags::FIRST_PERSON_ENABLED));
    }

    #[test]
    fn test_responder_cannot_override_script_forced() {
        let (mut cam, _) = controller_with_avatar();
        cam.toggle_first_person();
        cam.python_undo_first_person();
        assert!(cam.flags().contains(CameraFlags::SCRIPTS_FORCED_3RD));
        assert_eq!(cam.first_person_override(), None);

        cam.responder_undo_third_person();
        assert_eq!(cam.first_person_override(), None);

        cam.python_first_person_enable(true);
        assert!(!cam.flags().contains(CameraFlags::SCRIPTS_FORCED_3RD));
        assert!(cam.first_person_override().is_some());
    }

    #[test]
    fn test_responder_third_person_round_trip() {
        let (mut cam, _) = controller_with_avatar();
        cam.toggle_first_person();
        cam.responder_set_third_person();
        assert_eq!(cam.first_person_override(), None);
        assert!(cam.flags().contains(CameraFlags::RESPONDER_FORCED_3RD));
        assert!(!cam.flags().contains(CameraFlags::FIRST_PERSON_ENABLED));

        cam.responder_undo_third_person();
        assert!(cam.first_person_override().is_some());
        assert!(!cam.flags().contains(CameraFlags::RESPONDER_FORCED_3RD));
    }

    #[test]
    fn test_link_out_remembers_first_person() {
        let (mut cam, _) = controller_with_avatar();
        cam.toggle_first_person();
        cam.link_out();
        assert!(cam.flags().contains(CameraFlags::FIRST_PERSON_AT_LINK_OUT));
        assert!(!cam.flags().contains(CameraFlags::FIRST_PERSON_ENABLED));

        cam.link_in();
        assert!(cam.flags().contains(CameraFlags::FIRST_PERSON_ENABLED));
    }

    #[test]
    fn test_foreign_triggerer_rejected() {
        let (cam, avatar) = controller_with_avatar();
        assert!(cam.accepts_triggerer(None));
        assert!(cam.accepts_triggerer(Some(avatar)));
        assert!(!cam.accepts_triggerer(Some(ObjectId(999))));
        assert_ne!(cam.current_camera(), Some(DRIVE_CAMERA));
    }
}

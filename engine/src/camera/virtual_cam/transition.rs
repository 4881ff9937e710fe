//! Transitions between the outgoing and incoming stack cameras.

use super::{TRANSITION_CAMERA, TransitionState, VirtualCamera};
use crate::camera::brain::{AvatarState, BrainKind, CameraBrain};
use crate::camera::flags::BrainFlags;
use crate::camera::modifier::{CamTrans, CameraModifier};
use crate::scene::SceneProvider;

/// Squared distance under which a transition has arrived.
const ARRIVAL_DIST_SQ: f32 = 1e-4;

impl<S: SceneProvider> VirtualCamera<S> {
    /// Hand over from the previous camera to the top of the stack.
    pub(super) fn start_transition(&mut self, trans: CamTrans) {
        let Some(top) = self.current_stack_camera() else {
            return;
        };

        let animated = self.camera(top).is_some_and(CameraModifier::is_animated);
        if (trans.cut_pos && trans.cut_poa) || animated || self.config.always_cut {
            if self.in_transition() {
                self.finish_transition();
            }
            if let Some(brain) = self.brain_mut(top) {
                brain.cut_once();
                let (x, z) = brain.get_pan_limits();
                self.pan.x_limit = x;
                self.pan.z_limit = z;
                self.start_interp_pan_limits();
            }
            log::debug!("cut to camera {top:?}");
            return;
        }

        if self.first_person_override.is_some() {
            self.finish_transition();
            return;
        }

        let Some(prev) = self.prev.filter(|&p| self.contains(p)) else {
            log::debug!("no camera to transition from, cutting to {top:?}");
            self.cut_once(top);
            return;
        };

        // Track the avatar when the destination does
        let tracking = |id| self.camera(id).is_some_and(CameraModifier::is_tracking);
        let source = match self.python {
            Some(python) => Some(python).filter(|&p| tracking(p)),
            None => Some(top).filter(|&t| tracking(t)),
        };
        let subject_loaded = |b: &&CameraBrain| {
            b.get_subject()
                .is_some_and(|s| self.scene.local_to_world(s).is_some())
        };
        let mut brain = match source.and_then(|id| self.brain(id)).filter(subject_loaded) {
            Some(src) => {
                let mut brain = CameraBrain::new(BrainKind::Avatar(AvatarState::default()));
                brain.set_offset(src.get_offset());
                brain.set_poa_offset(src.get_poa_offset());
                for flag in [
                    BrainFlags::MAINTAIN_LOS,
                    BrainFlags::WORLDSPACE_POA,
                    BrainFlags::WORLDSPACE_POS,
                ] {
                    if src.has_flag(flag) {
                        brain.set_flags(flag);
                    }
                }
                brain.core.subject = src.get_subject();
                brain
            }
            None => CameraBrain::basic(),
        };
        brain.set_flags(BrainFlags::IS_TRANSITION_CAMERA);
        brain.core.pos_limits = trans.pos_limits;
        brain.core.poa_limits = trans.poa_limits;

        // Destination sits on its goals; the transition chases them
        let Some(dest) = self.camera_mut(top) else {
            return;
        };
        if let Some(goals) = dest.brain().map(|b| (b.get_goal(), b.get_poa_goal())) {
            (dest.state.pos, dest.state.poa) = goals;
        }
        let dest_state = dest.state;
        brain.set_goal(dest_state.pos);
        brain.set_poa_goal(dest_state.poa);

        if !self.in_transition() {
            if let Some(pose) = self.camera(prev).map(CameraModifier::pose)
                && let Some(tc) = self.camera_mut(TRANSITION_CAMERA)
            {
                tc.set_pose(pose);
            }
        } else if let Some(old) = self.brain(TRANSITION_CAMERA) {
            // Keep the in-flight speed so the camera does not stop mid-way
            brain.core.cur_cam_speed = old.core.cur_cam_speed;
            brain.core.cur_view_speed = old.core.cur_view_speed;
            log::debug!("transition redirected to {top:?}");
        }

        if let Some(dest_brain) = self.brain_mut(top) {
            if trans.cut_pos {
                dest_brain.set_flags(BrainFlags::CUT_POS_ONCE);
            }
            if trans.cut_poa {
                dest_brain.set_flags(BrainFlags::CUT_POA_ONCE);
            }
        }
        if trans.cut_pos {
            brain.set_flags(BrainFlags::CUT_POS);
        }
        if trans.cut_poa {
            brain.set_flags(BrainFlags::CUT_POA);
        }

        let prev_fov_h = self.camera(prev).map_or(dest_state.fov_h, |c| c.state.fov_h);
        if let Some(tc) = self.camera_mut(TRANSITION_CAMERA) {
            if dest_state.fov_h != prev_fov_h {
                let dist = if trans.cut_pos {
                    tc.state.poa - dest_state.poa
                } else {
                    tc.state.pos - dest_state.pos
                }
                .length();
                let velocity = brain.get_velocity();
                let time = if velocity > 0.0 { dist / velocity } else { 0.0 };
                brain.set_fov_goal(dest_state.fov_w, dest_state.fov_h, time, &mut tc.state);
            }
            tc.set_brain(Some(brain));
        }

        self.start_interp_pan_limits();
        self.trans_state = TransitionState::Follow;
        log::debug!("transition {prev:?} -> {top:?} started");
    }

    /// Move the transition's goals onto the destination and finish once the
    /// transition camera has arrived.
    pub(super) fn run_transition(&mut self) {
        if !self.in_transition() {
            return;
        }
        let Some(dest) = self.python.or(self.current_stack_camera()) else {
            self.finish_transition();
            return;
        };
        let (Some(tc), Some(dest_cam)) = (self.camera(TRANSITION_CAMERA), self.camera(dest)) else {
            self.finish_transition();
            return;
        };
        let Some(tb) = tc.brain() else {
            self.finish_transition();
            return;
        };

        let pos_gap = (tc.state.pos - dest_cam.state.pos).length_squared();
        let poa_gap = (tb.get_poa_goal() - tc.state.poa).length_squared();
        if pos_gap <= ARRIVAL_DIST_SQ && poa_gap <= ARRIVAL_DIST_SQ && !tb.has_flag(BrainFlags::ANIMATE_FOV) {
            self.finish_transition();
            return;
        }

        self.update_cam(dest);

        let Some(dest_cam) = self.camera(dest) else {
            return;
        };
        let dest_pos = dest_cam.state.pos;
        let dest_poa_goal = dest_cam.brain().map_or(dest_cam.state.poa, CameraBrain::get_poa_goal);
        let panic_dist_sq = dest_cam
            .brain()
            .filter(|b| b.kind.is_tracking())
            .map(|b| b.get_offset().length_squared());
        let tc_pos = self.camera(TRANSITION_CAMERA).map_or(dest_pos, |c| c.state.pos);

        if let Some(tb) = self.brain_mut(TRANSITION_CAMERA) {
            tb.set_goal(dest_pos);
            tb.set_poa_goal(dest_poa_goal);
            if let Some(limit) = panic_dist_sq {
                let lagging = (dest_pos - tc_pos).length_squared() > limit;
                tb.core.flags.set(BrainFlags::PANIC_VELOCITY, lagging);
            }
        }
    }

    /// Drop the transition brain; the destination takes over.
    pub(super) fn finish_transition(&mut self) {
        if let Some(tc) = self.camera_mut(TRANSITION_CAMERA) {
            tc.set_brain(None);
        }
        if self.trans_state == TransitionState::Follow {
            log::debug!("transition finished");
        }
        self.trans_state = TransitionState::Off;
    }
}

//! Per-frame update and the hand-off to the render pipeline.

use glam::{Mat4, Vec3};

use super::{DRIVE_CAMERA, TRANSITION_CAMERA, VirtualCamera};
use crate::camera::flags::{BrainFlags, CameraFlags};
use crate::camera::modifier::CameraId;
use crate::camera::motion::aspect_corrected_fov_w;
use crate::events::CameraEvent;
use crate::pipeline::{CameraOutput, Pipeline};
use crate::scene::{SceneProvider, view_axis};

impl<S: SceneProvider> VirtualCamera<S> {
    /// Advance every camera by `dt` seconds and deliver the current camera's
    /// view to `pipe`.
    ///
    /// Queued commands are handled first. Nothing moves while render is off.
    pub fn update(&mut self, dt: f32, pipe: &mut dyn Pipeline) {
        self.clock += f64::from(dt);
        self.frame_dt = dt;

        while let Some(cmd) = self.commands.pop() {
            self.handle_command(cmd);
        }

        if !self.flags.contains(CameraFlags::RENDER) {
            return;
        }

        self.update_cam(DRIVE_CAMERA);
        if let Some(python) = self.python {
            self.update_cam(python);
        }
        if let Some(first_person) = self.first_person_override {
            self.update_cam(first_person);
        }
        self.update_cam(TRANSITION_CAMERA);
        self.run_transition();

        // A camera pushed several times in a row updates once, at its topmost
        // entry. The top is driven by the transition while one runs.
        let top = self.current_stack_camera();
        let mut i = 0;
        while let Some(&id) = self.stack.get(i) {
            i += 1;
            if self.stack[i..].iter().any(|&c| c != id) {
                continue;
            }
            if Some(id) == top && self.in_transition() {
                continue;
            }
            if self.config.always_cut
                && let Some(brain) = self.brain_mut(id)
            {
                brain.set_flags(BrainFlags::CUT_POS | BrainFlags::CUT_POA);
            }
            if self.force_cut_once {
                self.cut_once(id);
            }
            self.update_cam(id);
        }
        self.force_cut_once = false;

        self.write_output(pipe);
    }

    fn write_output(&mut self, pipe: &mut dyn Pipeline) {
        let Some(current) = self.current_camera() else {
            return;
        };

        if self.freeze_counter > 0 {
            self.freeze_counter -= 1;
            self.cut_once(current);
            log::trace!("output frozen, {} frames left", self.freeze_counter);
            return;
        }

        if self.fade_counter > 0 {
            self.fade_counter -= 1;
            if self.fade_counter == 0
                && self.first_person_override.is_none()
                && let Some(subject) = self.scene.local_player()
            {
                self.emit(CameraEvent::AvatarDrawable { subject, enabled: true });
            }
        }

        let Some(cam) = self.camera(current) else {
            return;
        };
        let state = cam.state;
        let animated_up = if cam.is_animated() {
            cam.target
                .and_then(|t| self.scene.local_to_world(t))
                .map(|l2w| -view_axis(&l2w))
        } else {
            None
        };

        // Animated and instructed FOV changes of the current camera
        if (state.fov_w, state.fov_h) != self.raw_fov {
            self.set_fov(state.fov_w, state.fov_h);
        }

        let pos = state.pos;
        let mut poa = self.adjust_for_input(pos, state.poa);
        if (poa - pos).length_squared() < f32::EPSILON {
            poa = pos + Vec3::Y;
        }

        let view = (pos - poa).normalize();
        let up = animated_up
            .unwrap_or_else(|| view.cross(Vec3::Z).cross(view))
            .try_normalize()
            .unwrap_or(self.output.up);

        let world_to_camera = Mat4::look_at_rh(pos, poa, up);
        let camera_to_world = world_to_camera.inverse();
        pipe.set_world_to_camera(world_to_camera, camera_to_world);
        self.output = CameraOutput {
            pos,
            poa,
            up,
            world_to_camera,
            camera_to_world,
        };

        if self.flags.contains(CameraFlags::SET_FOV) {
            self.flags.remove(CameraFlags::SET_FOV);
            pipe.set_fov(self.fov_w, self.fov_h);
            self.emit(CameraEvent::FovChanged {
                fov_w: self.fov_w,
                fov_h: self.fov_h,
            });
        }
    }

    /// Set the output FOV, degrees. The width is corrected for the aspect
    /// ratio; the pipeline gets it on the next output.
    pub fn set_fov(&mut self, fov_w: f32, fov_h: f32) {
        self.raw_fov = (fov_w, fov_h);
        self.fov_h = fov_h;
        self.fov_w = aspect_corrected_fov_w(fov_w, self.aspect_ratio);
        self.flags.insert(CameraFlags::SET_FOV);
        log::debug!("output fov {:.2}x{:.2}", self.fov_w, self.fov_h);
    }

    /// Take the FOV of `id` if it is the current camera.
    pub(super) fn set_fov_from(&mut self, id: CameraId) {
        if self.current_camera() != Some(id) {
            return;
        }
        if let Some(state) = self.camera(id).map(|c| c.state) {
            self.set_fov(state.fov_w, state.fov_h);
        }
    }

    /// The output resolution changed; re-derive the aspect-corrected FOV.
    pub fn refresh(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("ignoring degenerate output size {width}x{height}");
            return;
        }
        self.aspect_ratio = width as f32 / height as f32;
        if let Some(current) = self.current_camera() {
            self.set_fov_from(current);
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::pipeline::RecordingPipeline;
    use crate::scene::SceneGraph;

    const EPSILON: f32 = 1e-4;

    fn controller() -> VirtualCamera<SceneGraph> {
        let mut cam = VirtualCamera::new(SceneGraph::new(), CameraConfig::default());
        cam.set_render(true);
        cam
    }

    #[test]
    fn test_nothing_delivered_while_render_off() {
        let mut cam = VirtualCamera::new(SceneGraph::new(), CameraConfig::default());
        let mut pipe = RecordingPipeline::new();
        cam.update(0.016, &mut pipe);
        assert_eq!(pipe.frames, 0);
        assert!(pipe.fov.is_none());
    }

    #[test]
    fn test_first_output_sends_fov_once() {
        let mut cam = controller();
        let mut pipe = RecordingPipeline::new();
        cam.update(0.016, &mut pipe);
        assert_eq!(pipe.frames, 1);
        assert!(pipe.fov.is_some());
        assert!(!cam.flags().contains(CameraFlags::SET_FOV));

        let fov_events = cam
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, CameraEvent::FovChanged { .. }))
            .count();
        assert_eq!(fov_events, 1);

        cam.update(0.016, &mut pipe);
        assert!(cam.drain_events().iter().all(|e| !matches!(e, CameraEvent::FovChanged { .. })));
    }

    #[test]
    fn test_output_up_is_perpendicular_to_view() {
        let mut cam = controller();
        let mut pipe = RecordingPipeline::new();
        cam.update(0.016, &mut pipe);

        let out = *cam.output();
        let view = (out.poa - out.pos).normalize();
        assert!(out.up.dot(view).abs() < EPSILON);
        assert!(out.up.z > 0.0);
        let delivered = pipe.camera_position().expect("frame delivered");
        assert!((delivered - out.pos).length() < 1e-3);
    }

    #[test]
    fn test_freeze_holds_output() {
        let mut cam = controller();
        let mut pipe = RecordingPipeline::new();
        cam.freeze_output(2);
        cam.update(0.016, &mut pipe);
        cam.update(0.016, &mut pipe);
        assert_eq!(pipe.frames, 0);
        cam.update(0.016, &mut pipe);
        assert_eq!(pipe.frames, 1);
    }

    #[test]
    fn test_refresh_corrects_width_for_aspect() {
        let mut cam = controller();
        cam.refresh(1600, 900);
        let (w, h) = cam.fov();
        let config = CameraConfig::default();
        assert!((h - config.fov_h).abs() < EPSILON);
        assert!((w - aspect_corrected_fov_w(config.fov_w, 1600.0 / 900.0)).abs() < EPSILON);

        // Zero height is ignored
        cam.refresh(1600, 0);
        assert!((cam.aspect_ratio() - 1600.0 / 900.0).abs() < EPSILON);
    }
}

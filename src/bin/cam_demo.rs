//! Camera Controller Demo
//!
//! Run with: `cargo run --bin cam_demo [config.json]`
//!
//! Headless walkthrough of the camera controller: an avatar on a moving
//! platform, the built-in cameras, a camera region, a scripted override and a
//! first-person toggle. Output poses are logged; set `RUST_LOG=debug` to see
//! the controller's own decisions.

use glam::{Mat4, Vec3};
use plasma_cam_engine::camera::{CameraBrain, CameraModifier};
use plasma_cam_engine::{
    CameraCommand, CameraConfig, CameraEvent, InputState, KeyCode, RecordingPipeline, SceneGraph,
    SceneProvider, VirtualCamera,
};

const DT: f32 = 1.0 / 60.0;
const WINDOW: (u32, u32) = (1280, 720);

// ============================================================================
// SCRIPT
// ============================================================================

/// What happens at a given frame of the walkthrough.
enum Step {
    Key(KeyCode, bool),
    Mouse(f32, f32),
    Command(CameraCommand),
    MovePlatform(Vec3),
}

struct Demo {
    cam: VirtualCamera<SceneGraph>,
    input: InputState,
    pipe: RecordingPipeline,
    platform: plasma_cam_engine::ObjectId,
}

impl Demo {
    fn new(config: CameraConfig) -> Self {
        let mut scene = SceneGraph::new();
        let platform = scene.spawn("Platform", Mat4::IDENTITY);
        let avatar = scene.spawn_child(platform, "Avatar", Mat4::IDENTITY);
        scene.spawn_child(avatar, "FPCameraOrigin", Mat4::from_translation(Vec3::new(0.0, 0.0, 5.5)));
        scene.spawn("GalleryNode", Mat4::from_translation(Vec3::new(30.0, -30.0, 15.0)));
        scene.set_local_player(Some(avatar));
        scene.add_blocker(Vec3::new(0.0, 25.0, 8.0), 2.0);

        let mut cam = VirtualCamera::new(scene, config);
        cam.set_render(true);
        cam.refresh(WINDOW.0, WINDOW.1);
        cam.queue(CameraCommand::CreateDefaultCamera { subject: avatar });

        Self {
            cam,
            input: InputState::new(WINDOW.0 as f32, WINDOW.1 as f32),
            pipe: RecordingPipeline::new(),
            platform,
        }
    }

    fn add_gallery_camera(&mut self) -> plasma_cam_engine::CameraId {
        let node = self.cam.scene().find_by_name("GalleryNode");
        let mut brain = CameraBrain::fixed();
        brain.set_subject(self.cam.scene().local_player());
        brain.set_poa_offset(Vec3::new(0.0, 0.0, 4.0));
        self.cam
            .add_camera(CameraModifier::new("GalleryCam", node).with_brain(brain))
    }

    fn apply(&mut self, step: Step) {
        match step {
            Step::Key(key, pressed) => self.input.handle_key(key, pressed),
            Step::Mouse(dx, dy) => self.input.mouse.accumulate_delta(dx, dy),
            Step::Command(cmd) => self.cam.queue(cmd),
            Step::MovePlatform(delta) => self.cam.scene_mut().translate(self.platform, delta),
        }
    }

    fn frame(&mut self, n: usize) {
        for cmd in self.input.drain_commands() {
            self.cam.queue(cmd);
        }
        self.cam.update(DT, &mut self.pipe);

        for event in self.cam.drain_events() {
            match event {
                CameraEvent::FovChanged { fov_w, fov_h } => {
                    log::info!("frame {n}: fov {fov_w:.1}x{fov_h:.1}");
                }
                CameraEvent::RecenterMouse(on) => self.input.mouse.request_recenter(on),
                other => log::debug!("frame {n}: {other:?}"),
            }
        }

        if n % 30 == 0 {
            let out = self.cam.output();
            let name = self
                .cam
                .current_camera()
                .and_then(|id| self.cam.camera(id))
                .map_or("<none>", |c| c.name.as_str());
            log::info!(
                "frame {n}: {name} pos ({:.2}, {:.2}, {:.2}) poa ({:.2}, {:.2}, {:.2})",
                out.pos.x,
                out.pos.y,
                out.pos.z,
                out.poa.x,
                out.poa.y,
                out.poa.z
            );
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match CameraConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        },
        None => CameraConfig::default(),
    };

    let mut demo = Demo::new(config);
    let gallery = demo.add_gallery_camera();

    let script = vec![
        (120, Step::Key(KeyCode::ControlLeft, true)),
        (121, Step::Mouse(-60.0, 20.0)),
        (150, Step::Key(KeyCode::ControlLeft, false)),
        (151, Step::Key(KeyCode::W, true)),
        (240, Step::MovePlatform(Vec3::new(0.0, 0.0, 6.0))),
        (330, Step::Key(KeyCode::W, false)),
        (
            360,
            Step::Command(CameraCommand::Region {
                camera: gallery,
                entering: true,
                as_default: false,
                cut: false,
                triggerer: demo.cam.scene().local_player(),
            }),
        ),
        (
            600,
            Step::Command(CameraCommand::Region {
                camera: gallery,
                entering: false,
                as_default: false,
                cut: false,
                triggerer: demo.cam.scene().local_player(),
            }),
        ),
        (840, Step::Key(KeyCode::F1, true)),
        (841, Step::Key(KeyCode::F1, false)),
        (960, Step::Key(KeyCode::F1, true)),
        (961, Step::Key(KeyCode::F1, false)),
        (
            1080,
            Step::Command(CameraCommand::PythonOverridePush {
                camera: gallery,
                cut: true,
                triggerer: None,
            }),
        ),
        (1200, Step::Command(CameraCommand::PythonOverridePop { triggerer: None })),
    ];

    let mut script = script.into_iter().peekable();
    for n in 0..1320 {
        while let Some((_, step)) = script.next_if(|(at, _)| *at == n) {
            demo.apply(step);
        }
        demo.frame(n);
    }

    log::info!(
        "{} frames delivered, final stack depth {}",
        demo.pipe.frames,
        demo.cam.stack_len()
    );
}

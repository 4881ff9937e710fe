//! Transition Tests
//!
//! Cuts versus blends between stack cameras, the transition camera taking
//! over while a blend runs, and the script override's precedence.

use glam::{Mat4, Vec3};
use plasma_cam_engine::camera::motion::aspect_corrected_fov_w;
use plasma_cam_engine::camera::{
    BrainFlags, CamTrans, CameraBrain, CameraFlags, TRANSITION_CAMERA, TransitionState,
};
use plasma_cam_engine::{
    CameraCommand, CameraConfig, CameraId, CameraModifier, ObjectId, RecordingPipeline,
    SceneGraph, VirtualCamera,
};

const DT: f32 = 1.0 / 60.0;
const EPSILON: f32 = 1e-3;

fn controller_with(config: CameraConfig) -> (VirtualCamera<SceneGraph>, ObjectId) {
    let mut scene = SceneGraph::new();
    let avatar = scene.spawn("Avatar", Mat4::IDENTITY);
    scene.set_local_player(Some(avatar));
    let mut cam = VirtualCamera::new(scene, config);
    cam.set_render(true);
    (cam, avatar)
}

fn controller() -> (VirtualCamera<SceneGraph>, ObjectId) {
    controller_with(CameraConfig::default())
}

fn fixed_camera(cam: &mut VirtualCamera<SceneGraph>, name: &str, pos: Vec3) -> CameraId {
    let node = cam
        .scene_mut()
        .spawn(&format!("{name}Node"), Mat4::from_translation(pos));
    cam.add_camera(CameraModifier::new(name, Some(node)).with_brain(CameraBrain::fixed()))
}

fn follow_camera(avatar: ObjectId) -> CameraModifier {
    let mut brain = CameraBrain::avatar();
    brain.set_subject(Some(avatar));
    brain.set_offset(Vec3::new(0.0, 15.0, 10.0));
    brain.set_poa_offset(Vec3::new(0.0, 0.0, 5.5));
    CameraModifier::new("Follow", None).with_brain(brain)
}

/// Fixed camera far from the avatar, alone on the stack.
fn start_on_fixed(cam: &mut VirtualCamera<SceneGraph>) -> CameraId {
    let a = fixed_camera(cam, "Overlook", Vec3::new(50.0, 0.0, 20.0));
    cam.push_camera(a, true);
    run(cam, 2);
    a
}

fn run(cam: &mut VirtualCamera<SceneGraph>, frames: usize) {
    let mut pipe = RecordingPipeline::new();
    for _ in 0..frames {
        cam.update(DT, &mut pipe);
    }
}

/// Update until the running transition finishes. Returns the frame count.
fn settle(cam: &mut VirtualCamera<SceneGraph>, max_frames: usize) -> Option<usize> {
    let mut pipe = RecordingPipeline::new();
    for frame in 1..=max_frames {
        cam.update(DT, &mut pipe);
        if !cam.in_transition() {
            return Some(frame);
        }
    }
    None
}

// ============================================================================
// Cuts
// ============================================================================

#[test]
fn test_cut_between_static_cameras() {
    let (mut cam, _) = controller();
    let a = fixed_camera(&mut cam, "A", Vec3::new(20.0, 0.0, 5.0));
    let b = fixed_camera(&mut cam, "B", Vec3::new(-20.0, 10.0, 5.0));
    cam.push_camera(a, false);
    run(&mut cam, 1);

    cam.push_camera(b, false);
    assert!(!cam.in_transition());
    assert_eq!(cam.current_camera(), Some(b));

    run(&mut cam, 1);
    assert!((cam.output().pos - Vec3::new(-20.0, 10.0, 5.0)).length() < EPSILON);
}

#[test]
fn test_authored_cut_overrides_stock_blend() {
    let (mut cam, avatar) = controller();
    let a = start_on_fixed(&mut cam);
    let mut follow = follow_camera(avatar);
    follow.add_trans(CamTrans::cut(Some(a)));
    let b = cam.add_camera(follow);

    cam.push_camera(b, false);
    assert!(!cam.in_transition());
    run(&mut cam, 1);
    let state = cam.camera(b).expect("registered").state;
    assert!((cam.output().pos - state.pos).length() < EPSILON);
}

#[test]
fn test_cut_next_transition_skips_blend() {
    let (mut cam, avatar) = controller();
    start_on_fixed(&mut cam);
    let b = follow_camera(avatar);
    let b = cam.add_camera(b);

    cam.set_cut_next_trans();
    cam.push_camera(b, false);
    assert!(!cam.in_transition());
    assert!(!cam.flags().contains(CameraFlags::CUT_NEXT_TRANS));
    assert_eq!(cam.current_camera(), Some(b));
}

#[test]
fn test_cut_next_transition_survives_first_person_push() {
    let (mut cam, avatar) = controller();
    cam.create_default_camera(avatar);
    let fp = cam.default_first_person().expect("first person built");

    cam.set_cut_next_trans();
    cam.push_camera(fp, false);
    assert_eq!(cam.current_stack_camera(), Some(fp));
    assert!(!cam.in_transition());
    assert!(cam.flags().contains(CameraFlags::CUT_NEXT_TRANS));
}

#[test]
fn test_always_cut_config() {
    let config = CameraConfig {
        always_cut: true,
        ..Default::default()
    };
    let (mut cam, avatar) = controller_with(config);
    start_on_fixed(&mut cam);
    let b = follow_camera(avatar);
    let b = cam.add_camera(b);

    cam.push_camera(b, false);
    assert!(!cam.in_transition());
}

// ============================================================================
// Blends
// ============================================================================

#[test]
fn test_blend_to_tracking_camera() {
    let (mut cam, avatar) = controller();
    let a = start_on_fixed(&mut cam);
    let b = follow_camera(avatar);
    let b = cam.add_camera(b);

    cam.push_camera(b, false);
    assert_eq!(cam.transition_state(), TransitionState::Follow);
    assert_eq!(cam.current_camera(), Some(TRANSITION_CAMERA));
    assert_eq!(cam.previous_camera(), Some(a));
    assert!(cam.is_current(TRANSITION_CAMERA));
    assert!(!cam.is_current(b));

    // The blend starts where the old camera was
    run(&mut cam, 1);
    let start = cam.output().pos;
    assert!((start - Vec3::new(50.0, 0.0, 20.0)).length() < 5.0);

    let frames = settle(&mut cam, 1200).expect("transition finishes");
    assert!(frames > 10);
    assert_eq!(cam.current_camera(), Some(b));
    assert_eq!(cam.transition_state(), TransitionState::Off);

    run(&mut cam, 1);
    let state = cam.camera(b).expect("registered").state;
    assert!((cam.output().pos - state.pos).length() < 0.05);
}

#[test]
fn test_blend_moves_monotonically_closer() {
    let (mut cam, avatar) = controller();
    start_on_fixed(&mut cam);
    let b = follow_camera(avatar);
    let b = cam.add_camera(b);
    cam.push_camera(b, false);

    let mut last = f32::MAX;
    for _ in 0..30 {
        run(&mut cam, 1);
        if !cam.in_transition() {
            break;
        }
        let goal = cam.camera(b).expect("registered").state.pos;
        let gap = (cam.output().pos - goal).length();
        assert!(gap <= last + EPSILON);
        last = gap;
    }
}

#[test]
fn test_transition_blends_fov() {
    let (mut cam, avatar) = controller();
    start_on_fixed(&mut cam);
    let b = follow_camera(avatar).with_fov(90.0, 66.7);
    let b = cam.add_camera(b);
    cam.push_camera(b, false);

    run(&mut cam, 10);
    assert!(cam.in_transition());
    let (_, h) = cam.fov();
    assert!(h > 33.75 && h < 66.7);

    settle(&mut cam, 1200).expect("transition finishes");
    let (w, h) = cam.fov();
    assert!((h - 66.7).abs() < EPSILON);
    assert!((w - aspect_corrected_fov_w(90.0, 4.0 / 3.0)).abs() < EPSILON);
}

#[test]
fn test_pop_blends_back() {
    let (mut cam, avatar) = controller();
    let a = start_on_fixed(&mut cam);
    let b = follow_camera(avatar);
    let b = cam.add_camera(b);
    cam.push_camera(b, false);
    settle(&mut cam, 1200).expect("transition finishes");

    cam.pop_camera(b);
    assert!(cam.in_transition());
    assert_eq!(cam.previous_camera(), Some(b));
    settle(&mut cam, 1200).expect("transition finishes");
    assert_eq!(cam.current_camera(), Some(a));
}

#[test]
fn test_unloaded_subject_does_not_stall_transition() {
    let (mut cam, _) = controller();
    start_on_fixed(&mut cam);
    let ghost = cam.scene_mut().spawn("Ghost", Mat4::IDENTITY);
    let b = follow_camera(ghost);
    let b = cam.add_camera(b);
    cam.scene_mut().despawn(ghost);

    cam.push_camera(b, false);
    assert!(settle(&mut cam, 1200).is_some());
}

#[test]
fn test_subject_unloaded_mid_transition_still_finishes() {
    let (mut cam, avatar) = controller();
    start_on_fixed(&mut cam);
    let b = cam.add_camera(follow_camera(avatar));
    cam.push_camera(b, false);
    run(&mut cam, 3);
    assert!(cam.in_transition());

    let before = cam.output().pos;
    cam.scene_mut().despawn(avatar);
    run(&mut cam, 1);
    assert!((cam.output().pos - before).length() > 0.0);

    assert!(settle(&mut cam, 3000).is_some());
    assert_eq!(cam.current_camera(), Some(b));
}

#[test]
fn test_redirected_transition_keeps_its_speed() {
    let (mut cam, avatar) = controller();
    start_on_fixed(&mut cam);
    let b = cam.add_camera(follow_camera(avatar));
    cam.push_camera(b, false);
    run(&mut cam, 10);
    assert!(cam.in_transition());

    let speed_of = |cam: &VirtualCamera<SceneGraph>| {
        cam.camera(TRANSITION_CAMERA)
            .and_then(|c| c.brain())
            .map(|b| b.core.cur_cam_speed)
            .expect("transition brain")
    };
    let speed = speed_of(&cam);
    assert!(speed > 0.0);

    let mut flank = follow_camera(avatar);
    flank.name = "Flank".into();
    if let Some(brain) = flank.brain_mut() {
        brain.set_offset(Vec3::new(12.0, 15.0, 10.0));
    }
    let c = cam.add_camera(flank);
    cam.push_camera(c, false);

    assert_eq!(cam.transition_state(), TransitionState::Follow);
    assert_eq!(cam.previous_camera(), Some(b));
    assert_eq!(speed_of(&cam), speed);

    settle(&mut cam, 1200).expect("transition finishes");
    assert_eq!(cam.current_camera(), Some(c));
}

#[test]
fn test_lagging_transition_uses_panic_velocity() {
    let (mut cam, avatar) = controller();
    start_on_fixed(&mut cam);
    let b = cam.add_camera(follow_camera(avatar));
    cam.push_camera(b, false);

    let panicking = |cam: &VirtualCamera<SceneGraph>| {
        cam.camera(TRANSITION_CAMERA)
            .and_then(|c| c.brain())
            .is_some_and(|b| b.has_flag(BrainFlags::PANIC_VELOCITY))
    };
    run(&mut cam, 1);
    assert!(panicking(&cam));

    // Offset is (0, 15, 10): the flag drops once within that distance
    let offset_sq = Vec3::new(0.0, 15.0, 10.0).length_squared();
    let mut caught_up = false;
    for _ in 0..1200 {
        run(&mut cam, 1);
        if !cam.in_transition() {
            break;
        }
        let goal = cam.camera(b).expect("registered").state.pos;
        let tc = cam.camera(TRANSITION_CAMERA).expect("built in").state.pos;
        if (tc - goal).length_squared() < offset_sq * 0.25 {
            assert!(!panicking(&cam));
            caught_up = true;
        }
    }
    assert!(caught_up);
}

#[test]
fn test_destroying_destination_ends_transition() {
    let (mut cam, avatar) = controller();
    let a = start_on_fixed(&mut cam);
    let b = cam.add_camera(follow_camera(avatar));
    cam.push_camera(b, false);
    run(&mut cam, 5);
    assert!(cam.in_transition());

    cam.queue(CameraCommand::CameraDestroyed(b));
    run(&mut cam, 1);
    assert!(!cam.in_transition());
    assert_eq!(cam.stack(), &[a]);
    assert_eq!(cam.current_camera(), Some(a));
}

// ============================================================================
// Script Override
// ============================================================================

#[test]
fn test_script_override_takes_precedence() {
    let (mut cam, _) = controller();
    start_on_fixed(&mut cam);
    let script = fixed_camera(&mut cam, "Script", Vec3::new(0.0, 40.0, 8.0));
    let region = fixed_camera(&mut cam, "Region", Vec3::new(-30.0, 0.0, 8.0));

    cam.queue(CameraCommand::PythonOverridePush {
        camera: script,
        cut: true,
        triggerer: None,
    });
    run(&mut cam, 1);
    assert_eq!(cam.current_camera(), Some(script));
    assert!((cam.output().pos - Vec3::new(0.0, 40.0, 8.0)).length() < EPSILON);

    // Stack changes underneath do not show
    cam.queue(CameraCommand::Region {
        camera: region,
        entering: true,
        as_default: false,
        cut: false,
        triggerer: None,
    });
    run(&mut cam, 1);
    assert_eq!(cam.current_stack_camera(), Some(region));
    assert_eq!(cam.current_camera(), Some(script));

    cam.queue(CameraCommand::PythonOverridePop { triggerer: None });
    run(&mut cam, 1);
    assert_eq!(cam.python_override(), None);
    assert_eq!(cam.current_camera(), Some(region));
    assert!(!cam.in_transition());
}

#[test]
fn test_script_override_blend() {
    let (mut cam, _) = controller();
    start_on_fixed(&mut cam);
    let script = fixed_camera(&mut cam, "Script", Vec3::new(0.0, 40.0, 8.0));

    cam.queue(CameraCommand::PythonOverridePush {
        camera: script,
        cut: false,
        triggerer: None,
    });
    run(&mut cam, 1);
    assert!(cam.in_transition());
    assert_eq!(cam.python_override(), Some(script));

    settle(&mut cam, 1200).expect("transition finishes");
    assert_eq!(cam.current_camera(), Some(script));
    run(&mut cam, 1);
    assert!((cam.output().pos - Vec3::new(0.0, 40.0, 8.0)).length() < 0.05);
}

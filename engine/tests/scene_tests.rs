//! Scene Tests
//!
//! Authored camera registration from JSON, subworld riding, timed FOV
//! instructions and region triggers.

use glam::{Mat4, Vec3};
use plasma_cam_engine::camera::{CameraFlags, DRIVE_CAMERA};
use plasma_cam_engine::events::AnimCommand;
use plasma_cam_engine::{
    CameraCommand, CameraError, CameraEvent, ConfigError, ObjectId, RecordingPipeline, SceneDesc,
    SceneGraph, SceneProvider, VirtualCamera,
};

const DT: f32 = 1.0 / 60.0;
const EPSILON: f32 = 1e-3;

const LOBBY_SCENE: &str = r#"{
    "cameras": [
        {
            "name": "Lobby",
            "target": "LobbyNode",
            "brain": { "type": "fixed" }
        },
        {
            "name": "Hall",
            "brain": {
                "type": "avatar",
                "subject": "Avatar",
                "offset": [0.0, 12.0, 6.0],
                "poa_offset": [0.0, 0.0, 5.0]
            },
            "transitions": [
                { "from": "Lobby", "cut_pos": true, "cut_poa": true }
            ]
        },
        {
            "name": "Balcony",
            "target": "BalconyNode",
            "brain": { "type": "fixed", "target_point": "Hall" },
            "fov_instructions": [
                { "at": 0.5, "fov_w": 60.0, "fov_h": 45.0 }
            ]
        },
        {
            "name": "Orrery",
            "target": "OrreryNode",
            "brain": { "type": "fixed" },
            "anim": { "animated": true, "start_on_push": true, "stop_on_pop": true }
        }
    ]
}"#;

struct Lobby {
    cam: VirtualCamera<SceneGraph>,
    avatar: ObjectId,
}

fn lobby() -> Lobby {
    let mut scene = SceneGraph::new();
    let avatar = scene.spawn("Avatar", Mat4::IDENTITY);
    scene.set_local_player(Some(avatar));
    scene.spawn("LobbyNode", Mat4::from_translation(Vec3::new(0.0, -30.0, 10.0)));
    scene.spawn("BalconyNode", Mat4::from_translation(Vec3::new(25.0, 25.0, 18.0)));
    scene.spawn("OrreryNode", Mat4::from_translation(Vec3::new(-25.0, 0.0, 4.0)));

    let desc = SceneDesc::from_json_str(LOBBY_SCENE).expect("valid scene");
    let mut cam = VirtualCamera::new(scene, desc.config.clone());
    cam.set_render(true);
    cam.register_scene(&desc).expect("scene registers");
    Lobby { cam, avatar }
}

fn run(cam: &mut VirtualCamera<SceneGraph>, frames: usize) {
    let mut pipe = RecordingPipeline::new();
    for _ in 0..frames {
        cam.update(DT, &mut pipe);
    }
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_register_scene_resolves_names() {
    let Lobby { cam, avatar } = lobby();
    let lobby_cam = cam.find_camera("lobby").expect("registered");
    let hall = cam.find_camera("Hall").expect("registered");
    let balcony = cam.find_camera("BALCONY").expect("registered");

    let node = cam.scene().find_by_name("LobbyNode");
    assert_eq!(cam.camera(lobby_cam).expect("registered").target, node);

    let hall_cam = cam.camera(hall).expect("registered");
    assert_eq!(hall_cam.brain().and_then(|b| b.get_subject()), Some(avatar));
    assert_eq!(hall_cam.transitions.len(), 1);
    let trans = hall_cam.transitions[0];
    assert_eq!(trans.trans_to, Some(lobby_cam));
    assert!(trans.cut_pos && trans.cut_poa);

    let fixed = cam.camera(balcony).and_then(|c| c.brain());
    assert_eq!(fixed.and_then(|b| b.target_point()), Some(hall));
}

#[test]
fn test_register_scene_rejects_unknown_reference() {
    let json = r#"{
        "cameras": [
            {
                "name": "Hall",
                "brain": { "type": "avatar" },
                "transitions": [ { "from": "Nowhere" } ]
            }
        ]
    }"#;
    let desc: SceneDesc = serde_json::from_str(json).expect("parses");
    let mut cam = VirtualCamera::new(SceneGraph::new(), Default::default());

    let err = cam.register_scene(&desc).unwrap_err();
    assert!(matches!(
        err,
        CameraError::Config(ConfigError::UnknownReference { .. })
    ));
    assert!(cam.find_camera("Hall").is_none());
}

#[test]
fn test_authored_cut_transition() {
    let Lobby { mut cam, .. } = lobby();
    let lobby_cam = cam.find_camera("Lobby").expect("registered");
    let hall = cam.find_camera("Hall").expect("registered");

    cam.push_camera(lobby_cam, false);
    run(&mut cam, 1);
    assert!((cam.output().pos - Vec3::new(0.0, -30.0, 10.0)).length() < EPSILON);

    // Hall blends from anything else but cuts from the lobby
    cam.push_camera(hall, false);
    assert!(!cam.in_transition());
    assert_eq!(cam.current_camera(), Some(hall));
}

#[test]
fn test_fixed_camera_looks_at_target_point() {
    let Lobby { mut cam, .. } = lobby();
    let hall = cam.find_camera("Hall").expect("registered");
    let balcony = cam.find_camera("Balcony").expect("registered");

    cam.push_camera(balcony, false);
    run(&mut cam, 1);
    let hall_goal = cam
        .camera(hall)
        .and_then(|c| c.brain())
        .map(|b| b.get_goal())
        .expect("hall has a brain");
    let state = cam.camera(balcony).expect("registered").state;
    assert!((state.poa - hall_goal).length() < EPSILON);
    assert!((state.pos - Vec3::new(25.0, 25.0, 18.0)).length() < EPSILON);
}

// ============================================================================
// FOV Instructions
// ============================================================================

#[test]
fn test_fov_instruction_reaches_output() {
    let Lobby { mut cam, .. } = lobby();
    let balcony = cam.find_camera("Balcony").expect("registered");
    cam.push_camera(balcony, false);

    run(&mut cam, 10);
    let (w, h) = cam.fov();
    assert!((w - 45.0).abs() < EPSILON);
    assert!((h - 33.75).abs() < EPSILON);

    run(&mut cam, 30);
    let (w, h) = cam.fov();
    assert!((w - 60.0).abs() < EPSILON);
    assert!((h - 45.0).abs() < EPSILON);

    let fov_events: Vec<_> = cam
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, CameraEvent::FovChanged { .. }))
        .collect();
    assert_eq!(
        fov_events.last(),
        Some(&CameraEvent::FovChanged {
            fov_w: 60.0,
            fov_h: 45.0
        })
    );
}

// ============================================================================
// Animated Targets
// ============================================================================

#[test]
fn test_animated_camera_drives_target_animation() {
    let Lobby { mut cam, .. } = lobby();
    let orrery = cam.find_camera("Orrery").expect("registered");
    let node = cam.scene().find_by_name("OrreryNode").expect("spawned");

    cam.push_camera(orrery, false);
    assert!(!cam.in_transition());
    assert!(cam.events().contains(&CameraEvent::Animation {
        target: node,
        command: AnimCommand::Start
    }));

    cam.pop_camera(orrery);
    assert!(cam.events().contains(&CameraEvent::Animation {
        target: node,
        command: AnimCommand::Stop
    }));
    assert_eq!(cam.current_camera(), Some(DRIVE_CAMERA));
}

// ============================================================================
// Regions
// ============================================================================

#[test]
fn test_region_enter_and_exit() {
    let Lobby { mut cam, avatar } = lobby();
    let lobby_cam = cam.find_camera("Lobby").expect("registered");
    let balcony = cam.find_camera("Balcony").expect("registered");

    cam.queue(CameraCommand::Region {
        camera: lobby_cam,
        entering: true,
        as_default: true,
        cut: true,
        triggerer: Some(avatar),
    });
    cam.queue(CameraCommand::Region {
        camera: balcony,
        entering: true,
        as_default: false,
        cut: false,
        triggerer: Some(avatar),
    });
    run(&mut cam, 1);
    assert_eq!(cam.stack(), &[lobby_cam, balcony]);
    assert!(!cam.flags().contains(CameraFlags::CUT_NEXT_TRANS));

    cam.queue(CameraCommand::Region {
        camera: balcony,
        entering: false,
        as_default: false,
        cut: false,
        triggerer: Some(avatar),
    });
    run(&mut cam, 1);
    assert_eq!(cam.stack(), &[lobby_cam]);
}

// ============================================================================
// Subworlds
// ============================================================================

#[test]
fn test_camera_rides_avatar_subworld() {
    let mut scene = SceneGraph::new();
    let platform = scene.spawn("Elevator", Mat4::IDENTITY);
    let avatar = scene.spawn_child(platform, "Avatar", Mat4::IDENTITY);
    scene.set_local_player(Some(avatar));
    let mut cam = VirtualCamera::new(scene, Default::default());
    cam.set_render(true);
    cam.create_default_camera(avatar);
    run(&mut cam, 600);
    assert!(!cam.in_transition());
    let third = cam.third_person().expect("third person built");

    let avatar_pos = |cam: &VirtualCamera<SceneGraph>| {
        cam.scene()
            .local_to_world(avatar)
            .map(|m| m.w_axis.truncate())
            .expect("avatar loaded")
    };
    let before = cam.camera(third).expect("registered").state.pos - avatar_pos(&cam);

    cam.scene_mut().translate(platform, Vec3::new(0.0, 0.0, 8.0));
    run(&mut cam, 1);
    let after = cam.camera(third).expect("registered").state.pos - avatar_pos(&cam);

    assert!((after - before).length() < EPSILON);
}

// ============================================================================
// First Person Queries
// ============================================================================

#[test]
fn test_first_person_query_needs_override() {
    let Lobby { mut cam, avatar } = lobby();
    cam.create_default_camera(avatar);
    let fp = cam.default_first_person().expect("first person built");

    cam.set_cut_next_trans();
    cam.push_camera(fp, false);
    assert_eq!(cam.current_stack_camera(), Some(fp));
    assert!(!cam.is_first_person_camera());

    cam.toggle_first_person();
    assert!(cam.is_first_person_camera());
}

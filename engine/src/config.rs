//! Camera Configuration
//!
//! Global tuning for the camera controller plus authoring descriptors for
//! cameras. Everything loads from JSON and every field has a default, so a
//! config file only needs to name what it changes.
//!
//! ```json
//! {
//!   "pan_response_time": 2.0,
//!   "walk_pan_3rd_person": true,
//!   "fall": { "velocity": 60.0 }
//! }
//! ```

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::brain::CameraBrain;
use crate::camera::circle::CircleState;
use crate::camera::flags::BrainFlags;
use crate::camera::modifier::{AnimFlags, CameraModifier, FovInstruction};
use crate::camera::motion::SpeedLimits;
use crate::error::ConfigError;
use crate::scene::ObjectId;

/// Speed tuning used while the avatar is falling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallTuning {
    pub accel: f32,
    pub decel: f32,
    pub velocity: f32,
    pub poa_accel: f32,
    pub poa_decel: f32,
    pub poa_velocity: f32,
}

impl Default for FallTuning {
    fn default() -> Self {
        Self {
            accel: 20.0,
            decel: 5.0,
            velocity: 50.0,
            poa_accel: 10.0,
            poa_decel: 10.0,
            poa_velocity: 50.0,
        }
    }
}

/// Free-fly drive camera tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveTuning {
    pub turn_rate: f32,
    pub accel: f32,
    pub decel: f32,
    pub max_velocity: f32,
}

impl Default for DriveTuning {
    fn default() -> Self {
        Self {
            turn_rate: 100.0,
            accel: 200.0,
            decel: 200.0,
            max_velocity: 100.0,
        }
    }
}

/// Controller-wide camera tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Default horizontal FOV (degrees, authored for 4:3)
    pub fov_w: f32,
    /// Default vertical FOV (degrees)
    pub fov_h: f32,
    /// Output width / height
    pub aspect_ratio: f32,
    /// Replace every brain's speeds with the override speeds below
    pub use_accel_override: bool,
    pub override_accel: f32,
    pub override_decel: f32,
    pub override_velocity: f32,
    /// Seconds a panned view takes to recenter
    pub pan_response_time: f32,
    /// Seconds of falling before cameras switch to the falling view
    pub fall_timer_delay: f32,
    /// Walk-pan control also pans third-person cameras
    pub walk_pan_3rd_person: bool,
    /// Responders can never force the player out of first person
    pub stay_in_first_person_forever: bool,
    /// Every transition cuts
    pub always_cut: bool,
    /// Negate mouse deltas
    pub invert_mouse: bool,
    /// Pan limit of the built-in cameras (radians)
    pub first_person_pan_limit: f32,
    pub fall: FallTuning,
    pub drive: DriveTuning,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_w: 45.0,
            fov_h: 33.75,
            aspect_ratio: 4.0 / 3.0,
            use_accel_override: true,
            override_accel: 50.0,
            override_decel: 50.0,
            override_velocity: 100.0,
            pan_response_time: 3.0,
            fall_timer_delay: 0.25,
            walk_pan_3rd_person: false,
            stay_in_first_person_forever: false,
            always_cut: false,
            invert_mouse: false,
            first_person_pan_limit: 0.872,
            fall: FallTuning::default(),
            drive: DriveTuning::default(),
        }
    }
}

impl CameraConfig {
    /// Parse a config from JSON text and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::info!("loading camera config from {}", path.as_ref().display());
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the controller cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("fov_w", self.fov_w)?;
        positive("fov_h", self.fov_h)?;
        positive("aspect_ratio", self.aspect_ratio)?;
        positive("pan_response_time", self.pan_response_time)?;
        non_negative("fall_timer_delay", self.fall_timer_delay)?;
        non_negative("first_person_pan_limit", self.first_person_pan_limit)?;
        non_negative("override_accel", self.override_accel)?;
        non_negative("override_decel", self.override_decel)?;
        non_negative("override_velocity", self.override_velocity)?;
        non_negative("fall.accel", self.fall.accel)?;
        non_negative("fall.decel", self.fall.decel)?;
        non_negative("fall.velocity", self.fall.velocity)?;
        non_negative("fall.poa_accel", self.fall.poa_accel)?;
        non_negative("fall.poa_decel", self.fall.poa_decel)?;
        non_negative("fall.poa_velocity", self.fall.poa_velocity)?;
        non_negative("drive.turn_rate", self.drive.turn_rate)?;
        non_negative("drive.accel", self.drive.accel)?;
        non_negative("drive.decel", self.drive.decel)?;
        non_negative("drive.max_velocity", self.drive.max_velocity)?;
        Ok(())
    }

    /// Override speeds, when enabled.
    pub fn accel_override(&self) -> Option<SpeedLimits> {
        self.use_accel_override.then(|| {
            SpeedLimits::new(self.override_accel, self.override_decel, self.override_velocity)
        })
    }

    pub fn fall_limits(&self) -> SpeedLimits {
        SpeedLimits::new(self.fall.accel, self.fall.decel, self.fall.velocity)
    }

    pub fn fall_poa_limits(&self) -> SpeedLimits {
        SpeedLimits::new(self.fall.poa_accel, self.fall.poa_decel, self.fall.poa_velocity)
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must not be negative, got {value}"),
        })
    }
}

// ============================================================================
// AUTHORING DESCRIPTORS
// ============================================================================

/// Behaviour switches as authored. Unset switches are off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainSwitches {
    pub cut_pos: bool,
    pub cut_poa: bool,
    pub non_phys: bool,
    pub maintain_los: bool,
    pub worldspace_pos: bool,
    pub worldspace_poa: bool,
    pub follow_local_avatar: bool,
    pub vertical_when_falling: bool,
    pub speed_up_when_running: bool,
}

impl BrainSwitches {
    fn flags(self) -> BrainFlags {
        let mut flags = BrainFlags::empty();
        flags.set(BrainFlags::CUT_POS, self.cut_pos);
        flags.set(BrainFlags::CUT_POA, self.cut_poa);
        flags.set(BrainFlags::NON_PHYS, self.non_phys);
        flags.set(BrainFlags::MAINTAIN_LOS, self.maintain_los);
        flags.set(BrainFlags::WORLDSPACE_POS, self.worldspace_pos);
        flags.set(BrainFlags::WORLDSPACE_POA, self.worldspace_poa);
        flags.set(BrainFlags::FOLLOW_LOCAL_AVATAR, self.follow_local_avatar);
        flags.set(BrainFlags::VERTICAL_WHEN_FALLING, self.vertical_when_falling);
        flags.set(BrainFlags::SPEED_UP_WHEN_RUNNING, self.speed_up_when_running);
        flags
    }
}

/// Telescope zoom range, vertical FOV in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoomDesc {
    pub max: f32,
    pub min: f32,
    pub rate: f32,
}

/// Which brain behaviour an authored camera uses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrainType {
    Basic,
    Fixed {
        /// Name of a camera whose goal this one looks at
        #[serde(default)]
        target_point: Option<String>,
    },
    Avatar,
    FirstPerson,
    Circle {
        #[serde(default)]
        center: Vec3,
        #[serde(default)]
        center_object: Option<String>,
        #[serde(default)]
        poa_object: Option<String>,
        radius: f32,
        circles_per_sec: f32,
        #[serde(default)]
        farthest: bool,
        #[serde(default)]
        local_avatar: bool,
    },
}

fn default_speed() -> f32 {
    30.0
}

/// An authored brain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrainDesc {
    #[serde(flatten)]
    pub kind: BrainType,
    /// Name of the object to follow or look at
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub offset: Vec3,
    #[serde(default)]
    pub poa_offset: Vec3,
    #[serde(default = "default_speed")]
    pub accel: f32,
    #[serde(default = "default_speed")]
    pub decel: f32,
    #[serde(default = "default_speed")]
    pub velocity: f32,
    #[serde(default = "default_speed")]
    pub poa_accel: f32,
    #[serde(default = "default_speed")]
    pub poa_decel: f32,
    #[serde(default = "default_speed")]
    pub poa_velocity: f32,
    /// Horizontal pan limit (radians)
    #[serde(default)]
    pub x_pan_limit: f32,
    /// Vertical pan limit (radians)
    #[serde(default)]
    pub z_pan_limit: f32,
    #[serde(default)]
    pub zoom: Option<ZoomDesc>,
    #[serde(default)]
    pub switches: BrainSwitches,
}

impl BrainDesc {
    pub fn new(kind: BrainType) -> Self {
        Self {
            kind,
            subject: None,
            offset: Vec3::ZERO,
            poa_offset: Vec3::ZERO,
            accel: default_speed(),
            decel: default_speed(),
            velocity: default_speed(),
            poa_accel: default_speed(),
            poa_decel: default_speed(),
            poa_velocity: default_speed(),
            x_pan_limit: 0.0,
            z_pan_limit: 0.0,
            zoom: None,
            switches: BrainSwitches::default(),
        }
    }

    /// Build the brain. Camera references (a fixed brain's target point) are
    /// left unresolved.
    pub fn build(&self, find_object: &dyn Fn(&str) -> Option<ObjectId>) -> CameraBrain {
        let mut brain = match &self.kind {
            BrainType::Basic => CameraBrain::basic(),
            BrainType::Fixed { .. } => CameraBrain::fixed(),
            BrainType::Avatar => CameraBrain::avatar(),
            BrainType::FirstPerson => CameraBrain::first_person(),
            BrainType::Circle {
                center,
                center_object,
                poa_object,
                radius,
                circles_per_sec,
                farthest,
                local_avatar,
            } => {
                let mut circle = CircleState::new(*center, *radius, *circles_per_sec);
                circle.center_object = center_object.as_deref().and_then(find_object);
                circle.poa_object = poa_object.as_deref().and_then(find_object);
                circle.farthest = *farthest;
                circle.local_avatar = *local_avatar;
                CameraBrain::circle(circle)
            }
        };

        let core = &mut brain.core;
        core.flags.insert(self.switches.flags());
        core.subject = self.subject.as_deref().and_then(find_object);
        core.offset = self.offset;
        core.poa_offset = self.poa_offset;
        core.pos_limits = SpeedLimits::new(self.accel, self.decel, self.velocity);
        core.poa_limits = SpeedLimits::new(self.poa_accel, self.poa_decel, self.poa_velocity);
        core.x_pan_limit = self.x_pan_limit;
        core.z_pan_limit = self.z_pan_limit;
        if let Some(zoom) = self.zoom {
            brain.set_zoom_params(zoom.max, zoom.min, zoom.rate);
        }
        brain
    }

    fn validate(&self, camera: &str) -> Result<(), ConfigError> {
        for (field, value) in [
            ("brain.accel", self.accel),
            ("brain.decel", self.decel),
            ("brain.velocity", self.velocity),
            ("brain.poa_accel", self.poa_accel),
            ("brain.poa_decel", self.poa_decel),
            ("brain.poa_velocity", self.poa_velocity),
        ] {
            non_negative(field, value).map_err(|e| with_camera(e, camera))?;
        }
        if let BrainType::Circle { radius, .. } = &self.kind {
            positive("brain.radius", *radius).map_err(|e| with_camera(e, camera))?;
        }
        Ok(())
    }
}

fn with_camera(err: ConfigError, camera: &str) -> ConfigError {
    match err {
        ConfigError::Invalid { field, reason } => ConfigError::Invalid {
            field,
            reason: format!("{reason} (camera '{camera}')"),
        },
        other => other,
    }
}

/// An authored transition override.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransDesc {
    /// Name of the camera being replaced; absent applies to any camera
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default = "default_trans_speed")]
    pub accel: f32,
    #[serde(default = "default_trans_speed")]
    pub decel: f32,
    #[serde(default = "default_trans_speed")]
    pub velocity: f32,
    #[serde(default = "default_trans_speed")]
    pub poa_accel: f32,
    #[serde(default = "default_trans_speed")]
    pub poa_decel: f32,
    #[serde(default = "default_trans_speed")]
    pub poa_velocity: f32,
    #[serde(default)]
    pub cut_pos: bool,
    #[serde(default)]
    pub cut_poa: bool,
    #[serde(default)]
    pub ignore: bool,
}

fn default_trans_speed() -> f32 {
    crate::camera::modifier::TRANS_DEFAULT_SPEED
}

/// An authored camera.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraDesc {
    pub name: String,
    /// Name of the object the camera sits on
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub fov_w: Option<f32>,
    #[serde(default)]
    pub fov_h: Option<f32>,
    pub brain: BrainDesc,
    #[serde(default)]
    pub transitions: Vec<TransDesc>,
    #[serde(default)]
    pub fov_instructions: Vec<FovInstruction>,
    #[serde(default)]
    pub anim: AnimFlags,
}

impl CameraDesc {
    /// Build the modifier. Transitions and camera references are resolved
    /// once every camera is registered.
    pub fn build(
        &self,
        config: &CameraConfig,
        find_object: &dyn Fn(&str) -> Option<ObjectId>,
    ) -> CameraModifier {
        let target = self.target.as_deref().and_then(find_object);
        if self.target.is_some() && target.is_none() {
            log::warn!("camera '{}': target object not found", self.name);
        }

        let mut cam = CameraModifier::new(self.name.clone(), target)
            .with_brain(self.brain.build(find_object))
            .with_fov(
                self.fov_w.unwrap_or(config.fov_w),
                self.fov_h.unwrap_or(config.fov_h),
            );
        cam.fov_instructions = self.fov_instructions.clone();
        cam.fov_instructions.sort_by(|a, b| a.at.total_cmp(&b.at));
        cam.anim = self.anim;
        cam
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(w) = self.fov_w {
            positive("fov_w", w).map_err(|e| with_camera(e, &self.name))?;
        }
        if let Some(h) = self.fov_h {
            positive("fov_h", h).map_err(|e| with_camera(e, &self.name))?;
        }
        self.brain.validate(&self.name)
    }
}

/// A set of authored cameras, in registration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDesc {
    #[serde(default)]
    pub config: CameraConfig,
    pub cameras: Vec<CameraDesc>,
}

impl SceneDesc {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let desc: Self = serde_json::from_str(json)?;
        desc.validate()?;
        Ok(desc)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Validate values and that every camera reference names a camera.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        let known = |name: &str| self.cameras.iter().any(|c| c.name.eq_ignore_ascii_case(name));

        for cam in &self.cameras {
            cam.validate()?;
            let mut refs: Vec<&str> = cam.transitions.iter().filter_map(|t| t.from.as_deref()).collect();
            if let BrainType::Fixed {
                target_point: Some(name),
            } = &cam.brain.kind
            {
                refs.push(name);
            }
            if let Some(name) = refs.into_iter().find(|name| !known(name)) {
                return Err(ConfigError::UnknownReference {
                    camera: cam.name.clone(),
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

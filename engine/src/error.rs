//! Error Types
//!
//! Per-frame camera work never fails; these cover configuration loading and
//! handle-checked camera registration.

use thiserror::Error;

use crate::camera::CameraId;

/// Errors loading or validating camera configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("camera '{camera}' references unknown camera '{name}'")]
    UnknownReference { camera: String, name: String },
}

/// Errors from the camera controller's registration API.
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("unknown camera {0:?}")]
    UnknownCamera(CameraId),

    #[error("camera {0:?} has no brain")]
    NoBrain(CameraId),

    #[error("built-in camera {0:?} cannot be removed")]
    BuiltIn(CameraId),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, CameraError>;

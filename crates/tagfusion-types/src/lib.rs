//! `tagfusion-types` – shared vocabulary for the tagfusion workspace.
//!
//! # Modules
//!
//! - [`geometry`] – planar [`Pose2d`], [`Translation2d`] and [`Rotation2d`]
//!   value types.
//! - [`config`] – per-camera [`CameraConfig`] records and the engine-wide
//!   [`FusionConfig`].
//! - [`layout`] – the field [`TagLayout`] (tag id → placement).
//! - [`result`] – per-tick [`PerCameraResult`] and [`FusionResult`] output.

use thiserror::Error;

pub mod config;
pub mod geometry;
pub mod layout;
pub mod result;

pub use config::{CameraConfig, FusionConfig};
pub use geometry::{Pose2d, Rotation2d, Translation2d};
pub use layout::{TagLayout, TagPose};
pub use result::{
    CameraStatus, DetectionGuidance, FusionResult, Guidance, Movement, PerCameraResult,
    PoseCrossCheck, PoseSource, Reading,
};

/// Feet to metres.
pub const METRES_PER_FOOT: f64 = 0.3048;

/// Errors raised at the fallible edges of the workspace (configuration and
/// recording I/O).  The fusion engine itself never fails.
#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Recording Error on line {line}: {details}")]
    Recording { line: usize, details: String },

    #[error("I/O Error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

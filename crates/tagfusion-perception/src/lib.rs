//! `tagfusion-perception` – the pose-fusion and alignment-guidance engine.
//!
//! Turns raw per-camera fiducial telemetry into range estimates, movement
//! corrections, human-readable commands and a fused robot pose.
//!
//! # Modules
//!
//! - [`range`] – corner-area distance model, lateral-offset correction to the
//!   robot centre, and the auxiliary height/pitch and target-pose ranges.
//! - [`guidance`] – forward/strafe/rotation decomposition, the alignment
//!   verdict and command synthesis.
//! - [`pose`] – camera-reported pose parsing and the manual back-projection
//!   from a tag of known placement.
//! - [`detections`] – decoder for the flat object-detection array.
//! - [`camera`] – [`CameraPipeline`][camera::CameraPipeline]: one camera's
//!   freshness state machine (`Ok` / `Degraded` / `Lost`) over its private
//!   [`CameraState`][camera::CameraState] cache.
//! - [`fusion`] – [`MultiCameraFusion`][fusion::MultiCameraFusion]: runs every
//!   camera each tick and fuses pose, distance and confidence, flagging
//!   occlusion.

pub mod camera;
pub mod detections;
pub mod fusion;
pub mod guidance;
pub mod pose;
pub mod range;

pub use camera::{CameraPipeline, CameraState, StepContext};
pub use fusion::{CameraId, MultiCameraFusion};

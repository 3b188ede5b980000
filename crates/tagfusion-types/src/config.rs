//! Per-camera calibration records and the engine-wide fusion settings.
//!
//! Both types deserialize with per-field defaults so that a settings source
//! only needs to name a camera to get a usable record.

use serde::{Deserialize, Serialize};

/// Confidence multiplier applied when a camera runs on cached data.
pub const DEFAULT_DROPOUT_SCALE: f64 = 0.6;

/// Recency window (seconds) within which all-cameras-lost counts as occlusion.
pub const DEFAULT_OCCLUSION_WINDOW_S: f64 = 0.15;

/// Immutable calibration and tuning record for one physical camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Unique camera name; also the telemetry key prefix (`<name>/tv`, ...).
    #[serde(default = "default_name")]
    pub name: String,
    /// Desired standoff from the target, measured from the robot centre.
    #[serde(default = "default_target_distance", alias = "target_distance")]
    pub target_distance_feet: f64,
    #[serde(default = "default_angle_tolerance", alias = "angle_tolerance")]
    pub angle_tolerance_deg: f64,
    #[serde(default = "default_distance_tolerance", alias = "distance_tolerance")]
    pub distance_tolerance_feet: f64,
    /// Horizontal mount angle relative to the robot's forward axis.
    #[serde(
        default = "default_mount_angle_horizontal",
        alias = "mount_angle_horizontal",
        alias = "mount_angle_x_deg"
    )]
    pub mount_angle_horizontal_deg: f64,
    /// Vertical mount angle; also the base angle of the height/pitch range.
    #[serde(
        default = "default_mount_angle_vertical",
        alias = "mount_angle_vertical",
        alias = "mount_angle_y_deg"
    )]
    pub mount_angle_vertical_deg: f64,
    #[serde(
        default = "default_mount_height",
        alias = "mount_height",
        alias = "height_inches"
    )]
    pub mount_height_inches: f64,
    /// Lateral offset of the lens from the robot centre.
    #[serde(default = "default_offset_x", alias = "offset_x")]
    pub offset_x_inches: f64,
    /// Forward offset of the lens from the robot centre.
    #[serde(default = "default_offset_y", alias = "offset_y")]
    pub offset_y_inches: f64,
    /// Camera reports `tx` with the opposite horizontal sign convention.
    #[serde(default, alias = "mirror_flag")]
    pub mirror_tx: bool,
}

/// Name given to a camera record that does not carry one.
pub const DEFAULT_CAMERA_NAME: &str = "limelight";

fn default_name() -> String {
    DEFAULT_CAMERA_NAME.to_string()
}

fn default_target_distance() -> f64 {
    2.0
}
fn default_angle_tolerance() -> f64 {
    2.0
}
fn default_distance_tolerance() -> f64 {
    0.3
}
fn default_mount_angle_horizontal() -> f64 {
    40.0
}
fn default_mount_angle_vertical() -> f64 {
    99.846552
}
fn default_mount_height() -> f64 {
    9.5
}
fn default_offset_x() -> f64 {
    8.41
}
fn default_offset_y() -> f64 {
    11.6
}

impl CameraConfig {
    /// A camera with every tuning field at its default.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_distance_feet: default_target_distance(),
            angle_tolerance_deg: default_angle_tolerance(),
            distance_tolerance_feet: default_distance_tolerance(),
            mount_angle_horizontal_deg: default_mount_angle_horizontal(),
            mount_angle_vertical_deg: default_mount_angle_vertical(),
            mount_height_inches: default_mount_height(),
            offset_x_inches: default_offset_x(),
            offset_y_inches: default_offset_y(),
            mirror_tx: false,
        }
    }

    /// The built-in two-camera layout: a left camera and a mirrored right
    /// camera with the lateral offset reflected.
    pub fn default_pair() -> Vec<Self> {
        vec![
            Self {
                offset_x_inches: 8.41,
                ..Self::named("limelight-left")
            },
            Self {
                offset_x_inches: -8.41,
                mirror_tx: true,
                ..Self::named("limelight-right")
            },
        ]
    }
}

/// Engine-wide configuration handed to the fusion engine at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    pub cameras: Vec<CameraConfig>,
    /// Confidence and motion multiplier for cameras running on cached data.
    pub dropout_scale: f64,
    /// Seconds after the last good reading during which all-lost is treated
    /// as transient occlusion rather than a stale sensor.
    pub occlusion_window_s: f64,
}

impl FusionConfig {
    /// Build a configuration from a settings source.
    ///
    /// An empty camera list falls back to [`CameraConfig::default_pair`].
    /// `dropout_scale` is clamped to `[0, 1]` and a negative window to zero.
    pub fn with_cameras(
        cameras: Vec<CameraConfig>,
        dropout_scale: f64,
        occlusion_window_s: f64,
    ) -> Self {
        let cameras = if cameras.is_empty() {
            CameraConfig::default_pair()
        } else {
            cameras
        };
        Self {
            cameras,
            dropout_scale: clamp_dropout_scale(dropout_scale),
            occlusion_window_s: clamp_occlusion_window(occlusion_window_s),
        }
    }
}

/// Clamp to `[0, 1]`; a non-finite value becomes [`DEFAULT_DROPOUT_SCALE`].
pub fn clamp_dropout_scale(scale: f64) -> f64 {
    if scale.is_finite() {
        scale.clamp(0.0, 1.0)
    } else {
        DEFAULT_DROPOUT_SCALE
    }
}

/// Clamp to `>= 0`; a non-finite value becomes [`DEFAULT_OCCLUSION_WINDOW_S`].
pub fn clamp_occlusion_window(window_s: f64) -> f64 {
    if window_s.is_finite() {
        window_s.max(0.0)
    } else {
        DEFAULT_OCCLUSION_WINDOW_S
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self::with_cameras(
            Vec::new(),
            DEFAULT_DROPOUT_SCALE,
            DEFAULT_OCCLUSION_WINDOW_S,
        )
    }
}

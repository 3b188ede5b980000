//! Telemetry key naming scheme.
//!
//! Every camera publishes under its own name prefix: `<name>/<field>`.
//! [`CameraKeys`] builds the full key strings once so the per-tick path does
//! no formatting.

/// Target-valid flag (`1.0` when a target is locked).
pub const TV: &str = "tv";
/// Horizontal angle to target, degrees.
pub const TX: &str = "tx";
/// Vertical angle to target, degrees.
pub const TY: &str = "ty";
/// Apparent target area, percent of image.
pub const TA: &str = "ta";
/// Image-space corners, 8 floats.
pub const TCORNXY: &str = "tcornxy";
/// Primary tag id (`-1` for none).
pub const TID: &str = "tid";
/// Object-detection records, stride 13.
pub const RAW_DETECTIONS: &str = "rawdetections";
/// Reported robot pose, generic frame.
pub const BOTPOSE: &str = "botpose";
/// Reported robot pose, blue-alliance frame.
pub const BOTPOSE_BLUE: &str = "botpose_wpiblue";
/// Reported robot pose, red-alliance frame.
pub const BOTPOSE_RED: &str = "botpose_wpired";
/// Target pose in robot space (x, y, z, ...).
pub const TARGETPOSE_ROBOTSPACE: &str = "targetpose_robotspace";

/// Join a camera name and field into a telemetry key.
pub fn entry_key(camera: &str, field: &str) -> String {
    format!("{camera}/{field}")
}

/// Precomputed telemetry keys for one camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraKeys {
    pub tv: String,
    pub tx: String,
    pub ty: String,
    pub ta: String,
    pub corners: String,
    pub tag_id: String,
    pub raw_detections: String,
    /// Reported-pose keys in lookup priority order.
    pub botpose: [String; 3],
    pub targetpose_robotspace: String,
}

impl CameraKeys {
    pub fn new(camera: &str) -> Self {
        Self {
            tv: entry_key(camera, TV),
            tx: entry_key(camera, TX),
            ty: entry_key(camera, TY),
            ta: entry_key(camera, TA),
            corners: entry_key(camera, TCORNXY),
            tag_id: entry_key(camera, TID),
            raw_detections: entry_key(camera, RAW_DETECTIONS),
            botpose: [
                entry_key(camera, BOTPOSE),
                entry_key(camera, BOTPOSE_BLUE),
                entry_key(camera, BOTPOSE_RED),
            ],
            targetpose_robotspace: entry_key(camera, TARGETPOSE_ROBOTSPACE),
        }
    }
}

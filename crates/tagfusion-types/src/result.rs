//! Per-tick output of the fusion engine.

use serde::{Deserialize, Serialize};

use crate::geometry::Pose2d;

/// Freshness of a camera's data on the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraStatus {
    /// A fresh valid measurement arrived this tick.
    Ok,
    /// No measurement; guidance is computed from the cached last-good reading.
    Degraded,
    /// No measurement and nothing usable in the cache.
    Lost,
}

impl std::fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            CameraStatus::Ok => "ok",
            CameraStatus::Degraded => "degraded",
            CameraStatus::Lost => "lost",
        })
    }
}

/// Raw angular/area reading as published by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub tx_deg: f64,
    pub ty_deg: f64,
    pub ta_percent: f64,
}

/// Range breakdown and the correction needed to reach the standoff distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Lens-to-target distance from the area model.
    pub camera_distance_feet: f64,
    /// Robot-centre-to-target distance before the calibration bias.
    pub robot_center_distance_feet: f64,
    /// Robot-centre distance with the calibration bias applied.
    pub current_distance_feet: f64,
    pub target_distance_feet: f64,
    pub horizontal_angle_error_deg: f64,
    pub forward_feet: f64,
    pub strafe_feet: f64,
    pub rotation_deg: f64,
}

/// Movement plus the human-readable instruction and alignment verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guidance {
    pub movement: Movement,
    pub command: String,
    pub aligned: bool,
}

/// Which method produced a camera's resolved pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoseSource {
    /// Pose published directly by the camera.
    Reported,
    /// Pose back-projected from the tag layout.
    Manual,
}

/// Disagreement between the camera-reported and manually computed pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseCrossCheck {
    pub reported: Pose2d,
    pub manual: Pose2d,
    pub dx_m: f64,
    pub dy_m: f64,
    pub drot_deg: f64,
}

impl PoseCrossCheck {
    pub fn between(reported: Pose2d, manual: Pose2d) -> Self {
        Self {
            reported,
            manual,
            dx_m: manual.x() - reported.x(),
            dy_m: manual.y() - reported.y(),
            drot_deg: manual.rotation().degrees() - reported.rotation().degrees(),
        }
    }
}

/// Guidance recomputed from the first object-detection record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionGuidance {
    pub id: f64,
    pub reading: Reading,
    pub guidance: Guidance,
}

/// Everything one camera contributed on one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerCameraResult {
    pub camera: String,
    pub tag_id: Option<i32>,
    pub status: CameraStatus,
    pub confidence_scale: f64,
    pub reading: Option<Reading>,
    pub guidance: Option<Guidance>,
    pub pose: Option<Pose2d>,
    pub pose_source: Option<PoseSource>,
    pub cross_check: Option<PoseCrossCheck>,
    /// Norm of the camera's target-in-robot-space vector.
    pub target_distance_m: Option<f64>,
    /// Height/pitch range estimate, independent of the area model.
    pub secondary_distance_feet: Option<f64>,
    pub detection: Option<DetectionGuidance>,
}

impl PerCameraResult {
    /// The minimal record reported for a camera with nothing to offer.
    pub fn lost(camera: impl Into<String>, tag_id: Option<i32>) -> Self {
        Self {
            camera: camera.into(),
            tag_id,
            status: CameraStatus::Lost,
            confidence_scale: 0.0,
            reading: None,
            guidance: None,
            pose: None,
            pose_source: None,
            cross_check: None,
            target_distance_m: None,
            secondary_distance_feet: None,
            detection: None,
        }
    }

    pub fn aligned(&self) -> bool {
        self.guidance.as_ref().is_some_and(|g| g.aligned)
    }

    pub fn command(&self) -> Option<&str> {
        self.guidance.as_ref().map(|g| g.command.as_str())
    }
}

/// The robot-level estimate for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    /// Per-camera results in configuration order.
    pub cameras: Vec<PerCameraResult>,
    pub final_pose: Option<Pose2d>,
    pub final_distance_m: Option<f64>,
    pub final_secondary_distance_m: Option<f64>,
    /// Minimum confidence across cameras; zero while occluded.
    pub confidence_scale: f64,
    pub occlusion: bool,
}

impl FusionResult {
    pub fn camera(&self, name: &str) -> Option<&PerCameraResult> {
        self.cameras.iter().find(|c| c.camera == name)
    }
}

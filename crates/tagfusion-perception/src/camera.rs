//! Per-camera pipeline.
//!
//! One [`CameraPipeline`] exists per configured camera.  Each tick it reads
//! the camera's telemetry, resolves freshness against its private
//! [`CameraState`] cache, and produces a [`PerCameraResult`].
//!
//! # Freshness
//!
//! | Condition | Status | Confidence |
//! |---|---|---|
//! | `tv == 1` and ≥ 8 corner values | [`CameraStatus::Ok`] | 1 |
//! | otherwise, cache complete | [`CameraStatus::Degraded`] | dropout scale |
//! | otherwise | [`CameraStatus::Lost`] | 0 |
//!
//! A degraded tick reuses the cached corners, `tx` and tag id, and scales the
//! forward/strafe/rotation corrections by the dropout scale.  The cache is
//! only refreshed by `Ok` ticks.

use tagfusion_middleware::{CameraKeys, TelemetrySource};
use tagfusion_types::{
    CameraConfig, CameraStatus, DetectionGuidance, PerCameraResult, Pose2d, PoseCrossCheck,
    PoseSource, Reading, TagLayout,
};
use tracing::debug;

use crate::{detections, guidance, pose, range};

/// Corner array substituted when the camera publishes none.
const NO_CORNERS: [f64; 8] = [0.0; 8];

// ────────────────────────────────────────────────────────────────────────────
// Cache
// ────────────────────────────────────────────────────────────────────────────

/// Last-known-good data for one camera.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraState {
    /// Pose resolved on the most recent `Ok` tick that resolved one.
    pub last_pose: Option<Pose2d>,
    /// Time of the most recent valid measurement.
    pub last_seen_s: Option<f64>,
    pub last_corners: Option<[f64; 8]>,
    pub last_tx_deg: Option<f64>,
    pub last_tag: Option<i32>,
}

/// Cached reading a degraded tick runs on.
struct CachedReading {
    corners: [f64; 8],
    tx_deg: f64,
    tag: i32,
}

impl CameraState {
    /// Whether the last valid measurement is younger than `window_s`.
    /// A camera never seen is never recent.
    pub fn is_recent(&self, now_s: f64, window_s: f64) -> bool {
        self.last_seen_s.is_some_and(|seen| now_s - seen < window_s)
    }

    fn refresh(&mut self, now_s: f64, corners: [f64; 8], tx_deg: f64, tag: Option<i32>) {
        self.last_seen_s = Some(now_s);
        self.last_corners = Some(corners);
        self.last_tx_deg = Some(tx_deg);
        self.last_tag = tag;
    }

    /// The cached reading, when every piece a degraded tick needs is present.
    fn cached(&self) -> Option<CachedReading> {
        self.last_pose?;
        Some(CachedReading {
            corners: self.last_corners?,
            tx_deg: self.last_tx_deg?,
            tag: self.last_tag?,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Engine-wide inputs shared by every camera on a tick.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub layout: &'a TagLayout,
    pub dropout_scale: f64,
}

/// Converts a raw `tid` value; negative ids mean "no tag".
fn tag_from_raw(raw: f64) -> Option<i32> {
    if raw.is_finite() && raw >= 0.0 {
        Some(raw as i32)
    } else {
        None
    }
}

fn first_corners(values: &[f64]) -> Option<[f64; 8]> {
    values.get(..8)?.try_into().ok()
}

/// Telemetry → [`PerCameraResult`] for one camera.
#[derive(Debug, Clone)]
pub struct CameraPipeline {
    config: CameraConfig,
    keys: CameraKeys,
    state: CameraState,
    last_status: Option<CameraStatus>,
}

impl CameraPipeline {
    pub fn new(config: CameraConfig) -> Self {
        let keys = CameraKeys::new(&config.name);
        Self {
            config,
            keys,
            state: CameraState::default(),
            last_status: None,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    /// Run one tick for this camera.
    pub fn step<S>(&mut self, source: &S, ctx: &StepContext<'_>, now_s: f64) -> PerCameraResult
    where
        S: TelemetrySource + ?Sized,
    {
        let result = self.evaluate(source, ctx, now_s);
        if self.last_status != Some(result.status) {
            debug!(
                camera = %self.config.name,
                from = ?self.last_status,
                to = %result.status,
                "camera status changed"
            );
            self.last_status = Some(result.status);
        }
        result
    }

    fn evaluate<S>(&mut self, source: &S, ctx: &StepContext<'_>, now_s: f64) -> PerCameraResult
    where
        S: TelemetrySource + ?Sized,
    {
        let cam = &self.config;
        let keys = &self.keys;

        let tv = source.read_scalar(&keys.tv, 0.0);
        let tx = source.read_scalar(&keys.tx, 0.0);
        let ty = source.read_scalar(&keys.ty, 0.0);
        let ta = source.read_scalar(&keys.ta, 0.0);
        let corners = source.read_sequence(&keys.corners, &NO_CORNERS);
        let tag_id = tag_from_raw(source.read_scalar(&keys.tag_id, -1.0));
        let raw_detections = source.read_sequence(&keys.raw_detections, &[]);

        let fresh = if tv == 1.0 { first_corners(&corners) } else { None };

        let (status, tx, corners, tag_id, confidence) = match fresh {
            Some(corners) => {
                self.state.refresh(now_s, corners, tx, tag_id);
                (CameraStatus::Ok, tx, corners, tag_id, 1.0)
            }
            None => match self.state.cached() {
                Some(cached) => (
                    CameraStatus::Degraded,
                    cached.tx_deg,
                    cached.corners,
                    Some(cached.tag),
                    ctx.dropout_scale,
                ),
                None => return PerCameraResult::lost(cam.name.clone(), tag_id),
            },
        };

        // Guidance from the primary reading.
        let mut movement = guidance::movement(cam, &range::estimate(cam, tx, &corners));
        if status == CameraStatus::Degraded {
            guidance::scale_corrections(&mut movement, ctx.dropout_scale);
        }
        let primary = guidance::guide(cam, movement);

        // Auxiliary distances.
        let target_distance_m =
            range::target_distance(&source.read_sequence(&keys.targetpose_robotspace, &[]));
        let tag = tag_id.and_then(|id| ctx.layout.get(id));
        let secondary_distance_feet = tag
            .and_then(|t| t.height_inches())
            .and_then(|height| range::secondary_distance_feet(cam, height, ty));

        // Pose: reported first, manual as fallback; both kept for cross-checking.
        let reported = keys
            .botpose
            .iter()
            .find_map(|key| pose::parse_reported(&source.read_sequence(key, &[])));
        let manual = tag.map(|t| pose::manual_pose(cam, tx, &corners, t));
        let (resolved, pose_source) = match (reported, manual) {
            (Some(p), _) => (Some(p), Some(PoseSource::Reported)),
            (None, Some(p)) => (Some(p), Some(PoseSource::Manual)),
            (None, None) => (None, None),
        };
        if status == CameraStatus::Ok && resolved.is_some() {
            self.state.last_pose = resolved;
        }
        let cross_check = reported
            .zip(manual)
            .map(|(reported, manual)| PoseCrossCheck::between(reported, manual));

        // Redundant guidance from the first object detection, unscaled.
        let detection = detections::first(&raw_detections).map(|det| DetectionGuidance {
            id: det.id,
            reading: det.reading(),
            guidance: guidance::guide(
                cam,
                guidance::movement(cam, &range::estimate(cam, det.tx_deg, &det.corners)),
            ),
        });

        PerCameraResult {
            camera: cam.name.clone(),
            tag_id,
            status,
            confidence_scale: confidence,
            reading: Some(Reading {
                tx_deg: tx,
                ty_deg: ty,
                ta_percent: ta,
            }),
            guidance: Some(primary),
            pose: resolved,
            pose_source,
            cross_check,
            target_distance_m,
            secondary_distance_feet,
            detection,
        }
    }
}

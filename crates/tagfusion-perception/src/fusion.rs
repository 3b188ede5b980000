//! Multi-camera fusion engine.
//!
//! Combines every camera's per-tick [`PerCameraResult`] into one robot-level
//! [`FusionResult`]:
//!
//! - **Pose** – arithmetic mean of x, y and heading (degrees) over cameras
//!   that resolved a pose.  Headings are averaged linearly, with no
//!   wraparound handling near ±180°.
//! - **Distance** – mean of each camera's best range: the target-in-robot-
//!   space norm when published, otherwise the area-model range in metres.
//! - **Secondary distance** – mean of the height/pitch ranges, in metres.
//! - **Confidence** – minimum over cameras, so one degraded or lost camera
//!   pulls the robot-wide scale down.
//! - **Occlusion** – every camera lost while every camera was last seen
//!   within the occlusion window.  Confidence is forced to zero.
//!
//! # Example
//!
//! ```rust
//! use tagfusion_middleware::SnapshotStore;
//! use tagfusion_perception::fusion::MultiCameraFusion;
//! use tagfusion_types::{FusionConfig, TagLayout};
//!
//! let store = SnapshotStore::new();
//! let mut engine = MultiCameraFusion::new(&store, TagLayout::new(), FusionConfig::default());
//!
//! store.publish_scalar("limelight-left/tv", 1.0);
//! store.publish_sequence("limelight-left/tcornxy", vec![0.0, 0.0, 40.0, 0.0, 40.0, 40.0, 0.0, 40.0]);
//! store.publish_sequence("limelight-left/botpose", vec![1.0, 2.0, 0.0, 0.0, 0.0, 10.0]);
//!
//! let result = engine.step(0.0);
//! assert_eq!(result.cameras.len(), 2);
//! assert!(result.final_pose.is_some());
//! // The right camera sees nothing, so the robot-wide scale drops to zero.
//! assert_eq!(result.confidence_scale, 0.0);
//! ```

use tagfusion_middleware::TelemetrySource;
use tagfusion_types::config::{clamp_dropout_scale, clamp_occlusion_window};
use tagfusion_types::{
    CameraConfig, CameraStatus, FusionConfig, FusionResult, METRES_PER_FOOT, PerCameraResult,
    Pose2d, TagLayout,
};
use tracing::{info, trace, warn};

use crate::camera::{CameraPipeline, CameraState, StepContext};

// ────────────────────────────────────────────────────────────────────────────
// Camera arena
// ────────────────────────────────────────────────────────────────────────────

/// Index of a camera in the engine, assigned in configuration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(usize);

impl CameraId {
    pub fn index(self) -> usize {
        self.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregation
// ────────────────────────────────────────────────────────────────────────────

/// Running means of the fused quantities.
#[derive(Default)]
struct Accumulator {
    pose_x: Vec<f64>,
    pose_y: Vec<f64>,
    pose_rot_deg: Vec<f64>,
    distances_m: Vec<f64>,
    secondary_m: Vec<f64>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

impl Accumulator {
    fn add(&mut self, result: &PerCameraResult) {
        if let Some(pose) = result.pose {
            self.pose_x.push(pose.x());
            self.pose_y.push(pose.y());
            self.pose_rot_deg.push(pose.rotation().degrees());
        }
        let best_distance = result.target_distance_m.or_else(|| {
            result
                .guidance
                .as_ref()
                .map(|g| g.movement.current_distance_feet * METRES_PER_FOOT)
        });
        if let Some(d) = best_distance {
            self.distances_m.push(d);
        }
        if let Some(d) = result.secondary_distance_feet {
            self.secondary_m.push(d * METRES_PER_FOOT);
        }
    }

    fn final_pose(&self) -> Option<Pose2d> {
        Some(Pose2d::from_xy_degrees(
            mean(&self.pose_x)?,
            mean(&self.pose_y)?,
            mean(&self.pose_rot_deg)?,
        ))
    }
}

/// Fuse one tick's per-camera results.
///
/// `all_recent` states whether every camera was last seen within the
/// occlusion window; combined with every camera being lost it marks the tick
/// as occluded.
pub fn aggregate(cameras: Vec<PerCameraResult>, all_recent: bool) -> FusionResult {
    let mut acc = Accumulator::default();
    let mut confidence: f64 = 1.0;
    for result in &cameras {
        acc.add(result);
        confidence = confidence.min(result.confidence_scale);
    }

    let all_lost = cameras.iter().all(|c| c.status == CameraStatus::Lost);
    let occlusion = !cameras.is_empty() && all_lost && all_recent;
    if occlusion {
        confidence = 0.0;
    }

    FusionResult {
        final_pose: acc.final_pose(),
        final_distance_m: mean(&acc.distances_m),
        final_secondary_distance_m: mean(&acc.secondary_m),
        confidence_scale: confidence.clamp(0.0, 1.0),
        occlusion,
        cameras,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MultiCameraFusion
// ────────────────────────────────────────────────────────────────────────────

/// The pose-fusion and alignment-guidance engine.
///
/// Construct once with the telemetry source, tag layout and configuration,
/// then call [`MultiCameraFusion::step`] once per control tick.  The engine
/// owns each camera's cache exclusively; calls must be serialized.
#[derive(Debug)]
pub struct MultiCameraFusion<S> {
    source: S,
    layout: TagLayout,
    pipelines: Vec<CameraPipeline>,
    dropout_scale: f64,
    occlusion_window_s: f64,
    occluded: bool,
}

impl<S: TelemetrySource> MultiCameraFusion<S> {
    /// Create an engine.  The camera list is taken as-is; build `config` with
    /// [`FusionConfig::with_cameras`] to get the default-camera fallback.
    /// The dropout scale and occlusion window are sanitised either way.
    pub fn new(source: S, layout: TagLayout, config: FusionConfig) -> Self {
        let FusionConfig {
            cameras,
            dropout_scale,
            occlusion_window_s,
        } = config;
        info!(
            cameras = cameras.len(),
            tags = layout.len(),
            dropout_scale,
            occlusion_window_s,
            "fusion engine initialised"
        );
        Self {
            source,
            layout,
            pipelines: cameras.into_iter().map(CameraPipeline::new).collect(),
            dropout_scale: clamp_dropout_scale(dropout_scale),
            occlusion_window_s: clamp_occlusion_window(occlusion_window_s),
            occluded: false,
        }
    }

    /// Run every camera's pipeline for the tick at `now_s` (seconds, any
    /// monotonic epoch) and fuse the results.
    pub fn step(&mut self, now_s: f64) -> FusionResult {
        let ctx = StepContext {
            layout: &self.layout,
            dropout_scale: self.dropout_scale,
        };
        let source = &self.source;
        let cameras: Vec<PerCameraResult> = self
            .pipelines
            .iter_mut()
            .map(|p| p.step(source, &ctx, now_s))
            .collect();

        let window = self.occlusion_window_s;
        let all_recent = self
            .pipelines
            .iter()
            .all(|p| p.state().is_recent(now_s, window));
        let result = aggregate(cameras, all_recent);

        if result.occlusion != self.occluded {
            if result.occlusion {
                warn!(now_s, "all cameras lost inside occlusion window; motion authority zeroed");
            } else {
                info!(now_s, "occlusion cleared");
            }
            self.occluded = result.occlusion;
        }
        trace!(
            now_s,
            confidence = result.confidence_scale,
            has_pose = result.final_pose.is_some(),
            "fusion tick"
        );
        result
    }

    /// Look up a camera by name.
    pub fn camera_id(&self, name: &str) -> Option<CameraId> {
        self.pipelines
            .iter()
            .position(|p| p.config().name == name)
            .map(CameraId)
    }

    pub fn camera(&self, id: CameraId) -> Option<&CameraConfig> {
        self.pipelines.get(id.0).map(CameraPipeline::config)
    }

    /// The cache of camera `id`.
    pub fn state(&self, id: CameraId) -> Option<&CameraState> {
        self.pipelines.get(id.0).map(CameraPipeline::state)
    }

    /// All cameras in configuration order.
    pub fn cameras(&self) -> impl Iterator<Item = (CameraId, &CameraConfig)> {
        self.pipelines
            .iter()
            .enumerate()
            .map(|(i, p)| (CameraId(i), p.config()))
    }

    pub fn layout(&self) -> &TagLayout {
        &self.layout
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn dropout_scale(&self) -> f64 {
        self.dropout_scale
    }

    pub fn occlusion_window_s(&self) -> f64 {
        self.occlusion_window_s
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tagfusion_middleware::SnapshotStore;
    use tagfusion_types::config::{DEFAULT_DROPOUT_SCALE, DEFAULT_OCCLUSION_WINDOW_S};
    use tagfusion_types::{Guidance, Movement, TagPose};

    const CORNERS: [f64; 8] = [0.0, 0.0, 60.0, 0.0, 60.0, 60.0, 0.0, 60.0];

    fn config() -> FusionConfig {
        FusionConfig::with_cameras(
            vec![CameraConfig::named("left"), CameraConfig::named("right")],
            0.6,
            0.15,
        )
    }

    fn publish_valid(store: &SnapshotStore, cam: &str, tag: f64) {
        store.publish_scalar(format!("{cam}/tv"), 1.0);
        store.publish_scalar(format!("{cam}/tx"), 1.0);
        store.publish_sequence(format!("{cam}/tcornxy"), CORNERS.to_vec());
        store.publish_scalar(format!("{cam}/tid"), tag);
    }

    fn invalidate(store: &SnapshotStore, cam: &str) {
        store.publish_scalar(format!("{cam}/tv"), 0.0);
    }

    fn with_pose(name: &str, x: f64, y: f64, deg: f64) -> PerCameraResult {
        PerCameraResult {
            pose: Some(Pose2d::from_xy_degrees(x, y, deg)),
            status: CameraStatus::Ok,
            confidence_scale: 1.0,
            ..PerCameraResult::lost(name, None)
        }
    }

    #[test]
    fn fused_pose_is_mean_of_camera_poses() {
        let store = SnapshotStore::new();
        publish_valid(&store, "left", -1.0);
        publish_valid(&store, "right", -1.0);
        store.publish_sequence("left/botpose", vec![1.0, 2.0, 0.0, 0.0, 0.0, 10.0]);
        store.publish_sequence("right/botpose", vec![3.0, 4.0, 0.0, 0.0, 0.0, 20.0]);
        let mut engine = MultiCameraFusion::new(&store, TagLayout::new(), config());

        let result = engine.step(0.0);
        let pose = result.final_pose.unwrap();
        assert!((pose.x() - 2.0).abs() < 1e-9);
        assert!((pose.y() - 3.0).abs() < 1e-9);
        assert!((pose.rotation().degrees() - 15.0).abs() < 1e-9);
        assert_eq!(result.confidence_scale, 1.0);
        assert!(!result.occlusion);
    }

    #[test]
    fn heading_mean_is_linear() {
        let result = aggregate(
            vec![with_pose("a", 0.0, 0.0, 170.0), with_pose("b", 0.0, 0.0, -170.0)],
            true,
        );
        assert!(result.final_pose.unwrap().rotation().degrees().abs() < 1e-9);
    }

    #[test]
    fn no_pose_means_no_final_pose() {
        let result = aggregate(vec![PerCameraResult::lost("a", None)], false);
        assert!(result.final_pose.is_none());
        assert!(result.final_distance_m.is_none());
        assert!(result.final_secondary_distance_m.is_none());
    }

    #[test]
    fn distance_prefers_target_pose_norm() {
        let movement = Movement {
            camera_distance_feet: 9.0,
            robot_center_distance_feet: 9.0,
            current_distance_feet: 10.0,
            target_distance_feet: 2.0,
            horizontal_angle_error_deg: 0.0,
            forward_feet: 8.0,
            strafe_feet: 0.0,
            rotation_deg: 0.0,
        };
        let guidance = Guidance {
            movement,
            command: String::new(),
            aligned: false,
        };
        let a = PerCameraResult {
            guidance: Some(guidance.clone()),
            target_distance_m: Some(1.0),
            secondary_distance_feet: Some(10.0),
            ..with_pose("a", 0.0, 0.0, 0.0)
        };
        let b = PerCameraResult {
            guidance: Some(guidance),
            ..with_pose("b", 0.0, 0.0, 0.0)
        };
        let result = aggregate(vec![a, b], false);
        assert!((result.final_distance_m.unwrap() - (1.0 + 3.048) / 2.0).abs() < 1e-9);
        assert!((result.final_secondary_distance_m.unwrap() - 3.048).abs() < 1e-9);
    }

    #[test]
    fn confidence_is_minimum_across_cameras() {
        let store = SnapshotStore::new();
        let layout: TagLayout = [(3, TagPose::new(4.0, 0.0, 180.0))].into_iter().collect();
        publish_valid(&store, "left", 3.0);
        publish_valid(&store, "right", 3.0);
        let mut engine = MultiCameraFusion::new(&store, layout, config());
        assert_eq!(engine.step(0.0).confidence_scale, 1.0);

        invalidate(&store, "right");
        let result = engine.step(0.02);
        assert_eq!(result.cameras[1].status, CameraStatus::Degraded);
        assert!((result.confidence_scale - 0.6).abs() < 1e-12);
        assert!(!result.occlusion);
    }

    #[test]
    fn all_lost_inside_window_is_occlusion() {
        let store = SnapshotStore::new();
        publish_valid(&store, "left", -1.0);
        publish_valid(&store, "right", -1.0);
        let mut engine = MultiCameraFusion::new(&store, TagLayout::new(), config());
        let first = engine.step(0.0);
        assert!(first.cameras.iter().all(|c| c.status == CameraStatus::Ok));

        invalidate(&store, "left");
        invalidate(&store, "right");
        let result = engine.step(0.05);
        assert!(result.cameras.iter().all(|c| c.status == CameraStatus::Lost));
        assert!(result.occlusion);
        assert_eq!(result.confidence_scale, 0.0);
    }

    #[test]
    fn all_lost_outside_window_is_stale_not_occluded() {
        let store = SnapshotStore::new();
        publish_valid(&store, "left", -1.0);
        publish_valid(&store, "right", -1.0);
        let mut engine = MultiCameraFusion::new(&store, TagLayout::new(), config());
        engine.step(0.0);

        invalidate(&store, "left");
        invalidate(&store, "right");
        let result = engine.step(1.0);
        assert!(!result.occlusion);
        assert_eq!(result.confidence_scale, 0.0);
    }

    #[test]
    fn raw_config_values_are_sanitised() {
        let store = SnapshotStore::new();
        let raw = FusionConfig {
            cameras: vec![CameraConfig::named("left"), CameraConfig::named("right")],
            dropout_scale: f64::NAN,
            occlusion_window_s: f64::NAN,
        };
        let mut engine = MultiCameraFusion::new(&store, TagLayout::new(), raw);
        assert_eq!(engine.dropout_scale(), DEFAULT_DROPOUT_SCALE);
        assert_eq!(engine.occlusion_window_s(), DEFAULT_OCCLUSION_WINDOW_S);

        // A NaN window would make every camera look stale; the default keeps
        // occlusion detectable.
        publish_valid(&store, "left", -1.0);
        publish_valid(&store, "right", -1.0);
        engine.step(0.0);
        invalidate(&store, "left");
        invalidate(&store, "right");
        assert!(engine.step(0.05).occlusion);
    }

    #[test]
    fn never_seen_cameras_are_not_occluded() {
        let store = SnapshotStore::new();
        let mut engine = MultiCameraFusion::new(&store, TagLayout::new(), config());
        let result = engine.step(0.0);
        assert!(!result.occlusion);
        assert!(result.cameras.iter().all(|c| c.status == CameraStatus::Lost));
        assert_eq!(result.confidence_scale, 0.0);
    }

    #[test]
    fn occlusion_needs_every_camera_recent() {
        let store = SnapshotStore::new();
        publish_valid(&store, "left", -1.0);
        let mut engine = MultiCameraFusion::new(&store, TagLayout::new(), config());
        engine.step(0.0);

        invalidate(&store, "left");
        // "right" was never seen, so the all-lost tick is not an occlusion.
        assert!(!engine.step(0.05).occlusion);
    }

    #[test]
    fn confidence_stays_in_unit_interval() {
        let store = SnapshotStore::new();
        let layout: TagLayout = [(3, TagPose::new(4.0, 0.0, 180.0))].into_iter().collect();
        let mut engine = MultiCameraFusion::new(&store, layout, config());
        let mut t = 0.0;
        for tick in 0..40 {
            if tick % 3 == 0 {
                publish_valid(&store, "left", 3.0);
            } else {
                invalidate(&store, "left");
            }
            if tick % 5 < 2 {
                publish_valid(&store, "right", 3.0);
            } else {
                invalidate(&store, "right");
            }
            let result = engine.step(t);
            assert!((0.0..=1.0).contains(&result.confidence_scale));
            for cam in &result.cameras {
                assert!((0.0..=1.0).contains(&cam.confidence_scale));
            }
            t += 0.02;
        }
    }

    #[test]
    fn cameras_are_addressed_by_id() {
        let store = SnapshotStore::new();
        publish_valid(&store, "right", -1.0);
        let mut engine = MultiCameraFusion::new(&store, TagLayout::new(), config());
        engine.step(2.5);

        let right = engine.camera_id("right").unwrap();
        assert_eq!(right.index(), 1);
        assert_eq!(engine.camera(right).unwrap().name, "right");
        assert_eq!(engine.state(right).unwrap().last_seen_s, Some(2.5));
        assert!(engine.camera_id("ghost").is_none());
        let names: Vec<&str> = engine.cameras().map(|(_, c)| c.name.as_str()).collect();
        assert_eq!(names, ["left", "right"]);
    }
}

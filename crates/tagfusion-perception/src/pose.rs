//! Robot pose resolution: camera-reported poses and the manual back-projection
//! from a known tag.

use tagfusion_types::{CameraConfig, METRES_PER_FOOT, Pose2d, Rotation2d, TagPose, Translation2d};

use crate::range;

/// Index of yaw (degrees) in a reported `[x, y, z, roll, pitch, yaw]` array.
const YAW_INDEX: usize = 5;

/// Parse a reported pose array.  Needs at least six values; only x, y and
/// yaw are used.
pub fn parse_reported(values: &[f64]) -> Option<Pose2d> {
    if values.len() <= YAW_INDEX {
        return None;
    }
    Some(Pose2d::from_xy_degrees(values[0], values[1], values[YAW_INDEX]))
}

/// Back-project the robot position from a tag of known placement.
///
/// The robot is taken to lie on the ray leaving the tag at
/// `tag heading + 180° − angle error`, at the robot-centre range of the
/// reading.  The returned rotation is that bearing.
pub fn manual_pose(camera: &CameraConfig, tx_deg: f64, corners: &[f64; 8], tag: &TagPose) -> Pose2d {
    let estimate = range::estimate(camera, tx_deg, corners);
    let distance_m = estimate.current_distance_feet * METRES_PER_FOOT;
    let bearing_deg = tag.heading_deg + 180.0 - estimate.horizontal_angle_error_deg;
    let bearing = bearing_deg.to_radians();
    let along_bearing = Translation2d::new(bearing.cos(), bearing.sin());
    let position = tag.pose().translation().minus(along_bearing.times(distance_m));
    Pose2d::new(position, Rotation2d::from_degrees(bearing_deg))
}

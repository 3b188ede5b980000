//! Range estimation from a single camera reading.
//!
//! The pipeline is:
//!
//! 1. Apparent tag area from the image-space corner quad.
//! 2. Lens-to-target distance from an empirical exponential-decay fit:
//!    ```text
//!    distance_ft = 12.23504 · 0.999818^area + 1.19735
//!    ```
//! 3. Robot-centre-to-target distance by the law of cosines, combining the
//!    pitch-corrected lens distance with the lens's fixed offset from the
//!    robot centre, plus a 1 ft calibration bias.
//!
//! The fit constants and the bias are lens/sensor calibration values and are
//! kept exactly as measured.

use tagfusion_types::CameraConfig;

/// Multiplier of the area-model exponential.
pub const AREA_MODEL_SCALE: f64 = 12.23504;
/// Per-unit-area decay base of the area model.
pub const AREA_MODEL_DECAY: f64 = 0.999818;
/// Asymptotic distance of the area model.
pub const AREA_MODEL_OFFSET: f64 = 1.19735;
/// Added to every robot-centre distance.
pub const CENTER_DISTANCE_BIAS_FEET: f64 = 1.0;

/// Denominators at or below this magnitude skip the height/pitch range.
const MIN_DENOMINATOR: f64 = 1e-6;

/// Area of the quad given as `[x0, y0, x1, y1, x2, y2, x3, y3]`, taken as
/// mean width × mean height of opposite edges.
pub fn corner_area(corners: &[f64; 8]) -> f64 {
    let [x0, y0, x1, y1, x2, y2, x3, y3] = *corners;
    let avg_height = ((y3 - y0).abs() + (y2 - y1).abs()) / 2.0;
    let avg_width = ((x2 - x3).abs() + (x1 - x0).abs()) / 2.0;
    avg_width * avg_height
}

/// Lens-to-target distance (feet) for an apparent area.
pub fn distance_from_area(area: f64) -> f64 {
    AREA_MODEL_SCALE * AREA_MODEL_DECAY.powf(area) + AREA_MODEL_OFFSET
}

/// `tx` in the robot's sign convention.
pub fn horizontal_angle_error(camera: &CameraConfig, tx_deg: f64) -> f64 {
    if camera.mirror_tx { -tx_deg } else { tx_deg }
}

/// Intermediate and final distances for one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeEstimate {
    pub camera_distance_feet: f64,
    pub robot_center_distance_feet: f64,
    pub current_distance_feet: f64,
    pub horizontal_angle_error_deg: f64,
}

/// Estimate the robot-centre distance to the target seen at `tx_deg` with
/// the given corner quad.
pub fn estimate(camera: &CameraConfig, tx_deg: f64, corners: &[f64; 8]) -> RangeEstimate {
    let camera_distance = distance_from_area(corner_area(corners));
    let offset_distance =
        (camera.offset_x_inches / 12.0).hypot(camera.offset_y_inches / 12.0);
    let angle_error = horizontal_angle_error(camera, tx_deg);
    let adjusted = camera_distance / camera.mount_angle_vertical_deg.to_radians().cos();

    let included = (angle_error + camera.mount_angle_horizontal_deg).to_radians();
    let squared = adjusted.powi(2) + offset_distance.powi(2)
        - 2.0 * adjusted * offset_distance * included.cos();
    let robot_center = squared.max(0.0).sqrt();

    RangeEstimate {
        camera_distance_feet: camera_distance,
        robot_center_distance_feet: robot_center,
        current_distance_feet: robot_center + CENTER_DISTANCE_BIAS_FEET,
        horizontal_angle_error_deg: angle_error,
    }
}

/// Height/pitch range (feet) to a tag mounted at `tag_height_inches`, seen at
/// vertical angle `ty_deg`.  `None` when the pitch is too close to level.
pub fn secondary_distance_feet(
    camera: &CameraConfig,
    tag_height_inches: f64,
    ty_deg: f64,
) -> Option<f64> {
    let denom = (camera.mount_angle_vertical_deg + ty_deg).to_radians().tan();
    if denom.abs() <= MIN_DENOMINATOR {
        return None;
    }
    Some(((tag_height_inches - camera.mount_height_inches) / 12.0) / denom)
}

/// Euclidean norm of the first three values, when present.
pub fn target_distance(values: &[f64]) -> Option<f64> {
    match values {
        [x, y, z, ..] => Some((x * x + y * y + z * z).sqrt()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> [f64; 8] {
        [0.0, 0.0, side, 0.0, side, side, 0.0, side]
    }

    fn level_camera() -> CameraConfig {
        CameraConfig {
            mount_angle_vertical_deg: 0.0,
            mount_angle_horizontal_deg: 0.0,
            offset_x_inches: 0.0,
            offset_y_inches: 0.0,
            ..CameraConfig::named("cam")
        }
    }

    #[test]
    fn area_model_at_100() {
        let expected = 12.23504 * 0.999818f64.powf(100.0) + 1.19735;
        let d = distance_from_area(100.0);
        assert!((d - expected).abs() < 1e-12);
        assert!((d - 13.2117).abs() < 1e-3, "got {d}");
    }

    #[test]
    fn area_model_is_monotonically_decreasing() {
        let mut last = f64::INFINITY;
        for area in [0.0, 10.0, 100.0, 1_000.0, 10_000.0] {
            let d = distance_from_area(area);
            assert!(d < last);
            last = d;
        }
        assert!((distance_from_area(0.0) - (AREA_MODEL_SCALE + AREA_MODEL_OFFSET)).abs() < 1e-12);
    }

    #[test]
    fn corner_area_of_square_and_skewed_quad() {
        assert!((corner_area(&square(10.0)) - 100.0).abs() < 1e-12);
        // Left edge 10 tall, right edge 20 tall; top 8 wide, bottom 12 wide.
        let quad = [0.0, 0.0, 12.0, 0.0, 8.0, 20.0, 0.0, 10.0];
        assert!((corner_area(&quad) - 10.0 * 15.0).abs() < 1e-12);
    }

    #[test]
    fn level_centred_camera_adds_only_bias() {
        let cam = level_camera();
        let r = estimate(&cam, 0.0, &square(10.0));
        assert!((r.robot_center_distance_feet - r.camera_distance_feet).abs() < 1e-9);
        assert!((r.current_distance_feet - r.camera_distance_feet - 1.0).abs() < 1e-9);
    }

    #[test]
    fn law_of_cosines_with_offset() {
        // Offset 12 in along x → 1 ft; included angle 90° → hypot(a, 1).
        let cam = CameraConfig {
            offset_x_inches: 12.0,
            mount_angle_horizontal_deg: 90.0,
            ..level_camera()
        };
        let r = estimate(&cam, 0.0, &square(10.0));
        let expected = r.camera_distance_feet.hypot(1.0);
        assert!((r.robot_center_distance_feet - expected).abs() < 1e-9);
    }

    #[test]
    fn mirrored_camera_flips_angle_error() {
        let cam = CameraConfig {
            mirror_tx: true,
            ..level_camera()
        };
        assert_eq!(horizontal_angle_error(&cam, 4.0), -4.0);
        assert_eq!(horizontal_angle_error(&level_camera(), 4.0), 4.0);
    }

    #[test]
    fn secondary_distance_matches_formula() {
        let cam = CameraConfig::named("cam");
        let height = 0.5 * 39.3701;
        let d = secondary_distance_feet(&cam, height, 2.0).unwrap();
        let denom = (cam.mount_angle_vertical_deg + 2.0).to_radians().tan();
        assert!((d - ((height - 9.5) / 12.0) / denom).abs() < 1e-12);
    }

    #[test]
    fn secondary_distance_skips_level_pitch() {
        let cam = level_camera();
        assert!(secondary_distance_feet(&cam, 20.0, 0.0).is_none());
    }

    #[test]
    fn target_distance_needs_three_values() {
        assert!(target_distance(&[1.0, 2.0]).is_none());
        let d = target_distance(&[1.0, 2.0, 2.0, 9.0, 9.0, 9.0]).unwrap();
        assert!((d - 3.0).abs() < 1e-12);
    }
}

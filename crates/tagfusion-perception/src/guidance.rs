//! Movement decomposition, command synthesis and the alignment verdict.
//!
//! # Command grammar
//!
//! Within tolerance on both forward and rotation error the command is
//! [`ALIGNED_COMMAND`].  Otherwise the instruction is built in fixed order
//! and joined with `" -> "`:
//!
//! 1. `ROTATE <deg> deg RIGHT|LEFT` when the rotation error exceeds tolerance;
//! 2. `DRIVE <ft> ft BACKWARD|FORWARD` when the forward error exceeds
//!    tolerance, else `HOLD DISTANCE`;
//! 3. `STRAFE <ft> ft RIGHT|LEFT` when the strafe exceeds the 0.1 ft deadband.
//!
//! # Example
//!
//! ```rust
//! use tagfusion_perception::guidance::command;
//! use tagfusion_types::CameraConfig;
//!
//! let cam = CameraConfig::named("cam");
//! assert_eq!(command(&cam, 0.1, 0.0, 1.0), "ALIGNED - Hold position");
//! assert_eq!(command(&cam, 0.5, 0.0, 5.0), "ROTATE 5.0 deg RIGHT -> DRIVE 0.50 ft BACKWARD");
//! ```

use tagfusion_types::{CameraConfig, Guidance, Movement};

use crate::range::RangeEstimate;

/// Issued when forward and rotation error are both inside tolerance.
pub const ALIGNED_COMMAND: &str = "ALIGNED - Hold position";

/// Strafe corrections at or below this magnitude are not announced.
pub const STRAFE_DEADBAND_FEET: f64 = 0.1;

/// Decompose a range estimate into forward, strafe and rotation error.
pub fn movement(camera: &CameraConfig, range: &RangeEstimate) -> Movement {
    let current = range.current_distance_feet;
    let angle_error = range.horizontal_angle_error_deg;
    Movement {
        camera_distance_feet: range.camera_distance_feet,
        robot_center_distance_feet: range.robot_center_distance_feet,
        current_distance_feet: current,
        target_distance_feet: camera.target_distance_feet,
        horizontal_angle_error_deg: angle_error,
        forward_feet: current - camera.target_distance_feet,
        strafe_feet: current * angle_error.to_radians().tan(),
        rotation_deg: angle_error,
    }
}

/// Scale the three correction components by `factor`.  Range fields are
/// left untouched.
pub fn scale_corrections(movement: &mut Movement, factor: f64) {
    movement.forward_feet *= factor;
    movement.strafe_feet *= factor;
    movement.rotation_deg *= factor;
}

/// Both forward and rotation error strictly inside tolerance.  Strafe does
/// not participate.
pub fn is_aligned(camera: &CameraConfig, forward_feet: f64, rotation_deg: f64) -> bool {
    forward_feet.abs() < camera.distance_tolerance_feet
        && rotation_deg.abs() < camera.angle_tolerance_deg
}

/// Build the human-readable correction instruction.
pub fn command(camera: &CameraConfig, forward_feet: f64, strafe_feet: f64, rotation_deg: f64) -> String {
    if is_aligned(camera, forward_feet, rotation_deg) {
        return ALIGNED_COMMAND.to_string();
    }

    let mut parts: Vec<String> = Vec::with_capacity(3);
    if rotation_deg.abs() > camera.angle_tolerance_deg {
        let side = if rotation_deg > 0.0 { "RIGHT" } else { "LEFT" };
        parts.push(format!("ROTATE {:.1} deg {side}", rotation_deg.abs()));
    }
    if forward_feet.abs() > camera.distance_tolerance_feet {
        let way = if forward_feet > 0.0 { "BACKWARD" } else { "FORWARD" };
        parts.push(format!("DRIVE {:.2} ft {way}", forward_feet.abs()));
    } else {
        parts.push("HOLD DISTANCE".to_string());
    }
    if strafe_feet.abs() > STRAFE_DEADBAND_FEET {
        let side = if strafe_feet > 0.0 { "RIGHT" } else { "LEFT" };
        parts.push(format!("STRAFE {:.2} ft {side}", strafe_feet.abs()));
    }
    parts.join(" -> ")
}

/// Attach the command and alignment verdict to `movement`.
pub fn guide(camera: &CameraConfig, movement: Movement) -> Guidance {
    Guidance {
        command: command(
            camera,
            movement.forward_feet,
            movement.strafe_feet,
            movement.rotation_deg,
        ),
        aligned: is_aligned(camera, movement.forward_feet, movement.rotation_deg),
        movement,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam() -> CameraConfig {
        CameraConfig {
            distance_tolerance_feet: 0.3,
            angle_tolerance_deg: 2.0,
            target_distance_feet: 2.0,
            ..CameraConfig::named("cam")
        }
    }

    fn range(current: f64, angle: f64) -> RangeEstimate {
        RangeEstimate {
            camera_distance_feet: current - 1.0,
            robot_center_distance_feet: current - 1.0,
            current_distance_feet: current,
            horizontal_angle_error_deg: angle,
        }
    }

    #[test]
    fn within_tolerance_is_aligned() {
        let c = cam();
        assert!(is_aligned(&c, 0.1, 1.0));
        assert_eq!(command(&c, 0.1, 0.0, 1.0), ALIGNED_COMMAND);
    }

    #[test]
    fn strafe_does_not_affect_alignment() {
        let c = cam();
        assert!(is_aligned(&c, 0.1, 1.0));
        assert_eq!(command(&c, 0.1, 3.0, 1.0), ALIGNED_COMMAND);
    }

    #[test]
    fn rotation_listed_before_drive() {
        let cmd = command(&cam(), 0.5, 0.0, 5.0);
        let rot = cmd.find("ROTATE").expect("rotate present");
        let drive = cmd.find("DRIVE").expect("drive present");
        assert!(rot < drive, "{cmd}");
        assert_eq!(cmd, "ROTATE 5.0 deg RIGHT -> DRIVE 0.50 ft BACKWARD");
    }

    #[test]
    fn rotation_only_holds_distance() {
        let cmd = command(&cam(), 0.1, 0.0, -3.24);
        assert_eq!(cmd, "ROTATE 3.2 deg LEFT -> HOLD DISTANCE");
    }

    #[test]
    fn negative_forward_drives_forward_and_strafe_appended() {
        let cmd = command(&cam(), -1.0, -0.42, 0.0);
        assert_eq!(cmd, "DRIVE 1.00 ft FORWARD -> STRAFE 0.42 ft LEFT");
    }

    #[test]
    fn strafe_deadband_is_exclusive() {
        let cmd = command(&cam(), 1.0, 0.1, 0.0);
        assert_eq!(cmd, "DRIVE 1.00 ft BACKWARD");
    }

    #[test]
    fn tolerance_boundary_is_not_aligned() {
        // Exactly at tolerance: neither aligned nor large enough to act on.
        let c = cam();
        assert!(!is_aligned(&c, 0.3, 0.0));
        assert_eq!(command(&c, 0.3, 0.0, 0.0), "HOLD DISTANCE");
    }

    #[test]
    fn movement_decomposition() {
        let m = movement(&cam(), &range(5.0, 45.0));
        assert!((m.forward_feet - 3.0).abs() < 1e-12);
        assert!((m.strafe_feet - 5.0).abs() < 1e-9);
        assert_eq!(m.rotation_deg, 45.0);
        assert_eq!(m.target_distance_feet, 2.0);
    }

    #[test]
    fn scaling_leaves_range_untouched() {
        let mut m = movement(&cam(), &range(5.0, 10.0));
        let before = m;
        scale_corrections(&mut m, 0.5);
        assert!((m.forward_feet - before.forward_feet * 0.5).abs() < 1e-12);
        assert!((m.strafe_feet - before.strafe_feet * 0.5).abs() < 1e-12);
        assert!((m.rotation_deg - 5.0).abs() < 1e-12);
        assert_eq!(m.current_distance_feet, before.current_distance_feet);
    }

    #[test]
    fn guide_bundles_command_and_verdict() {
        let g = guide(&cam(), movement(&cam(), &range(2.1, 0.5)));
        assert!(g.aligned);
        assert_eq!(g.command, ALIGNED_COMMAND);
    }
}

//! Planar geometry primitives.
//!
//! Field poses are expressed in a 2-D world frame: a [`Translation2d`] in
//! metres and a [`Rotation2d`] measured counter-clockwise from +X.  All three
//! types are plain values; operations return new instances.
//!
//! # Example
//!
//! ```rust
//! use tagfusion_types::geometry::{Pose2d, Rotation2d, Translation2d};
//!
//! let pose = Pose2d::new(Translation2d::new(1.0, 2.0), Rotation2d::from_degrees(90.0));
//! assert!((pose.rotation().degrees() - 90.0).abs() < 1e-9);
//! assert!((pose.translation().norm() - 5f64.sqrt()).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Translation2d
// ────────────────────────────────────────────────────────────────────────────

/// A 2-D translation in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Translation2d {
    pub x: f64,
    pub y: f64,
}

impl Translation2d {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance from the origin.
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn minus(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }

    pub fn times(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f64 {
        self.minus(other).norm()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rotation2d
// ────────────────────────────────────────────────────────────────────────────

/// A planar rotation.  Stored in radians; no wrapping is applied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation2d {
    radians: f64,
}

impl Rotation2d {
    pub fn from_radians(radians: f64) -> Self {
        Self { radians }
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_radians(degrees.to_radians())
    }

    pub fn radians(self) -> f64 {
        self.radians
    }

    pub fn degrees(self) -> f64 {
        self.radians.to_degrees()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose2d
// ────────────────────────────────────────────────────────────────────────────

/// A robot or tag pose on the field: translation plus heading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2d {
    translation: Translation2d,
    rotation: Rotation2d,
}

impl Pose2d {
    pub fn new(translation: Translation2d, rotation: Rotation2d) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Convenience constructor from metres and degrees.
    pub fn from_xy_degrees(x: f64, y: f64, degrees: f64) -> Self {
        Self::new(Translation2d::new(x, y), Rotation2d::from_degrees(degrees))
    }

    pub fn translation(&self) -> Translation2d {
        self.translation
    }

    pub fn rotation(&self) -> Rotation2d {
        self.rotation
    }

    pub fn x(&self) -> f64 {
        self.translation.x
    }

    pub fn y(&self) -> f64 {
        self.translation.y
    }
}

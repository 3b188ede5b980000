//! Field tag layout: where each fiducial tag sits on the field.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Pose2d;

/// Metres to inches.
const INCHES_PER_METRE: f64 = 39.3701;

/// Known field placement of a single tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TagPose {
    pub x_m: f64,
    pub y_m: f64,
    /// Direction the tag faces, counter-clockwise from +X.
    pub heading_deg: f64,
    /// Mounting height of the tag centre, when surveyed.
    #[serde(default)]
    pub z_m: Option<f64>,
}

impl TagPose {
    pub fn new(x_m: f64, y_m: f64, heading_deg: f64) -> Self {
        Self {
            x_m,
            y_m,
            heading_deg,
            z_m: None,
        }
    }

    pub fn with_height(mut self, z_m: f64) -> Self {
        self.z_m = Some(z_m);
        self
    }

    pub fn pose(&self) -> Pose2d {
        Pose2d::from_xy_degrees(self.x_m, self.y_m, self.heading_deg)
    }

    pub fn height_inches(&self) -> Option<f64> {
        self.z_m.map(|z| z * INCHES_PER_METRE)
    }
}

/// Mapping from tag id to its field placement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagLayout {
    tags: HashMap<i32, TagPose>,
}

impl TagLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the placement of `id`.
    pub fn insert(&mut self, id: i32, pose: TagPose) {
        self.tags.insert(id, pose);
    }

    pub fn get(&self, id: i32) -> Option<&TagPose> {
        self.tags.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<(i32, TagPose)> for TagLayout {
    fn from_iter<I: IntoIterator<Item = (i32, TagPose)>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_and_unknown() {
        let layout: TagLayout = [(7, TagPose::new(1.0, 2.0, 180.0))].into_iter().collect();
        assert_eq!(layout.len(), 1);
        assert!(layout.get(7).is_some());
        assert!(layout.get(8).is_none());
    }

    #[test]
    fn height_converts_to_inches() {
        let tag = TagPose::new(0.0, 0.0, 0.0).with_height(1.0);
        assert!((tag.height_inches().unwrap() - 39.3701).abs() < 1e-9);
        assert!(TagPose::new(0.0, 0.0, 0.0).height_inches().is_none());
    }

    #[test]
    fn insert_replaces_previous() {
        let mut layout = TagLayout::new();
        layout.insert(1, TagPose::new(0.0, 0.0, 0.0));
        layout.insert(1, TagPose::new(5.0, 0.0, 0.0));
        assert_eq!(layout.get(1).unwrap().x_m, 5.0);
    }
}

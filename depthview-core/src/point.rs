//! Point types and related functionality

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// One measurement of a depth sensor, expressed in the sensor frame.
///
/// The sensor looks down its +z axis; a sample with `z <= 0` carries no depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthSample {
    pub position: Point3f,
    pub confidence: f32,
}

impl DepthSample {
    /// Create a sample with full confidence
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Point3f::new(x, y, z),
            confidence: 1.0,
        }
    }

    /// Create a sample with an explicit confidence
    pub fn with_confidence(position: Point3f, confidence: f32) -> Self {
        Self { position, confidence }
    }

    /// Whether the sample carries a usable depth value
    pub fn has_depth(&self) -> bool {
        let p = &self.position;
        p.x.is_finite() && p.y.is_finite() && p.z.is_finite() && p.z > 0.0
    }
}

impl Default for DepthSample {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            confidence: 0.0,
        }
    }
}

impl From<DepthSample> for Point3f {
    fn from(sample: DepthSample) -> Self {
        sample.position
    }
}

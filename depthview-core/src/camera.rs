//! Pinhole camera calibration

use crate::point::Point3f;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Pinhole intrinsics in pixels of the color image.
///
/// Camera frame convention: x right, y down, z forward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub cx: f32,
    pub cy: f32,
    pub fx: f32,
    pub fy: f32,
}

impl Intrinsics {
    pub fn new(cx: f32, cy: f32, fx: f32, fy: f32) -> Self {
        Self { cx, cy, fx, fy }
    }

    /// Project a camera-space point to pixel coordinates.
    ///
    /// Returns `None` for points on or behind the image plane.
    pub fn project(&self, point: &Point3f) -> Option<Point2<f32>> {
        if !(point.z > 0.0) {
            return None;
        }
        Some(Point2::new(
            self.fx * point.x / point.z + self.cx,
            self.fy * point.y / point.z + self.cy,
        ))
    }

    /// Lift a pixel at the given depth back into camera space
    pub fn unproject(&self, pixel: &Point2<f32>, depth: f32) -> Point3f {
        Point3f::new(
            (pixel.x - self.cx) * depth / self.fx,
            (pixel.y - self.cy) * depth / self.fy,
            depth,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_project_unproject() {
        let k = Intrinsics::new(320.0, 240.0, 500.0, 500.0);
        let p = Point3f::new(0.2, -0.1, 2.0);
        let uv = k.project(&p).unwrap();
        assert_relative_eq!(uv.x, 370.0, epsilon = 1e-4);
        assert_relative_eq!(uv.y, 215.0, epsilon = 1e-4);
        assert_relative_eq!(k.unproject(&uv, 2.0), p, epsilon = 1e-5);
    }

    #[test]
    fn test_project_behind_camera() {
        let k = Intrinsics::new(0.0, 0.0, 1.0, 1.0);
        assert!(k.project(&Point3f::new(0.0, 0.0, 0.0)).is_none());
        assert!(k.project(&Point3f::new(0.0, 0.0, -1.0)).is_none());
        assert!(k.project(&Point3f::new(0.0, 0.0, f32::NAN)).is_none());
    }
}

//! Rigid transforms and recorded camera poses

use nalgebra::{Isometry3, Matrix4, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A device pose as stored by the recorder: translation plus an
/// `[x, y, z, w]` orientation quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub translation: [f64; 3],
    pub orientation: [f64; 4],
}

impl Pose {
    /// The pose at the origin with no rotation
    pub fn identity() -> Self {
        Self {
            translation: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Compose into the device-to-reference transform.
    ///
    /// The quaternion is normalized first; recorded orientations drift slightly
    /// off unit length.
    pub fn to_transform(&self) -> Transform3D {
        let [x, y, z, w] = self.orientation;
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(w as f32, x as f32, y as f32, z as f32));
        let [tx, ty, tz] = self.translation;
        Transform3D::from_translation_rotation(Vector3::new(tx as f32, ty as f32, tz as f32), rotation)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// A 3D transformation stored as a homogeneous matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Create a transformation from translation and rotation
    pub fn from_translation_rotation(
        translation: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
    ) -> Self {
        let isometry = Isometry3::from_parts(Translation3::from(translation), rotation);
        Self {
            matrix: isometry.to_homogeneous(),
        }
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Apply the linear part of the transformation to a vector
    pub fn transform_vector(&self, vector: &Vector3<f32>) -> Vector3<f32> {
        self.matrix.fixed_view::<3, 3>(0, 0) * vector
    }

    /// Where the origin of the source frame lands, e.g. a camera center
    pub fn origin(&self) -> Point3<f32> {
        Point3::new(self.matrix[(0, 3)], self.matrix[(1, 3)], self.matrix[(2, 3)])
    }

    /// Compose this transformation with another (`other` is applied first)
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Get the inverse transformation
    pub fn inverse(self) -> Option<Self> {
        self.matrix.try_inverse().map(|inv_matrix| Self {
            matrix: inv_matrix,
        })
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

impl From<Matrix4<f32>> for Transform3D {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }
}

impl From<Pose> for Transform3D {
    fn from(pose: Pose) -> Self {
        pose.to_transform()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_pose() {
        let t = Pose::identity().to_transform();
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_relative_eq!(t.transform_point(&p), p, epsilon = 1e-6);
    }

    #[test]
    fn test_pose_rotation_then_translation() {
        // 90 degrees about +z
        let half = std::f64::consts::FRAC_PI_4;
        let pose = Pose {
            translation: [1.0, 0.0, 0.0],
            orientation: [0.0, 0.0, half.sin(), half.cos()],
        };
        let t = pose.to_transform();
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(1.0, 1.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(t.origin(), Point3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_unnormalized_quaternion() {
        let pose = Pose {
            translation: [0.0; 3],
            orientation: [0.0, 0.0, 0.0, 2.0],
        };
        let p = Point3::new(0.5, -0.5, 2.0);
        assert_relative_eq!(pose.to_transform().transform_point(&p), p, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_round_trip() {
        let pose = Pose {
            translation: [0.3, -1.2, 4.0],
            orientation: [0.1, 0.2, 0.3, 0.9],
        };
        let t = pose.to_transform();
        let inv = t.inverse().unwrap();
        let p = Point3::new(-2.0, 0.5, 1.0);
        assert_relative_eq!((inv * t).transform_point(&p), p, epsilon = 1e-5);
        assert_relative_eq!(inv.transform_vector(&t.transform_vector(&Vector3::x())), Vector3::x(), epsilon = 1e-5);
    }
}

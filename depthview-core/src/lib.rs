//! Core data structures and traits for depthview
//!
//! This crate provides the fundamental types shared by the reconstruction
//! pipeline: points and depth samples, packed colors, indexed and renderable
//! meshes, camera poses and intrinsics, and the common error type.

pub mod point;
pub mod point_cloud;
pub mod color;
pub mod mesh;
pub mod traits;
pub mod transform;
pub mod camera;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use color::*;
pub use mesh::*;
pub use traits::*;
pub use transform::*;
pub use camera::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point2, Point3, Vector3, Matrix4, Isometry3, UnitQuaternion};

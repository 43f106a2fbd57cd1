//! # depthview reconstruction
//!
//! Turns one RGB-D frame into a colored triangle mesh.
//!
//! Depth samples are projected into the color image and binned on a coarse
//! grid aligned with it. Neighbouring cells are connected into triangles
//! wherever their depths are continuous, the surface is relaxed, and the
//! result is compacted into an indexed mesh with normals.
//!
//! ```no_run
//! use depthview_core::{DepthCloud, Intrinsics, Transform3D};
//! use depthview_image::PixelBuffer;
//! use depthview_reconstruction::{Depthmap, DepthmapConfig};
//!
//! # fn main() -> depthview_core::Result<()> {
//! let image = PixelBuffer::open("00000000.jpg")?;
//! let cloud = DepthCloud::new();
//! let mut map = Depthmap::new(
//!     &image,
//!     &cloud,
//!     &Transform3D::identity(),
//!     &Transform3D::identity(),
//!     Intrinsics::new(320.0, 240.0, 500.0, 500.0),
//!     DepthmapConfig::default(),
//! )?;
//! map.make_surface(4);
//! map.smooth_surface(3);
//! map.reindex();
//! map.generate_normals()?;
//! let mesh = map.into_mesh();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod depthmap;
pub mod grid;
pub mod normals;
mod reindex;
mod smoothing;
mod surface;

pub use config::*;
pub use depthmap::*;
pub use grid::*;
pub use normals::normal_color;

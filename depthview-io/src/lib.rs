//! File formats around the reconstruction pipeline
//!
//! Recorded datasets (state, calibration, poses, per-frame file names), raw
//! `.pcl` depth clouds, OBJ models split under a vertex cap, and PLY export of
//! the reconstructed meshes.

pub mod dataset;
pub mod error;
pub mod obj;
pub mod pcl;
pub mod ply;

pub use dataset::{CameraKind, Dataset, DatasetState, FrameCursor};
pub use error::*;
pub use obj::read_model;
pub use pcl::{read_pcl, write_pcl};
pub use ply::{write_indexed_ply, write_ply};

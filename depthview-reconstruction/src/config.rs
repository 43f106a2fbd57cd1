//! Reconstruction parameters

use depthview_core::{DepthSample, Error, Result};
use serde::{Deserialize, Serialize};

/// How `smooth_surface` weighs a vertex's neighbours
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SmoothingKernel {
    /// Uniform umbrella operator
    Laplacian { lambda: f32 },
    /// Neighbours further than a few `range_sigma` away barely pull, which
    /// keeps creases and small steps intact
    Bilateral { lambda: f32, range_sigma: f32 },
}

impl SmoothingKernel {
    /// Fraction of the way each step moves a vertex towards its neighbourhood
    pub fn lambda(&self) -> f32 {
        match *self {
            SmoothingKernel::Laplacian { lambda } | SmoothingKernel::Bilateral { lambda, .. } => lambda,
        }
    }

    /// Weight of a neighbour at squared distance `distance_sq`
    pub fn weight(&self, distance_sq: f32) -> f32 {
        match *self {
            SmoothingKernel::Laplacian { .. } => 1.0,
            SmoothingKernel::Bilateral { range_sigma, .. } => {
                (-distance_sq / (2.0 * range_sigma * range_sigma)).exp()
            }
        }
    }
}

impl Default for SmoothingKernel {
    fn default() -> Self {
        SmoothingKernel::Laplacian { lambda: 0.5 }
    }
}

/// Configuration for building a [`Depthmap`](crate::Depthmap)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthmapConfig {
    /// Color image pixels covered by one grid cell, per side
    pub cell_size: u32,
    /// Samples below this confidence are ignored
    pub min_confidence: f32,
    /// Nearest usable sensor depth in meters
    pub min_depth: f32,
    /// Farthest usable sensor depth in meters
    pub max_depth: f32,
    /// Kernel used by `smooth_surface`
    pub smoothing: SmoothingKernel,
}

impl Default for DepthmapConfig {
    fn default() -> Self {
        Self {
            cell_size: 12,
            min_confidence: 0.0,
            min_depth: 0.1,
            max_depth: 10.0,
            smoothing: SmoothingKernel::default(),
        }
    }
}

impl DepthmapConfig {
    /// Set the grid cell size in image pixels
    pub fn with_cell_size(mut self, cell_size: u32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Set the minimum sample confidence
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Set the usable sensor depth range
    pub fn with_depth_range(mut self, min_depth: f32, max_depth: f32) -> Self {
        self.min_depth = min_depth;
        self.max_depth = max_depth;
        self
    }

    /// Set the smoothing kernel
    pub fn with_smoothing(mut self, smoothing: SmoothingKernel) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cell_size == 0 {
            return Err(Error::InvalidData("cell_size must be positive".to_string()));
        }
        if !(self.min_depth >= 0.0 && self.min_depth < self.max_depth) {
            return Err(Error::InvalidData(format!(
                "invalid depth range {}..{}",
                self.min_depth, self.max_depth
            )));
        }
        let lambda = self.smoothing.lambda();
        if !(lambda > 0.0 && lambda <= 1.0) {
            return Err(Error::InvalidData(format!(
                "smoothing lambda must be in (0, 1], got {}",
                lambda
            )));
        }
        if let SmoothingKernel::Bilateral { range_sigma, .. } = self.smoothing {
            if !(range_sigma > 0.0) {
                return Err(Error::InvalidData("range_sigma must be positive".to_string()));
            }
        }
        Ok(())
    }

    /// Whether a raw sensor sample is worth projecting
    pub fn accepts(&self, sample: &DepthSample) -> bool {
        sample.has_depth()
            && sample.position.z >= self.min_depth
            && sample.position.z <= self.max_depth
            && sample.confidence >= self.min_confidence
    }
}

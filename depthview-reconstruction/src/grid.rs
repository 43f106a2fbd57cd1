//! The image-aligned grid of surface samples

use depthview_core::{pack_rgba, unpack_rgba, PackedColor, Point3f};
use serde::{Deserialize, Serialize};

/// One reconstructed surface sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint {
    /// Position in world space
    pub position: Point3f,
    /// Distance along the color camera's viewing axis
    pub depth: f32,
    pub color: PackedColor,
}

impl SurfacePoint {
    /// Linear blend towards `other`; `t == 0` returns `self`
    pub fn lerp(&self, other: &SurfacePoint, t: f32) -> SurfacePoint {
        let a = unpack_rgba(self.color);
        let b = unpack_rgba(other.color);
        let mix = |i: usize| (a[i] as f32 + (b[i] as f32 - a[i] as f32) * t).round() as u8;
        SurfacePoint {
            position: self.position + (other.position - self.position) * t,
            depth: self.depth + (other.depth - self.depth) * t,
            color: pack_rgba(mix(0), mix(1), mix(2), mix(3)),
        }
    }
}

/// A `width` x `height` grid of optional samples, row-major.
///
/// Each cell covers a square patch of the color image, so neighbouring cells
/// are neighbouring lines of sight and any 2x2 block of filled cells is a
/// candidate pair of triangles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceGrid {
    width: usize,
    height: usize,
    angular_step: f32,
    cells: Vec<Option<SurfacePoint>>,
}

impl SurfaceGrid {
    /// Create an empty grid; `angular_step` is the angle one cell subtends
    pub fn new(width: usize, height: usize, angular_step: f32) -> Self {
        Self {
            width,
            height,
            angular_step,
            cells: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn angular_step(&self) -> f32 {
        self.angular_step
    }

    /// Number of cells, filled or not
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&SurfacePoint> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[self.index(x, y)].as_ref()
    }

    pub fn cell(&self, index: usize) -> Option<&SurfacePoint> {
        self.cells.get(index).and_then(Option::as_ref)
    }

    pub fn cells(&self) -> &[Option<SurfacePoint>] {
        &self.cells
    }

    pub(crate) fn replace_cells(&mut self, cells: Vec<Option<SurfacePoint>>) {
        debug_assert_eq!(cells.len(), self.cells.len());
        self.cells = cells;
    }

    pub fn set(&mut self, x: usize, y: usize, point: Option<SurfacePoint>) {
        let index = self.index(x, y);
        self.cells[index] = point;
    }

    /// Store `point` unless the cell already holds a nearer sample.
    ///
    /// Returns whether the point was stored.
    pub fn insert_nearest(&mut self, x: usize, y: usize, point: SurfacePoint) -> bool {
        let index = self.index(x, y);
        match &self.cells[index] {
            Some(existing) if existing.depth <= point.depth => false,
            _ => {
                self.cells[index] = Some(point);
                true
            }
        }
    }

    /// Number of filled cells
    pub fn valid_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Whether samples at these depths may be connected.
    ///
    /// Their spread must not exceed `kernel_size` cell footprints, where the
    /// footprint is the metric width of one cell at the mean depth.
    pub fn is_continuous(&self, depths: &[f32], kernel_size: usize) -> bool {
        if depths.is_empty() {
            return false;
        }
        let (min, max, sum) = depths
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY, 0.0), |(lo, hi, sum), &d| {
                (lo.min(d), hi.max(d), sum + d)
            });
        let mean = sum / depths.len() as f32;
        max - min <= kernel_size as f32 * mean * self.angular_step
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use depthview_core::encode_color;

    /// A fully filled grid whose cell `(x, y)` sits at `position(x, y)`
    pub fn grid_from(
        width: usize,
        height: usize,
        depth: f32,
        position: impl Fn(usize, usize) -> Point3f,
    ) -> SurfaceGrid {
        let mut grid = SurfaceGrid::new(width, height, 0.1);
        for y in 0..height {
            for x in 0..width {
                grid.set(
                    x,
                    y,
                    Some(SurfacePoint {
                        position: position(x, y),
                        depth,
                        color: encode_color(200, 100, 50),
                    }),
                );
            }
        }
        grid
    }

    /// A fronto-parallel plane at `z = depth`, seen from the origin
    pub fn wall(width: usize, height: usize, depth: f32) -> SurfaceGrid {
        grid_from(width, height, depth, |x, y| {
            Point3f::new(x as f32 * 0.1 * depth, y as f32 * 0.1 * depth, depth)
        })
    }
}

//! Gap filling, triangulation and block decimation

use crate::depthmap::{orient_toward, Depthmap};
use crate::grid::{SurfaceGrid, SurfacePoint};
use depthview_core::{Error, Point3f, Result};
use log::debug;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

impl Depthmap {
    /// Triangulate the grid.
    ///
    /// Short holes of up to `kernel_size` cells are interpolated first, then
    /// every 2x2 block of filled cells whose depths pass the continuity gate
    /// becomes two triangles split along the top-left to bottom-right diagonal.
    /// Calling this again starts over from the sampled grid, replacing the
    /// previous fill, smoothing and triangles.
    pub fn make_surface(&mut self, kernel_size: usize) {
        let mut grid = self.sampled.clone();
        grid.replace_cells(fill_gaps(&self.sampled, kernel_size));
        self.grid = grid;

        let grid = &self.grid;
        let viewpoint = self.viewpoint;
        let rows: Vec<Vec<[usize; 3]>> = (0..grid.height().saturating_sub(1))
            .into_par_iter()
            .map(|y| triangulate_row(grid, &viewpoint, y, kernel_size))
            .collect();

        self.faces = rows.into_iter().flatten().collect();
        self.indexed = None;
        debug!(
            "make_surface: {} cells, {} triangles (kernel {})",
            self.grid.valid_count(),
            self.faces.len(),
            kernel_size
        );
    }

    /// Replace the triangles of a fully covered block by two large ones.
    ///
    /// `(x0, y0)` and `(x1, y1)` are corner cells, clamped to the grid. The
    /// block is left alone unless every quad inside it is triangulated.
    /// Returns whether the block was merged. Fails once `reindex` has run.
    pub fn join(&mut self, x0: usize, y0: usize, x1: usize, y1: usize) -> Result<bool> {
        if self.indexed.is_some() {
            return Err(Error::Algorithm("join must run before reindex".to_string()));
        }
        if self.grid.is_empty() {
            return Ok(false);
        }
        let x1 = x1.min(self.grid.width() - 1);
        let y1 = y1.min(self.grid.height() - 1);
        if x0 >= x1 || y0 >= y1 {
            return Ok(false);
        }

        let lookup: HashMap<[usize; 3], usize> = self
            .faces
            .iter()
            .enumerate()
            .map(|(i, face)| (sorted(*face), i))
            .collect();

        let mut doomed = HashSet::new();
        for y in y0..y1 {
            for x in x0..x1 {
                let [a, b, c, d] = quad(&self.grid, x, y);
                for triangle in [[a, b, d], [a, d, c]] {
                    match lookup.get(&sorted(triangle)) {
                        Some(&i) => {
                            doomed.insert(i);
                        }
                        None => return Ok(false),
                    }
                }
            }
        }

        let [a, b, c, d] = [
            self.grid.index(x0, y0),
            self.grid.index(x1, y0),
            self.grid.index(x0, y1),
            self.grid.index(x1, y1),
        ];
        let (Some(pa), Some(pb), Some(pc), Some(pd)) =
            (self.grid.cell(a), self.grid.cell(b), self.grid.cell(c), self.grid.cell(d))
        else {
            return Ok(false);
        };
        let upper = orient_toward(&self.viewpoint, [pa, pb, pd], [a, b, d]);
        let lower = orient_toward(&self.viewpoint, [pa, pd, pc], [a, d, c]);

        let mut index = 0;
        self.faces.retain(|_| {
            let keep = !doomed.contains(&index);
            index += 1;
            keep
        });
        self.faces.push(upper);
        self.faces.push(lower);
        Ok(true)
    }
}

/// Cell indices of the quad whose top-left corner is `(x, y)`:
/// top-left, top-right, bottom-left, bottom-right
fn quad(grid: &SurfaceGrid, x: usize, y: usize) -> [usize; 4] {
    [
        grid.index(x, y),
        grid.index(x + 1, y),
        grid.index(x, y + 1),
        grid.index(x + 1, y + 1),
    ]
}

fn sorted(mut face: [usize; 3]) -> [usize; 3] {
    face.sort_unstable();
    face
}

fn triangulate_row(grid: &SurfaceGrid, viewpoint: &Point3f, y: usize, kernel_size: usize) -> Vec<[usize; 3]> {
    let mut faces = Vec::new();
    for x in 0..grid.width().saturating_sub(1) {
        let [a, b, c, d] = quad(grid, x, y);
        let (Some(pa), Some(pb), Some(pc), Some(pd)) = (grid.cell(a), grid.cell(b), grid.cell(c), grid.cell(d))
        else {
            continue;
        };
        if !grid.is_continuous(&[pa.depth, pb.depth, pc.depth, pd.depth], kernel_size) {
            continue;
        }
        faces.push(orient_toward(viewpoint, [pa, pb, pd], [a, b, d]));
        faces.push(orient_toward(viewpoint, [pa, pd, pc], [a, d, c]));
    }
    faces
}

/// Interpolate holes bracketed within `kernel_size` cells, reading only the
/// unfilled grid
fn fill_gaps(grid: &SurfaceGrid, kernel_size: usize) -> Vec<Option<SurfacePoint>> {
    (0..grid.len())
        .into_par_iter()
        .map(|i| {
            if let Some(point) = grid.cell(i) {
                return Some(*point);
            }
            if kernel_size == 0 {
                return None;
            }
            let (x, y) = grid.coords(i);
            let horizontal = bracket(grid, kernel_size, |step: isize| {
                offset(x, step, grid.width()).and_then(|nx| grid.get(nx, y))
            });
            let vertical = bracket(grid, kernel_size, |step: isize| {
                offset(y, step, grid.height()).and_then(|ny| grid.get(x, ny))
            });
            match (horizontal, vertical) {
                (Some(h), Some(v)) => Some(h.lerp(&v, 0.5)),
                (h, v) => h.or(v),
            }
        })
        .collect()
}

fn offset(origin: usize, step: isize, limit: usize) -> Option<usize> {
    origin.checked_add_signed(step).filter(|&n| n < limit)
}

/// Nearest filled cells on either side along one axis, blended by distance
fn bracket<'a>(
    grid: &SurfaceGrid,
    kernel_size: usize,
    at: impl Fn(isize) -> Option<&'a SurfacePoint>,
) -> Option<SurfacePoint> {
    let nearest = |sign: isize| {
        (1..=kernel_size as isize).find_map(|step| at(sign * step).map(|point| (step, point)))
    };
    let (before_step, before) = nearest(-1)?;
    let (after_step, after) = nearest(1)?;
    if !grid.is_continuous(&[before.depth, after.depth], kernel_size) {
        return None;
    }
    let t = before_step as f32 / (before_step + after_step) as f32;
    Some(before.lerp(after, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::test_support::wall;
    use approx::assert_relative_eq;

    #[test]
    fn test_full_wall_triangulates() {
        let mut map = Depthmap::from_grid(wall(5, 4, 2.0), Point3f::origin());
        map.make_surface(4);
        assert_eq!(map.triangle_count(), 4 * 3 * 2);

        // every face points back at the camera
        let mesh = map.mesh();
        for tri in mesh.vertices.chunks(3) {
            let normal = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
            assert!(normal.z < 0.0);
        }
    }

    #[test]
    fn test_rerun_replaces_soup() {
        let mut map = Depthmap::from_grid(wall(3, 3, 2.0), Point3f::origin());
        map.make_surface(2);
        map.make_surface(2);
        assert_eq!(map.triangle_count(), 8);
    }

    #[test]
    fn test_rerun_does_not_grow_fills() {
        let mut grid = wall(7, 2, 2.0);
        for y in 0..2 {
            for x in 2..5 {
                grid.set(x, y, None);
            }
        }
        let mut map = Depthmap::from_grid(grid, Point3f::origin());

        map.make_surface(2);
        let cells = map.grid().cells().to_vec();
        let faces = map.mesh();
        assert_eq!(map.grid().valid_count(), 10);
        assert_eq!(map.triangle_count(), 4);

        map.make_surface(2);
        assert_eq!(map.grid().cells(), &cells[..]);
        assert_eq!(map.mesh().vertices, faces.vertices);
        assert_eq!(map.triangle_count(), 4);
    }

    #[test]
    fn test_discontinuity_not_bridged() {
        let mut grid = wall(4, 2, 2.0);
        for y in 0..2 {
            let mut far = *grid.get(3, y).unwrap();
            far.depth = 5.0;
            far.position.z = 5.0;
            grid.set(3, y, Some(far));
        }
        let mut map = Depthmap::from_grid(grid, Point3f::origin());
        map.make_surface(2);
        // the quad between columns 2 and 3 is dropped
        assert_eq!(map.triangle_count(), 4);
    }

    #[test]
    fn test_gap_is_filled_by_interpolation() {
        let mut grid = wall(5, 1, 2.0);
        grid.set(2, 0, None);
        let map_grid = fill_gaps(&grid, 2);
        let filled = map_grid[2].unwrap();
        assert_relative_eq!(filled.position.x, 0.4, epsilon = 1e-6);
        assert_relative_eq!(filled.depth, 2.0);

        // kernel 2 reaches the middle of a three cell hole but not its ends
        let mut grid = wall(5, 1, 2.0);
        grid.set(1, 0, None);
        grid.set(2, 0, None);
        grid.set(3, 0, None);
        let cells = fill_gaps(&grid, 2);
        assert!(cells[1].is_none() && cells[3].is_none());
        assert_relative_eq!(cells[2].unwrap().position.x, 0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_fill_respects_discontinuity() {
        let mut grid = wall(3, 1, 2.0);
        let mut far = *grid.get(2, 0).unwrap();
        far.depth = 6.0;
        grid.set(2, 0, Some(far));
        grid.set(1, 0, None);
        assert!(fill_gaps(&grid, 1)[1].is_none());
    }

    #[test]
    fn test_empty_grid_has_no_surface() {
        let mut map = Depthmap::from_grid(SurfaceGrid::new(6, 6, 0.1), Point3f::origin());
        map.make_surface(4);
        assert_eq!(map.triangle_count(), 0);
        assert!(map.mesh().is_empty());
    }

    #[test]
    fn test_join_full_block() {
        let mut map = Depthmap::from_grid(wall(5, 5, 2.0), Point3f::origin());
        map.make_surface(4);
        assert_eq!(map.triangle_count(), 32);

        assert!(map.join(0, 0, 2, 2).unwrap());
        assert_eq!(map.triangle_count(), 32 - 8 + 2);

        // overlapping an already joined block is refused
        assert!(!map.join(1, 1, 3, 3).unwrap());
        // clamped to the grid
        assert!(map.join(2, 2, 99, 99).unwrap());
        assert_eq!(map.triangle_count(), 26 - 8 + 2);
    }

    #[test]
    fn test_join_refuses_partial_block() {
        let mut grid = wall(4, 4, 2.0);
        grid.set(1, 1, None);
        let mut map = Depthmap::from_grid(grid, Point3f::origin());
        map.make_surface(0);
        let before = map.triangle_count();

        assert!(!map.join(0, 0, 3, 3).unwrap());
        assert!(!map.join(2, 2, 2, 3).unwrap());
        assert_eq!(map.triangle_count(), before);
    }

    #[test]
    fn test_join_after_reindex_fails() {
        let mut map = Depthmap::from_grid(wall(3, 3, 2.0), Point3f::origin());
        map.make_surface(1);
        map.reindex();
        assert!(map.join(0, 0, 2, 2).is_err());
    }
}

//! Positional relaxation of the triangulated grid

use crate::depthmap::Depthmap;
use crate::grid::SurfaceGrid;
use depthview_core::{Point3f, Vector3f};
use log::debug;
use rayon::prelude::*;

const LEFT: u8 = 1;
const RIGHT: u8 = 1 << 1;
const UP: u8 = 1 << 2;
const DOWN: u8 = 1 << 3;
const INTERIOR: u8 = LEFT | RIGHT | UP | DOWN;

impl Depthmap {
    /// Relax vertex positions `iterations` times.
    ///
    /// Only cells linked to all four grid neighbours by triangle edges move;
    /// the surface border stays where it was sampled. Each pass reads the
    /// previous pass's positions. Depths, colors and faces are unchanged.
    /// Running it after `reindex` rebuilds the compacted mesh without normals.
    pub fn smooth_surface(&mut self, iterations: usize) {
        if iterations == 0 || self.faces.is_empty() {
            return;
        }
        let links = edge_links(&self.grid, &self.faces);
        let interior = links.iter().filter(|&&l| l == INTERIOR).count();

        for _ in 0..iterations {
            let grid = &self.grid;
            let kernel = self.smoothing;
            let next: Vec<_> = (0..grid.len())
                .into_par_iter()
                .map(|i| {
                    let mut point = *grid.cell(i)?;
                    if links[i] == INTERIOR {
                        let (x, y) = grid.coords(i);
                        let neighbours = [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)];
                        let mut total = Vector3f::zeros();
                        let mut weights = 0.0;
                        for (nx, ny) in neighbours {
                            if let Some(q) = grid.get(nx, ny) {
                                let w = kernel.weight((q.position - point.position).norm_squared());
                                total += q.position.coords * w;
                                weights += w;
                            }
                        }
                        if weights > 0.0 {
                            let target = Point3f::from(total / weights);
                            point.position += (target - point.position) * kernel.lambda();
                        }
                    }
                    Some(point)
                })
                .collect();
            self.grid.replace_cells(next);
        }

        if self.indexed.is_some() {
            // a compacted mesh is rebuilt from the moved cells, dropping its normals
            self.reindex();
        }

        debug!("smooth_surface: {} iterations over {} interior cells", iterations, interior);
    }
}

/// Bitmask per cell of which axis neighbours share a triangle edge with it
fn edge_links(grid: &SurfaceGrid, faces: &[[usize; 3]]) -> Vec<u8> {
    let mut links = vec![0u8; grid.len()];
    for face in faces {
        for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
            let (ax, ay) = grid.coords(a);
            let (bx, by) = grid.coords(b);
            if ay == by && bx == ax + 1 {
                links[a] |= RIGHT;
                links[b] |= LEFT;
            } else if ay == by && ax == bx + 1 {
                links[a] |= LEFT;
                links[b] |= RIGHT;
            } else if ax == bx && by == ay + 1 {
                links[a] |= DOWN;
                links[b] |= UP;
            } else if ax == bx && ay == by + 1 {
                links[a] |= UP;
                links[b] |= DOWN;
            }
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmoothingKernel;
    use crate::grid::test_support::{grid_from, wall};
    use approx::assert_relative_eq;

    /// A wall with one vertex pushed towards the camera
    fn bumped() -> Depthmap {
        let mut grid = wall(5, 5, 2.0);
        let mut bump = *grid.get(2, 2).unwrap();
        bump.position.z = 1.9;
        grid.set(2, 2, Some(bump));
        let mut map = Depthmap::from_grid(grid, Point3f::origin());
        map.make_surface(4);
        map
    }

    #[test]
    fn test_zero_iterations_is_noop() {
        let mut map = bumped();
        let before = map.grid().cells().to_vec();
        map.smooth_surface(0);
        assert_eq!(map.grid().cells(), &before[..]);
    }

    #[test]
    fn test_smoothing_after_reindex_drops_normals() {
        let mut map = bumped();
        map.reindex();
        map.generate_normals().unwrap();
        map.normals_to_color().unwrap();
        let bump_before = map.grid().get(2, 2).unwrap().position;

        map.smooth_surface(1);

        let mesh = map.indexed_mesh().unwrap();
        assert!(mesh.normals.is_none());
        // sampled colors replace the normal shading
        let colors = mesh.colors.as_ref().unwrap();
        assert!(colors.iter().all(|&c| c == depthview_core::encode_color(200, 100, 50)));
        // the rebuilt mesh carries the moved vertex
        let moved = map.grid().get(2, 2).unwrap().position;
        assert!(moved.z > bump_before.z);
        assert!(mesh.vertices.contains(&moved));
    }

    #[test]
    fn test_plane_stays_planar() {
        // tilted plane z = 2 + 0.3 x - 0.2 y
        let grid = grid_from(6, 6, 2.0, |x, y| {
            let (px, py) = (x as f32 * 0.2, y as f32 * 0.2);
            Point3f::new(px, py, 2.0 + 0.3 * px - 0.2 * py)
        });
        let mut map = Depthmap::from_grid(grid, Point3f::origin());
        map.make_surface(4);
        map.smooth_surface(10);

        for point in map.grid().cells().iter().flatten() {
            let p = point.position;
            assert_relative_eq!(p.z, 2.0 + 0.3 * p.x - 0.2 * p.y, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_bump_is_relaxed_and_border_fixed() {
        let mut map = bumped();
        let corner = map.grid().get(0, 0).unwrap().position;
        let edge = map.grid().get(2, 0).unwrap().position;

        map.smooth_surface(3);

        let bump = map.grid().get(2, 2).unwrap();
        assert!(bump.position.z > 1.9);
        assert_relative_eq!(bump.depth, 2.0);
        assert_eq!(map.grid().get(0, 0).unwrap().position, corner);
        assert_eq!(map.grid().get(2, 0).unwrap().position, edge);
        assert_eq!(map.triangle_count(), 32);
    }

    #[test]
    fn test_bilateral_preserves_step_better() {
        // the two right columns sit 5 cm behind the rest
        let stepped = || {
            let grid = grid_from(5, 5, 2.0, |x, y| {
                let z = if x >= 3 { 2.05 } else { 2.0 };
                Point3f::new(x as f32 * 0.2, y as f32 * 0.2, z)
            });
            let mut map = Depthmap::from_grid(grid, Point3f::origin());
            map.make_surface(4);
            map
        };
        let mut laplacian = stepped();
        let mut bilateral = stepped().with_smoothing(SmoothingKernel::Bilateral {
            lambda: 0.5,
            range_sigma: 0.05,
        });
        laplacian.smooth_surface(1);
        bilateral.smooth_surface(1);

        let pulled = |map: &Depthmap| map.grid().get(2, 2).unwrap().position.z - 2.0;
        assert_relative_eq!(pulled(&laplacian), 0.00625, epsilon = 1e-5);
        assert!(pulled(&bilateral) > 0.0);
        assert!(pulled(&bilateral) < pulled(&laplacian));
    }

    #[test]
    fn test_links_need_triangle_edges() {
        let map = bumped();
        let links = edge_links(map.grid(), &map.faces);
        let grid = map.grid();
        assert_eq!(links[grid.index(2, 2)], INTERIOR);
        assert_eq!(links[grid.index(0, 0)], RIGHT | DOWN);
        assert_eq!(links[grid.index(4, 2)], LEFT | UP | DOWN);
    }
}

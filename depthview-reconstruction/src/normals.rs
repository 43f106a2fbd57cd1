//! Vertex normals and normal shading

use crate::depthmap::Depthmap;
use depthview_core::{pack_rgba, Error, PackedColor, Result, Vector3f};
use log::debug;

/// Map a unit normal to a color, one channel per axis
pub fn normal_color(normal: &Vector3f) -> PackedColor {
    let channel = |v: f32| ((v * 0.5 + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8;
    pack_rgba(channel(normal.x), channel(normal.y), channel(normal.z), 255)
}

impl Depthmap {
    /// Area-weighted vertex normals for the indexed mesh.
    ///
    /// A vertex whose adjacent faces cancel out faces the viewpoint.
    pub fn generate_normals(&mut self) -> Result<()> {
        let viewpoint = self.viewpoint;
        let mesh = self
            .indexed
            .as_mut()
            .ok_or_else(|| Error::Algorithm("generate_normals requires reindex".to_string()))?;

        let mut sums = vec![Vector3f::zeros(); mesh.vertices.len()];
        for (face, normal) in mesh.faces.iter().zip(mesh.face_area_normals()) {
            for &v in face {
                sums[v] += normal;
            }
        }

        let mut fallbacks = 0;
        let normals = sums
            .into_iter()
            .zip(&mesh.vertices)
            .map(|(sum, vertex)| {
                sum.try_normalize(f32::EPSILON).unwrap_or_else(|| {
                    fallbacks += 1;
                    (viewpoint - vertex)
                        .try_normalize(f32::EPSILON)
                        .unwrap_or_else(|| -Vector3f::z())
                })
            })
            .collect();
        mesh.set_normals(normals)?;

        debug!("generate_normals: {} vertices, {} without face support", mesh.vertices.len(), fallbacks);
        Ok(())
    }

    /// Replace vertex colors with [`normal_color`] of each normal
    pub fn normals_to_color(&mut self) -> Result<()> {
        let mesh = self
            .indexed
            .as_mut()
            .ok_or_else(|| Error::Algorithm("normals_to_color requires reindex".to_string()))?;
        let normals = mesh
            .normals
            .as_ref()
            .ok_or_else(|| Error::Algorithm("normals_to_color requires generate_normals".to_string()))?;

        let colors = normals.iter().map(normal_color).collect();
        mesh.set_colors(colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::test_support::{grid_from, wall};
    use crate::grid::SurfaceGrid;
    use approx::assert_relative_eq;
    use depthview_core::{unpack_rgba, Point3f};

    #[test]
    fn test_normal_color_mapping() {
        assert_eq!(unpack_rgba(normal_color(&Vector3f::new(0.0, 0.0, -1.0))), [128, 128, 0, 255]);
        assert_eq!(unpack_rgba(normal_color(&Vector3f::new(1.0, -1.0, 0.0))), [255, 0, 128, 255]);
    }

    #[test]
    fn test_wall_faces_camera() {
        let mut map = Depthmap::from_grid(wall(4, 4, 2.0), Point3f::origin());
        map.make_surface(2);
        map.reindex();
        map.generate_normals().unwrap();

        let normals = map.indexed_mesh().and_then(|m| m.normals.as_ref()).unwrap();
        assert_eq!(normals.len(), 16);
        for n in normals {
            assert_relative_eq!(*n, Vector3f::new(0.0, 0.0, -1.0), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_floor_normals_point_up() {
        // camera frame has y pointing down, so a floor below the camera sits at +y
        let grid = grid_from(5, 5, 2.0, |x, y| {
            Point3f::new(x as f32 * 0.2 - 0.4, 1.0, 1.0 + y as f32 * 0.2)
        });
        let mut map = Depthmap::from_grid(grid, Point3f::origin());
        map.make_surface(4);
        map.reindex();
        map.generate_normals().unwrap();

        let up = Vector3f::new(0.0, -1.0, 0.0);
        for n in map.indexed_mesh().and_then(|m| m.normals.as_ref()).unwrap() {
            assert_relative_eq!(*n, up, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_colors_replaced() {
        let mut map = Depthmap::from_grid(wall(3, 3, 2.0), Point3f::origin());
        map.make_surface(2);
        map.reindex();
        map.generate_normals().unwrap();
        map.normals_to_color().unwrap();

        let mesh = map.mesh();
        assert_eq!(mesh.vertex_count(), 24);
        assert!(mesh.colors.iter().all(|&c| unpack_rgba(c) == [128, 128, 0, 255]));
    }

    #[test]
    fn test_stage_order_is_enforced() {
        let mut map = Depthmap::from_grid(wall(3, 3, 2.0), Point3f::origin());
        map.make_surface(2);
        assert!(map.generate_normals().is_err());
        map.reindex();
        assert!(map.normals_to_color().is_err());
    }

    #[test]
    fn test_empty_mesh_has_no_normals_to_compute() {
        let mut map = Depthmap::from_grid(SurfaceGrid::new(4, 4, 0.1), Point3f::origin());
        map.make_surface(4);
        map.reindex();
        map.generate_normals().unwrap();
        map.normals_to_color().unwrap();
        assert!(map.into_mesh().is_empty());
    }
}

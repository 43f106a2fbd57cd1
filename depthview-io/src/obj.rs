//! OBJ model loading for scene overlays

use crate::IoError;
use depthview_core::{Error, Mesh, Point3f, Result, WHITE};
use log::debug;
use ::obj::ObjData;
use std::fs::File;
use std::path::Path;

/// Read an OBJ file as flat triangle meshes.
///
/// Polygons are fan-triangulated. With `max_vertices`, a new mesh is started
/// whenever the next triangle would push the current one past the cap, so
/// every mesh fits a renderer's index range. Vertices are white.
pub fn read_model<P: AsRef<Path>>(path: P, max_vertices: Option<usize>) -> Result<Vec<Mesh>> {
    let path = path.as_ref();
    if let Some(cap) = max_vertices {
        if cap < 3 {
            return Err(Error::InvalidData(format!("vertex cap {} is below one triangle", cap)));
        }
    }

    let data = ObjData::load_buf(File::open(path)?).map_err(|err| IoError::InvalidFormat {
        format: format!("{}: {}", path.display(), err),
    })?;
    let position = |i: usize| {
        data.position
            .get(i)
            .map(|&[x, y, z]| Point3f::new(x, y, z))
            .ok_or_else(|| Error::InvalidData(format!("{}: vertex index {} out of range", path.display(), i)))
    };

    let mut meshes = Vec::new();
    let mut current = Mesh::new();
    let polygons = data.objects.iter().flat_map(|o| &o.groups).flat_map(|g| &g.polys);
    for polygon in polygons {
        let corners = &polygon.0;
        for k in 1..corners.len().saturating_sub(1) {
            if let Some(cap) = max_vertices {
                if current.vertex_count() + 3 > cap {
                    meshes.push(std::mem::take(&mut current));
                }
            }
            current.push_triangle(
                [position(corners[0].0)?, position(corners[k].0)?, position(corners[k + 1].0)?],
                [WHITE; 3],
            );
        }
    }
    if !current.is_empty() {
        meshes.push(current);
    }

    debug!(
        "read {} meshes, {} triangles from {}",
        meshes.len(),
        meshes.iter().map(Mesh::triangle_count).sum::<usize>(),
        path.display()
    );
    Ok(meshes)
}

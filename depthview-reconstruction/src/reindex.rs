//! Compacting the triangle soup into an indexed mesh

use crate::depthmap::Depthmap;
use depthview_core::TriangleMesh;
use log::debug;

impl Depthmap {
    /// Build the indexed mesh from the current triangles.
    ///
    /// Cells referenced by a face become vertices in row-major cell order, so
    /// the same soup always yields the same vertex order. Faces keep their
    /// order and winding. An empty soup gives an empty mesh.
    pub fn reindex(&mut self) -> &TriangleMesh {
        let mut remap: Vec<Option<usize>> = vec![None; self.grid.len()];
        for face in &self.faces {
            for &cell in face {
                remap[cell] = Some(0);
            }
        }

        let mut vertices = Vec::new();
        let mut colors = Vec::new();
        for (cell, slot) in remap.iter_mut().enumerate() {
            if slot.is_none() {
                continue;
            }
            match self.grid.cell(cell) {
                Some(point) => {
                    *slot = Some(vertices.len());
                    vertices.push(point.position);
                    colors.push(point.color);
                }
                None => *slot = None,
            }
        }

        let faces: Vec<[usize; 3]> = self
            .faces
            .iter()
            .filter_map(|face| Some([remap[face[0]]?, remap[face[1]]?, remap[face[2]]?]))
            .collect();

        debug!("reindex: {} vertices, {} faces", vertices.len(), faces.len());

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        mesh.colors = Some(colors);
        self.indexed.insert(mesh)
    }
}

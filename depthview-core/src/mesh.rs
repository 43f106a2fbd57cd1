//! Mesh data structures and functionality

use crate::color::{PackedColor, WHITE};
use crate::point::*;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh with optional per-vertex normals and colors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
    pub colors: Option<Vec<PackedColor>>,
}

/// A flat, renderable triangle list
///
/// Triangle `i` occupies vertices `3 * i .. 3 * i + 3`, and every vertex has
/// exactly one packed color.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point3f>,
    pub colors: Vec<PackedColor>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
            colors: None,
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
            colors: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Unnormalized face normals; the length is twice the triangle area
    pub fn face_area_normals(&self) -> Vec<Vector3f> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let v1 = self.vertices[face[1]];
                let v2 = self.vertices[face[2]];

                (v1 - v0).cross(&(v2 - v0))
            })
            .collect()
    }

    /// Set vertex normals
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) -> Result<()> {
        if normals.len() != self.vertices.len() {
            return Err(Error::InvalidData(format!(
                "expected {} normals, got {}",
                self.vertices.len(),
                normals.len()
            )));
        }
        self.normals = Some(normals);
        Ok(())
    }

    /// Set vertex colors
    pub fn set_colors(&mut self, colors: Vec<PackedColor>) -> Result<()> {
        if colors.len() != self.vertices.len() {
            return Err(Error::InvalidData(format!(
                "expected {} colors, got {}",
                self.vertices.len(),
                colors.len()
            )));
        }
        self.colors = Some(colors);
        Ok(())
    }

    /// Expand into a flat triangle list; vertices without a color are white
    pub fn to_render_mesh(&self) -> Mesh {
        let mut mesh = Mesh::with_capacity(self.faces.len());
        for face in &self.faces {
            let color = |i: usize| self.colors.as_ref().map_or(WHITE, |c| c[i]);
            mesh.push_triangle(
                [self.vertices[face[0]], self.vertices[face[1]], self.vertices[face[2]]],
                [color(face[0]), color(face[1]), color(face[2])],
            );
        }
        mesh
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mesh with room for `triangles` triangles
    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(triangles * 3),
            colors: Vec::with_capacity(triangles * 3),
        }
    }

    /// Append one triangle
    pub fn push_triangle(&mut self, vertices: [Point3f; 3], colors: [PackedColor; 3]) {
        self.vertices.extend_from_slice(&vertices);
        self.colors.extend_from_slice(&colors);
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Check if the mesh has nothing to draw
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Paint every vertex with one color
    pub fn fill_color(&mut self, color: PackedColor) {
        self.colors.iter_mut().for_each(|c| *c = color);
    }

    /// Check the pairing and triangle-list invariants
    pub fn validate(&self) -> Result<()> {
        if self.vertices.len() != self.colors.len() {
            return Err(Error::InvalidData(format!(
                "{} vertices but {} colors",
                self.vertices.len(),
                self.colors.len()
            )));
        }
        if self.vertices.len() % 3 != 0 {
            return Err(Error::InvalidData(format!(
                "{} vertices do not form whole triangles",
                self.vertices.len()
            )));
        }
        Ok(())
    }

    /// Interleaved `x, y, z` floats for the position attribute
    pub fn position_data(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Interleaved `r, g, b, a` bytes for the color attribute
    pub fn color_data(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }
}

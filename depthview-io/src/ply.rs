//! PLY export of reconstructed meshes

use depthview_core::{unpack_rgba, Mesh, PackedColor, Point3f, Result, TriangleMesh, Vector3f};
use log::debug;
use ply_rs::{
    ply::{Addable, DefaultElement, ElementDef, Ply, Property, PropertyDef, PropertyType, ScalarType},
    writer::Writer,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a flat mesh; triangle `i` references vertices `3i..3i + 3`
pub fn write_ply<P: AsRef<Path>>(mesh: &Mesh, path: P) -> Result<()> {
    mesh.validate()?;
    let faces: Vec<[usize; 3]> = (0..mesh.triangle_count()).map(|i| [3 * i, 3 * i + 1, 3 * i + 2]).collect();
    write_elements(&mesh.vertices, None, Some(&mesh.colors), &faces, path.as_ref())
}

/// Write an indexed mesh with its normals and colors, when present
pub fn write_indexed_ply<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    write_elements(
        &mesh.vertices,
        mesh.normals.as_deref(),
        mesh.colors.as_deref(),
        &mesh.faces,
        path.as_ref(),
    )
}

fn scalar(name: &str, kind: ScalarType) -> PropertyDef {
    PropertyDef::new(name.to_string(), PropertyType::Scalar(kind))
}

fn write_elements(
    vertices: &[Point3f],
    normals: Option<&[Vector3f]>,
    colors: Option<&[PackedColor]>,
    faces: &[[usize; 3]],
    path: &Path,
) -> Result<()> {
    let mut ply = Ply::<DefaultElement>::new();

    let mut vertex_element = ElementDef::new("vertex".to_string());
    vertex_element.count = vertices.len();
    for axis in ["x", "y", "z"] {
        vertex_element.properties.add(scalar(axis, ScalarType::Float));
    }
    if normals.is_some() {
        for axis in ["nx", "ny", "nz"] {
            vertex_element.properties.add(scalar(axis, ScalarType::Float));
        }
    }
    if colors.is_some() {
        for channel in ["red", "green", "blue", "alpha"] {
            vertex_element.properties.add(scalar(channel, ScalarType::UChar));
        }
    }
    ply.header.elements.add(vertex_element);

    let mut face_element = ElementDef::new("face".to_string());
    face_element.count = faces.len();
    face_element.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    ply.header.elements.add(face_element);

    let mut vertex_data = Vec::with_capacity(vertices.len());
    for (i, vertex) in vertices.iter().enumerate() {
        let mut element = DefaultElement::new();
        element.insert("x".to_string(), Property::Float(vertex.x));
        element.insert("y".to_string(), Property::Float(vertex.y));
        element.insert("z".to_string(), Property::Float(vertex.z));
        if let Some(normal) = normals.and_then(|n| n.get(i)) {
            element.insert("nx".to_string(), Property::Float(normal.x));
            element.insert("ny".to_string(), Property::Float(normal.y));
            element.insert("nz".to_string(), Property::Float(normal.z));
        }
        if let Some(&color) = colors.and_then(|c| c.get(i)) {
            let [r, g, b, a] = unpack_rgba(color);
            element.insert("red".to_string(), Property::UChar(r));
            element.insert("green".to_string(), Property::UChar(g));
            element.insert("blue".to_string(), Property::UChar(b));
            element.insert("alpha".to_string(), Property::UChar(a));
        }
        vertex_data.push(element);
    }
    ply.payload.insert("vertex".to_string(), vertex_data);

    let face_data = faces
        .iter()
        .map(|face| {
            let mut element = DefaultElement::new();
            element.insert(
                "vertex_indices".to_string(),
                Property::ListInt(face.iter().map(|&i| i as i32).collect()),
            );
            element
        })
        .collect();
    ply.payload.insert("face".to_string(), face_data);

    let mut writer = BufWriter::new(File::create(path)?);
    Writer::new().write_ply(&mut writer, &mut ply)?;
    writer.flush()?;

    debug!("wrote {} vertices, {} faces to {}", vertices.len(), faces.len(), path.display());
    Ok(())
}

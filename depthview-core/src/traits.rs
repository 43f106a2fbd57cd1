//! Core traits for depthview

use crate::{mesh::*, point::*};

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        nalgebra::center(&min, &max)
    }
}

fn bounds<'a>(points: impl IntoIterator<Item = &'a Point3f>) -> (Point3f, Point3f) {
    let mut points = points.into_iter();
    let Some(first) = points.next() else {
        return (Point3f::origin(), Point3f::origin());
    };

    points.fold((*first, *first), |(min, max), p| (min.inf(p), max.sup(p)))
}

impl Drawable for TriangleMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds(&self.vertices)
    }
}

impl Drawable for Mesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::WHITE;

    #[test]
    fn test_mesh_bounds() {
        let mut mesh = Mesh::new();
        mesh.push_triangle(
            [
                Point3f::new(-1.0, 0.0, 2.0),
                Point3f::new(3.0, -2.0, 0.0),
                Point3f::new(0.0, 4.0, 1.0),
            ],
            [WHITE; 3],
        );

        let (min, max) = mesh.bounding_box();
        assert_eq!(min, Point3f::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Point3f::new(3.0, 4.0, 2.0));
        assert_eq!(mesh.center(), Point3f::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_empty_bounds() {
        assert_eq!(TriangleMesh::new().bounding_box(), (Point3f::origin(), Point3f::origin()));
    }
}

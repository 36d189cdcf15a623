//! Core traits for morphosis

use crate::{mesh::*, point::*};

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        )
    }
}

impl Drawable for TriangleBuffer {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        let vertices = self.vertices();
        if vertices.is_empty() {
            return (Point3f::origin(), Point3f::origin());
        }

        let mut min = vertices[0];
        let mut max = vertices[0];

        for vertex in vertices {
            min.x = min.x.min(vertex.x);
            min.y = min.y.min(vertex.y);
            min.z = min.z.min(vertex.z);

            max.x = max.x.max(vertex.x);
            max.y = max.y.max(vertex.y);
            max.z = max.z.max(vertex.z);
        }

        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_bounds() {
        let buffer = TriangleBuffer::new();
        assert_eq!(buffer.bounding_box(), (Point3f::origin(), Point3f::origin()));
    }

    #[test]
    fn test_buffer_bounds_and_center() {
        let mut buffer = TriangleBuffer::new();
        buffer.push(Triangle::new(
            Point3f::new(-1.0, 0.0, 2.0),
            Point3f::new(1.0, 3.0, 0.0),
            Point3f::new(0.0, -1.0, 1.0),
        ));

        let (min, max) = buffer.bounding_box();
        assert_eq!(min, Point3f::new(-1.0, -1.0, 0.0));
        assert_eq!(max, Point3f::new(1.0, 3.0, 2.0));
        assert_eq!(buffer.center(), Point3f::new(0.0, 1.0, 1.0));
    }
}

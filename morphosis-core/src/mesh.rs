//! Triangle soup data structures
//!
//! Triangles produced by the marching cubes pass own their three vertex
//! positions. Vertices are never shared or welded between neighbouring
//! triangles, so consumers (renderers, exporters) will see duplicate
//! positions along every shared edge.

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};

/// A triangle with three independent vertex positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [Point3f; 3],
}

impl Triangle {
    /// Create a triangle from three positions
    pub fn new(a: Point3f, b: Point3f, c: Point3f) -> Self {
        Self { vertices: [a, b, c] }
    }

    /// Unit face normal following the vertex winding.
    ///
    /// Degenerate triangles (every vertex snapped to the same corner, or
    /// collinear vertices) get `(0, 1, 0)`.
    pub fn normal(&self) -> Vector3f {
        let [v0, v1, v2] = self.vertices;
        let normal = (v1 - v0).cross(&(v2 - v0));
        let length = normal.norm();

        if length > 1e-4 {
            normal / length
        } else {
            Vector3f::new(0.0, 1.0, 0.0)
        }
    }

    /// Average of the three vertices
    pub fn centroid(&self) -> Point3f {
        let [v0, v1, v2] = self.vertices;
        Point3f::from((v0.coords + v1.coords + v2.coords) / 3.0)
    }
}

/// Ordered, resettable sequence of triangles in one flat vertex buffer.
///
/// Triangle `i` occupies `vertices[3i..3i + 3]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleBuffer {
    vertices: Vec<Point3f>,
}

impl TriangleBuffer {
    /// Create a new empty buffer
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
        }
    }

    /// Create an empty buffer able to hold `triangles` triangles, failing
    /// with `OutOfMemory` instead of aborting
    pub fn try_with_capacity(triangles: usize) -> Result<Self> {
        let mut buffer = Self::new();
        buffer.try_reserve_exact(triangles)?;
        Ok(buffer)
    }

    /// Number of triangles
    pub fn len(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Check if the buffer holds no triangles
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of triangles the buffer can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.vertices.capacity() / 3
    }

    /// Reserve room for exactly `additional` more triangles
    pub fn try_reserve_exact(&mut self, additional: usize) -> Result<()> {
        let vertices = additional
            .checked_mul(3)
            .ok_or_else(|| Error::out_of_memory("triangles", additional, None))?;
        self.vertices
            .try_reserve_exact(vertices)
            .map_err(|e| Error::out_of_memory("triangles", additional, Some(e)))
    }

    /// Append a triangle. Growth follows `Vec`'s amortized policy; callers
    /// that need fallible growth reserve first with `try_reserve_exact`.
    #[inline]
    pub fn push(&mut self, triangle: Triangle) {
        self.vertices.extend_from_slice(&triangle.vertices);
    }

    /// Move every triangle of `other` to the end of this buffer, leaving
    /// `other` empty. One bulk move, no per-triangle copies.
    pub fn append(&mut self, other: &mut TriangleBuffer) {
        self.vertices.append(&mut other.vertices);
    }

    /// Drop all triangles while keeping the allocation
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Get a triangle by index
    pub fn get(&self, index: usize) -> Option<Triangle> {
        let start = index.checked_mul(3)?;
        let end = start.checked_add(3)?;
        let v = self.vertices.get(start..end)?;
        Some(Triangle::new(v[0], v[1], v[2]))
    }

    /// Iterate over the triangles in emission order
    pub fn iter(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.vertices
            .chunks_exact(3)
            .map(|v| Triangle::new(v[0], v[1], v[2]))
    }

    /// All vertex positions, three per triangle
    pub fn vertices(&self) -> &[Point3f] {
        &self.vertices
    }

    /// Flat `x, y, z` stream, nine floats per triangle, ready for upload
    /// into a GPU vertex buffer
    pub fn vertex_data(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }
}

impl Extend<Triangle> for TriangleBuffer {
    fn extend<I: IntoIterator<Item = Triangle>>(&mut self, iter: I) {
        for triangle in iter {
            self.push(triangle);
        }
    }
}

impl FromIterator<Triangle> for TriangleBuffer {
    fn from_iter<I: IntoIterator<Item = Triangle>>(iter: I) -> Self {
        let mut buffer = TriangleBuffer::new();
        buffer.extend(iter);
        buffer
    }
}

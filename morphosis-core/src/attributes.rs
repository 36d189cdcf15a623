//! Per-vertex render attributes
//!
//! Both streams line up with `TriangleBuffer::vertex_data`: three floats per
//! vertex, three vertices per triangle. Vertices are not shared, so every
//! vertex of a triangle carries that triangle's face normal and colour
//! (flat shading).

use crate::mesh::{Triangle, TriangleBuffer};
use crate::quaternion::Quaternionf;

/// Channel bounds of a face colour
pub const COLOR_MIN: f32 = 0.1;
pub const COLOR_MAX: f32 = 1.0;

impl Triangle {
    /// RGB face colour.
    ///
    /// Orientation sets the base channels (`|n| * 0.8 + 0.2`), distance of
    /// the centroid from the origin darkens them, the centroid position adds
    /// a periodic tint and `c.x + c.y` shifts the hue. Channels are clamped
    /// to `[0.1, 1]`.
    pub fn color(&self, c: &Quaternionf) -> [f32; 3] {
        let normal = self.normal();
        let centre = self.centroid();

        let distance = centre.coords.norm();
        let distance_factor = 1.0 - (distance / 3.0).min(0.8);
        let base = normal.map(|n| (n.abs() * 0.8 + 0.2) * distance_factor);

        let tint = 0.3 * ((centre.x * 2.0).sin() + (centre.y * 2.0).cos() + (centre.z * 1.5).sin());
        let shift = (c.x + c.y) * 0.1;

        [
            base.x + tint * 0.2 + shift,
            base.y + tint * 0.15 + shift * 0.5,
            base.z + tint * 0.25 - shift * 0.3,
        ]
        .map(|channel| channel.clamp(COLOR_MIN, COLOR_MAX))
    }
}

impl TriangleBuffer {
    /// Flat `nx, ny, nz` stream, the face normal repeated for each vertex
    pub fn normal_data(&self) -> Vec<f32> {
        self.iter()
            .flat_map(|triangle| {
                let n = triangle.normal();
                [n.x, n.y, n.z, n.x, n.y, n.z, n.x, n.y, n.z]
            })
            .collect()
    }

    /// Flat `r, g, b` stream, the face colour repeated for each vertex
    pub fn color_data(&self, c: &Quaternionf) -> Vec<f32> {
        self.iter()
            .flat_map(|triangle| {
                let [r, g, b] = triangle.color(c);
                [r, g, b, r, g, b, r, g, b]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point3f;
    use approx::assert_relative_eq;

    fn julia_c() -> Quaternionf {
        Quaternionf::new(-0.2, 0.8, 0.0, 0.0)
    }

    fn corner_triangle(offset: f32) -> Triangle {
        Triangle::new(
            Point3f::new(offset, offset, offset),
            Point3f::new(offset + 1.0, offset, offset),
            Point3f::new(offset, offset + 1.0, offset),
        )
    }

    #[test]
    fn test_face_color() {
        let [r, g, b] = corner_triangle(0.0).color(&julia_c());

        assert_relative_eq!(r, 0.312_828, epsilon = 1e-5);
        assert_relative_eq!(g, 0.261_765, epsilon = 1e-5);
        assert_relative_eq!(b, 0.930_184, epsilon = 1e-5);
    }

    #[test]
    fn test_distant_triangle_is_darker() {
        let near = corner_triangle(0.0).color(&julia_c());
        let far = corner_triangle(10.0).color(&julia_c());

        assert_relative_eq!(far[0], 0.182_576, epsilon = 1e-4);
        assert_relative_eq!(far[2], 0.285_221, epsilon = 1e-4);
        assert!(far[2] < near[2]);
    }

    #[test]
    fn test_color_channels_are_clamped() {
        let triangle = corner_triangle(0.0);

        let bright = triangle.color(&Quaternionf::new(5.0, 5.0, 0.0, 0.0));
        assert_eq!(bright[0], COLOR_MAX);

        let dark = triangle.color(&Quaternionf::new(-5.0, -5.0, 0.0, 0.0));
        assert_eq!(dark, [COLOR_MIN, COLOR_MIN, COLOR_MAX]);

        let p = Point3f::new(0.3, -0.7, 1.1);
        for c in [julia_c(), Quaternionf::new(40.0, -3.0, 0.0, 0.0)] {
            for triangle in [Triangle::new(p, p, p), corner_triangle(-2.5), corner_triangle(7.0)] {
                for channel in triangle.color(&c) {
                    assert!((COLOR_MIN..=COLOR_MAX).contains(&channel));
                }
            }
        }
    }

    #[test]
    fn test_attribute_streams_line_up_with_vertices() {
        let degenerate = Triangle::new(Point3f::origin(), Point3f::origin(), Point3f::origin());
        let buffer: TriangleBuffer = [corner_triangle(0.0), degenerate].into_iter().collect();

        let normals = buffer.normal_data();
        let colors = buffer.color_data(&julia_c());
        assert_eq!(normals.len(), buffer.vertex_data().len());
        assert_eq!(colors.len(), buffer.vertex_data().len());

        assert_eq!(&normals[0..3], &[0.0, 0.0, 1.0]);
        assert_eq!(&normals[6..9], &[0.0, 0.0, 1.0]);
        assert_eq!(&normals[9..12], &[0.0, 1.0, 0.0]);

        let second = degenerate.color(&julia_c());
        assert_eq!(&colors[15..18], &second);
        assert_eq!(&colors[0..3], &colors[3..6]);
    }

    #[test]
    fn test_empty_buffer_streams() {
        let buffer = TriangleBuffer::new();
        assert!(buffer.normal_data().is_empty());
        assert!(buffer.color_data(&julia_c()).is_empty());
    }
}

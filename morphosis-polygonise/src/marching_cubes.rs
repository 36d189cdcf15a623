//! Marching Cubes triangulation of the sampled fractal field
//!
//! Corners are classified by a binary membership test (value non-zero), not
//! by comparing against an iso level. Edge crossings snap to a corner whose
//! value is exactly 1.0, so a non-supersampled field produces vertices on
//! lattice points only. No vertex is shared between triangles.

use crate::accumulator::TriangleAccumulator;
use crate::grid::{Cube, SampleField};
use crate::tables::{EDGE_CONNECTIONS, EDGE_TABLE, TRIANGLE_TABLE};
use morphosis_core::{Point3f, Result, Triangle};

/// Per-pass triangulation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriangulationStats {
    /// Cubes visited
    pub cubes: usize,
    /// Cubes whose edge mask was zero
    pub empty_cubes: usize,
    /// Triangles emitted
    pub triangles: usize,
}

impl TriangulationStats {
    /// Fold another pass into this one
    pub fn merge(&mut self, other: TriangulationStats) {
        self.cubes += other.cubes;
        self.empty_cubes += other.empty_cubes;
        self.triangles += other.triangles;
    }
}

/// Marching Cubes implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct MarchingCubesTriangulator;

impl MarchingCubesTriangulator {
    /// Create a new triangulator
    pub fn new() -> Self {
        Self
    }

    /// 8-bit configuration index; bit `k` is set when corner `k` is non-zero
    #[inline]
    pub fn cube_index(values: &[f32; 8]) -> usize {
        values
            .iter()
            .enumerate()
            .fold(0, |index, (corner, &value)| {
                if value != 0.0 {
                    index | (1 << corner)
                } else {
                    index
                }
            })
    }

    /// Crossing point on the edge `p0`-`p1`.
    ///
    /// Returns `p0` when `v0 == 1`, `p1` when `v1 == 1`, `p0` when both values
    /// are equal, and `p0 + μ(p1 − p0)` with `μ = (1 − v0) / (v1 − v0)`
    /// otherwise.
    #[inline]
    pub fn interpolate(p0: &Point3f, p1: &Point3f, v0: f32, v1: f32) -> Point3f {
        if v0 == 1.0 {
            return *p0;
        }
        if v1 == 1.0 {
            return *p1;
        }
        if v1 == v0 {
            return *p0;
        }

        let mu = (1.0 - v0) / (v1 - v0);
        *p0 + (*p1 - *p0) * mu
    }

    /// Triangulate one cube of the field into `accumulator`, returning the
    /// number of triangles emitted
    #[inline]
    pub fn triangulate(
        &self,
        field: &SampleField,
        cube: &Cube,
        accumulator: &mut TriangleAccumulator,
    ) -> Result<usize> {
        let (positions, values) = field.corners(cube);
        self.triangulate_corners(&positions, &values, accumulator)
    }

    /// Triangulate a cube given directly by its corner positions and values
    pub fn triangulate_corners(
        &self,
        positions: &[Point3f; 8],
        values: &[f32; 8],
        accumulator: &mut TriangleAccumulator,
    ) -> Result<usize> {
        let cube_index = Self::cube_index(values);
        let edge_mask = EDGE_TABLE[cube_index];
        if edge_mask == 0 {
            return Ok(0);
        }

        let mut edge_vertices = [Point3f::origin(); 12];
        for (edge, &[a, b]) in EDGE_CONNECTIONS.iter().enumerate() {
            if edge_mask & (1 << edge) != 0 {
                edge_vertices[edge] =
                    Self::interpolate(&positions[a], &positions[b], values[a], values[b]);
            }
        }

        let row = &TRIANGLE_TABLE[cube_index];
        let mut emitted = 0;
        for triple in row.chunks_exact(3) {
            if triple[0] < 0 {
                break;
            }
            accumulator.append(Triangle::new(
                edge_vertices[triple[0] as usize],
                edge_vertices[triple[1] as usize],
                edge_vertices[triple[2] as usize],
            ))?;
            emitted += 1;
        }

        Ok(emitted)
    }

    /// Triangulate the cubes yielded by `cubes`, in order
    pub fn triangulate_cubes(
        &self,
        field: &SampleField,
        cubes: impl Iterator<Item = Cube>,
        accumulator: &mut TriangleAccumulator,
    ) -> Result<TriangulationStats> {
        let mut stats = TriangulationStats::default();
        for cube in cubes {
            let emitted = self.triangulate(field, &cube, accumulator)?;
            stats.cubes += 1;
            stats.triangles += emitted;
            if emitted == 0 {
                stats.empty_cubes += 1;
            }
        }
        Ok(stats)
    }

    /// Triangulate every cube of the field in linear order
    pub fn triangulate_field(
        &self,
        field: &SampleField,
        accumulator: &mut TriangleAccumulator,
    ) -> Result<TriangulationStats> {
        self.triangulate_cubes(field, field.cubes(), accumulator)
    }
}

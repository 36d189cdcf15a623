//! Lattice bounds and dense scalar field sampling
//!
//! Lattice point `(i, j, k)` sits at `p0 + (i, j, k) * step` and is stored at
//! linear index `(k * (ny + 1) + j) * (nx + 1) + i`, x varying fastest.

use crate::tables::CORNER_OFFSETS;
use morphosis_core::{Error, Point3f, Result};
use morphosis_fractal::{FractalEvaluator, FractalParameters};
use tracing::debug;

/// Bounding box and step of the sampling lattice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    p0: Point3f,
    p1: Point3f,
    step: f32,
    resolution: [usize; 3],
}

impl Default for GridSpec {
    fn default() -> Self {
        let p0 = Point3f::new(-1.5, -1.5, -1.5);
        let p1 = Point3f::new(1.5, 1.5, 1.5);
        let step = 0.05;
        Self {
            p0,
            p1,
            step,
            resolution: Self::resolution_for(&p0, &p1, step),
        }
    }
}

impl GridSpec {
    /// Create a grid spec, checking `p1 ≥ p0` component-wise and `step > 0`
    pub fn new(p0: Point3f, p1: Point3f, step: f32) -> Result<Self> {
        if !(step.is_finite() && step > 0.0) {
            return Err(Error::InvalidGrid(format!(
                "step size must be positive, got {}",
                step
            )));
        }
        if p0.iter().chain(p1.iter()).any(|v| !v.is_finite()) {
            return Err(Error::InvalidGrid(
                "bounding box corners must be finite".to_string(),
            ));
        }
        if p1.x < p0.x || p1.y < p0.y || p1.z < p0.z {
            return Err(Error::InvalidGrid(format!(
                "upper corner {:?} lies below lower corner {:?}",
                p1, p0
            )));
        }

        Ok(Self {
            p0,
            p1,
            step,
            resolution: Self::resolution_for(&p0, &p1, step),
        })
    }

    /// Cube grid centred on the origin with half-extent `half`
    pub fn centered(half: f32, step: f32) -> Result<Self> {
        Self::new(
            Point3f::new(-half, -half, -half),
            Point3f::new(half, half, half),
            step,
        )
    }

    fn resolution_for(p0: &Point3f, p1: &Point3f, step: f32) -> [usize; 3] {
        let axis = |lo: f32, hi: f32| ((hi - lo) / step).ceil() as usize;
        [axis(p0.x, p1.x), axis(p0.y, p1.y), axis(p0.z, p1.z)]
    }

    pub fn p0(&self) -> Point3f {
        self.p0
    }

    pub fn p1(&self) -> Point3f {
        self.p1
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Cubes per axis, `ceil((p1 − p0) / step)`
    pub fn resolution(&self) -> [usize; 3] {
        self.resolution
    }

    /// Lattice points per axis (`resolution + 1`)
    pub fn lattice_dims(&self) -> [usize; 3] {
        self.resolution.map(|n| n.saturating_add(1))
    }

    /// Total number of lattice points, `OutOfMemory` if it overflows `usize`
    pub fn sample_count(&self) -> Result<usize> {
        let [nx, ny, nz] = self.resolution;
        nx.checked_add(1)
            .zip(ny.checked_add(1))
            .zip(nz.checked_add(1))
            .and_then(|((x, y), z)| x.checked_mul(y)?.checked_mul(z))
            .ok_or_else(|| Error::out_of_memory("lattice samples", usize::MAX, None))
    }

    /// Total number of cubes
    pub fn cube_count(&self) -> Result<usize> {
        let [nx, ny, nz] = self.resolution;
        nx.checked_mul(ny)
            .and_then(|n| n.checked_mul(nz))
            .ok_or_else(|| Error::out_of_memory("cubes", usize::MAX, None))
    }

    /// World position of lattice point `(i, j, k)`
    #[inline]
    pub fn position(&self, i: usize, j: usize, k: usize) -> Point3f {
        Point3f::new(
            self.p0.x + i as f32 * self.step,
            self.p0.y + j as f32 * self.step,
            self.p0.z + k as f32 * self.step,
        )
    }
}

/// The eight lattice indices of one cell, in table corner order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cube {
    pub corners: [usize; 8],
}

/// Dense lattice of positions and their field values
#[derive(Debug, Clone, Default)]
pub struct SampleField {
    positions: Vec<Point3f>,
    values: Vec<f32>,
    dims: [usize; 3],
}

impl SampleField {
    /// Create an empty field
    pub fn new() -> Self {
        Self::default()
    }

    /// Lattice points per axis
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of lattice points the field can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.values.capacity().min(self.positions.capacity())
    }

    pub fn positions(&self) -> &[Point3f] {
        &self.positions
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Linear index of lattice point `(i, j, k)`
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.dims[1] + j) * self.dims[0] + i
    }

    /// Cube whose minimal corner is lattice point `(i, j, k)`
    pub fn cube(&self, i: usize, j: usize, k: usize) -> Option<Cube> {
        let [nx, ny, nz] = self.dims;
        if i + 1 >= nx || j + 1 >= ny || k + 1 >= nz {
            return None;
        }

        let corners = CORNER_OFFSETS.map(|[dx, dy, dz]| self.index(i + dx, j + dy, k + dz));
        Some(Cube { corners })
    }

    /// Cubes per axis
    pub fn cube_dims(&self) -> [usize; 3] {
        self.dims.map(|n| n.saturating_sub(1))
    }

    /// Every cube in linear order (x fastest)
    pub fn cubes(&self) -> impl Iterator<Item = Cube> + '_ {
        let [cx, cy, cz] = self.cube_dims();
        (0..cz).flat_map(move |k| {
            (0..cy).flat_map(move |j| {
                (0..cx).filter_map(move |i| self.cube(i, j, k))
            })
        })
    }

    /// Cubes of one z slab
    pub fn slab(&self, k: usize) -> impl Iterator<Item = Cube> + '_ {
        let [cx, cy, _] = self.cube_dims();
        (0..cy).flat_map(move |j| (0..cx).filter_map(move |i| self.cube(i, j, k)))
    }

    /// Corner positions and values of a cube
    #[inline]
    pub fn corners(&self, cube: &Cube) -> ([Point3f; 8], [f32; 8]) {
        (
            cube.corners.map(|c| self.positions[c]),
            cube.corners.map(|c| self.values[c]),
        )
    }

    fn clear(&mut self) {
        self.positions.clear();
        self.values.clear();
        self.dims = [0; 3];
    }

    fn try_reserve(&mut self, count: usize) -> Result<()> {
        self.positions
            .try_reserve_exact(count)
            .map_err(|e| Error::out_of_memory("lattice positions", count, Some(e)))?;
        self.values
            .try_reserve_exact(count)
            .map_err(|e| Error::out_of_memory("lattice values", count, Some(e)))
    }
}

/// Fills a `SampleField` by evaluating the fractal at every lattice point
#[derive(Debug, Clone)]
pub struct GridSampler {
    grid: GridSpec,
    evaluator: FractalEvaluator,
}

impl GridSampler {
    /// Create a sampler for `grid`; the evaluator is built with the grid step
    pub fn new(grid: GridSpec, params: FractalParameters) -> Self {
        Self {
            grid,
            evaluator: FractalEvaluator::new(params, grid.step()),
        }
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn evaluator(&self) -> &FractalEvaluator {
        &self.evaluator
    }

    /// Sample into a new field
    pub fn sample(&self) -> Result<SampleField> {
        let mut field = SampleField::new();
        self.sample_into(&mut field)?;
        Ok(field)
    }

    /// Refill `field`, reusing its allocation when it is large enough
    pub fn sample_into(&self, field: &mut SampleField) -> Result<()> {
        let count = self.grid.sample_count()?;
        let previous_capacity = field.capacity();

        field.clear();
        field.try_reserve(count)?;
        if field.capacity() != previous_capacity {
            debug!(samples = count, "sample field reallocated");
        }

        let [nx, ny, nz] = self.grid.lattice_dims();
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let position = self.grid.position(i, j, k);
                    field.values.push(self.evaluator.evaluate(&position));
                    field.positions.push(position);
                }
            }
        }
        field.dims = [nx, ny, nz];

        Ok(())
    }
}

/// Sample the fractal over a grid
pub fn sample_grid(grid: &GridSpec, params: &FractalParameters) -> Result<SampleField> {
    GridSampler::new(*grid, *params).sample()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_grid() -> GridSpec {
        GridSpec::new(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0), 1.0).unwrap()
    }

    #[test]
    fn test_default_grid() {
        let grid = GridSpec::default();
        assert_eq!(grid.resolution(), [60, 60, 60]);
        assert_eq!(grid.lattice_dims(), [61, 61, 61]);
        assert_eq!(grid.sample_count().unwrap(), 61 * 61 * 61);
        assert_eq!(grid.cube_count().unwrap(), 60 * 60 * 60);
    }

    #[test]
    fn test_grid_validation() {
        let p0 = Point3f::new(-1.0, -1.0, -1.0);
        let p1 = Point3f::new(1.0, 1.0, 1.0);

        assert!(matches!(GridSpec::new(p0, p1, 0.0), Err(Error::InvalidGrid(_))));
        assert!(matches!(GridSpec::new(p0, p1, -0.5), Err(Error::InvalidGrid(_))));
        assert!(matches!(GridSpec::new(p1, p0, 0.5), Err(Error::InvalidGrid(_))));
        assert!(matches!(
            GridSpec::new(p0, Point3f::new(f32::NAN, 1.0, 1.0), 0.5),
            Err(Error::InvalidGrid(_))
        ));
    }

    #[test]
    fn test_resolution_rounds_up() {
        let grid = GridSpec::new(Point3f::origin(), Point3f::new(1.0, 0.5, 0.0), 0.3).unwrap();
        assert_eq!(grid.resolution(), [4, 2, 0]);
        assert_eq!(grid.cube_count().unwrap(), 0);

        // The last coordinate overshoots p1
        assert_relative_eq!(grid.position(4, 0, 0).x, 1.2, epsilon = 1e-6);
    }

    #[test]
    fn test_huge_grid_is_out_of_memory() {
        let grid = GridSpec::centered(1.0e30, 1.0e-30).unwrap();
        assert!(matches!(grid.sample_count(), Err(Error::OutOfMemory(_))));

        let sampler = GridSampler::new(grid, FractalParameters::default());
        assert!(matches!(sampler.sample(), Err(Error::OutOfMemory(_))));
    }

    #[test]
    fn test_linear_order() {
        let field = sample_grid(&unit_grid(), &FractalParameters::default()).unwrap();

        assert_eq!(field.len(), 27);
        assert_eq!(field.positions().len(), field.values().len());
        assert_eq!(field.index(1, 0, 0), 1);
        assert_eq!(field.index(0, 1, 0), 3);
        assert_eq!(field.index(0, 0, 1), 9);
        assert_eq!(field.positions()[0], Point3f::new(-1.0, -1.0, -1.0));
        assert_eq!(field.positions()[field.index(2, 1, 0)], Point3f::new(1.0, 0.0, -1.0));
        assert_eq!(field.positions()[26], Point3f::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_julia_field_values() {
        let field = sample_grid(&unit_grid(), &FractalParameters::default()).unwrap();

        // Only the centre of the 3x3x3 lattice is bounded
        let centre = field.index(1, 1, 1);
        for (index, &value) in field.values().iter().enumerate() {
            let expected = if index == centre { 1.0 } else { 0.0 };
            assert_eq!(value, expected, "lattice point {}", index);
        }
    }

    #[test]
    fn test_cube_corner_order() {
        let field = sample_grid(&unit_grid(), &FractalParameters::default()).unwrap();
        let cube = field.cube(0, 0, 0).unwrap();
        let (positions, _) = field.corners(&cube);

        assert_eq!(cube.corners, [0, 1, 4, 3, 9, 10, 13, 12]);
        for (corner, offset) in CORNER_OFFSETS.iter().enumerate() {
            let delta = positions[corner] - positions[0];
            assert_eq!(delta.x, offset[0] as f32);
            assert_eq!(delta.y, offset[1] as f32);
            assert_eq!(delta.z, offset[2] as f32);
        }

        assert!(field.cube(1, 1, 1).is_some());
        assert!(field.cube(2, 0, 0).is_none());
        assert_eq!(field.cubes().count(), 8);
        assert_eq!(field.slab(1).count(), 4);
    }

    #[test]
    fn test_sample_into_reuses_allocation() {
        let sampler = GridSampler::new(unit_grid(), FractalParameters::default());
        let mut field = sampler.sample().unwrap();
        let positions_ptr = field.positions().as_ptr();
        let values_ptr = field.values().as_ptr();

        sampler.sample_into(&mut field).unwrap();

        assert_eq!(field.len(), 27);
        assert_eq!(field.positions().as_ptr(), positions_ptr);
        assert_eq!(field.values().as_ptr(), values_ptr);
    }
}

//! Generation session: sampling, triangulation and buffer reuse
//!
//! A session owns the sample field and the triangle accumulator. Every call
//! to `regenerate` recomputes the whole mesh from the current parameters,
//! reusing both allocations when they are large enough. The `&mut self`
//! receiver keeps a single generation in flight per session.
//!
//! Triangles are emitted without vertex welding; consumers see duplicate
//! positions along every shared edge.

use crate::accumulator::TriangleAccumulator;
use crate::grid::{GridSampler, GridSpec, SampleField};
use crate::marching_cubes::{MarchingCubesTriangulator, TriangulationStats};
use crate::tables::CORNER_OFFSETS;
use morphosis_core::{Point3f, Result, TriangleBuffer};
use morphosis_fractal::{AdaptiveRefinementController, FractalEvaluator, FractalParameters};
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use crate::parallel::{self, ParallelConfig};

/// Summary of one regeneration
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationReport {
    /// Triangles in the output buffer
    pub triangle_count: usize,
    /// Lattice points sampled
    pub sample_count: usize,
    /// Coarse cubes visited
    pub cube_count: usize,
    /// Coarse cubes that produced no triangles
    pub empty_cubes: usize,
    /// Cells subdivided by adaptive refinement
    pub refined_cells: usize,
    /// Triangles appended past the pre-reserved pool
    pub pool_overflow: usize,
    /// Wall time of the regeneration
    pub elapsed: Duration,
}

/// Owns the buffers of one fractal mesh and regenerates it on demand
#[derive(Debug)]
pub struct GenerationSession {
    grid: GridSpec,
    params: FractalParameters,
    field: SampleField,
    accumulator: TriangleAccumulator,
    triangulator: MarchingCubesTriangulator,
    #[cfg(feature = "parallel")]
    parallel: Option<ParallelConfig>,
}

impl GenerationSession {
    /// Create a session; parameters are validated here, not per sample
    pub fn new(grid: GridSpec, params: FractalParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            grid,
            params,
            field: SampleField::new(),
            accumulator: TriangleAccumulator::new(),
            triangulator: MarchingCubesTriangulator::new(),
            #[cfg(feature = "parallel")]
            parallel: None,
        })
    }

    /// Triangulate with rayon workers. Output order matches the sequential
    /// pass. Adaptive refinement always runs sequentially.
    #[cfg(feature = "parallel")]
    pub fn with_parallel(mut self, config: ParallelConfig) -> Self {
        self.parallel = Some(config);
        self
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn params(&self) -> &FractalParameters {
        &self.params
    }

    /// Replace the parameters; takes effect on the next `regenerate`
    pub fn set_parameters(&mut self, params: FractalParameters) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Replace the lattice; takes effect on the next `regenerate`
    pub fn set_grid(&mut self, grid: GridSpec) {
        self.grid = grid;
    }

    /// Field sampled by the last regeneration
    pub fn field(&self) -> &SampleField {
        &self.field
    }

    /// Triangles of the last regeneration
    pub fn triangles(&self) -> &TriangleBuffer {
        self.accumulator.triangles()
    }

    /// Give up the session, keeping the triangles
    pub fn into_triangles(self) -> TriangleBuffer {
        self.accumulator.into_buffer()
    }

    /// Recompute the field and the mesh from scratch.
    ///
    /// Fails only with `OutOfMemory` when the field or the triangle buffer
    /// cannot grow; the session then holds no triangles.
    pub fn regenerate(&mut self) -> Result<GenerationReport> {
        let result = self.run_generation();
        if result.is_err() {
            self.accumulator.reset();
        }
        result
    }

    fn run_generation(&mut self) -> Result<GenerationReport> {
        let start = Instant::now();
        let sample_count = self.grid.sample_count()?;
        debug!(
            resolution = ?self.grid.resolution(),
            kind = ?self.params.kind,
            formula = ?self.params.formula,
            adaptive = self.params.adaptive,
            "regenerating fractal mesh"
        );

        let sampler = GridSampler::new(self.grid, self.params);
        sampler.sample_into(&mut self.field)?;

        self.accumulator.reset();
        let cube_count = self.grid.cube_count()?;
        self.accumulator
            .reserve_pool(TriangleAccumulator::pool_for_cubes(cube_count)?)?;

        let mut refined_cells = 0;
        let stats = if self.params.adaptive {
            let controller = AdaptiveRefinementController::from_parameters(&self.params);
            self.triangulate_adaptive(sampler.evaluator(), &controller, &mut refined_cells)?
        } else {
            self.triangulate_uniform()?
        };

        let report = GenerationReport {
            triangle_count: self.accumulator.len(),
            sample_count,
            cube_count: stats.cubes,
            empty_cubes: stats.empty_cubes,
            refined_cells,
            pool_overflow: self.accumulator.overflow_count(),
            elapsed: start.elapsed(),
        };

        info!(
            triangles = report.triangle_count,
            cubes = report.cube_count,
            empty_cubes = report.empty_cubes,
            refined_cells = report.refined_cells,
            elapsed_ms = report.elapsed.as_secs_f64() * 1000.0,
            "fractal mesh generated"
        );

        Ok(report)
    }

    #[cfg(feature = "parallel")]
    fn triangulate_uniform(&mut self) -> Result<TriangulationStats> {
        match &self.parallel {
            Some(config) => parallel::triangulate_field(
                &self.triangulator,
                &self.field,
                &mut self.accumulator,
                config,
            ),
            None => self
                .triangulator
                .triangulate_field(&self.field, &mut self.accumulator),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn triangulate_uniform(&mut self) -> Result<TriangulationStats> {
        self.triangulator
            .triangulate_field(&self.field, &mut self.accumulator)
    }

    /// Each coarse cube tested at depth 0; refined cubes are replaced by
    /// their leaf octants
    fn triangulate_adaptive(
        &mut self,
        evaluator: &FractalEvaluator,
        controller: &AdaptiveRefinementController,
        refined_cells: &mut usize,
    ) -> Result<TriangulationStats> {
        let step = self.grid.step();
        let mut stats = TriangulationStats::default();

        for cube in self.field.cubes() {
            let min = self.field.positions()[cube.corners[0]];
            let centre = offset(&min, step / 2.0, [1, 1, 1]);

            let emitted = if controller.should_refine(evaluator, &centre, step, 0) {
                *refined_cells += 1;
                refine_cell(
                    &self.triangulator,
                    evaluator,
                    controller,
                    &mut self.accumulator,
                    min,
                    step,
                    1,
                    refined_cells,
                )?
            } else {
                self.triangulator
                    .triangulate(&self.field, &cube, &mut self.accumulator)?
            };

            stats.cubes += 1;
            stats.triangles += emitted;
            if emitted == 0 {
                stats.empty_cubes += 1;
            }
        }

        debug!(refined_cells = *refined_cells, "adaptive refinement finished");
        Ok(stats)
    }
}

#[inline]
fn offset(min: &Point3f, size: f32, [dx, dy, dz]: [usize; 3]) -> Point3f {
    Point3f::new(
        min.x + dx as f32 * size,
        min.y + dy as f32 * size,
        min.z + dz as f32 * size,
    )
}

/// Split the cell at `min` of edge `size` into octants at `depth`, refining
/// further where the controller asks for it and triangulating the leaves
#[allow(clippy::too_many_arguments)]
fn refine_cell(
    triangulator: &MarchingCubesTriangulator,
    evaluator: &FractalEvaluator,
    controller: &AdaptiveRefinementController,
    accumulator: &mut TriangleAccumulator,
    min: Point3f,
    size: f32,
    depth: u32,
    refined_cells: &mut usize,
) -> Result<usize> {
    let half = size / 2.0;
    let mut emitted = 0;

    for octant in CORNER_OFFSETS {
        let octant_min = offset(&min, half, octant);
        let centre = offset(&octant_min, half / 2.0, [1, 1, 1]);

        emitted += if controller.should_refine(evaluator, &centre, half, depth) {
            *refined_cells += 1;
            refine_cell(
                triangulator,
                evaluator,
                controller,
                accumulator,
                octant_min,
                half,
                depth + 1,
                refined_cells,
            )?
        } else {
            let positions = CORNER_OFFSETS.map(|corner| offset(&octant_min, half, corner));
            let values = positions.map(|p| evaluator.evaluate(&p));
            triangulator.triangulate_corners(&positions, &values, accumulator)?
        };
    }

    Ok(emitted)
}

/// Generate the triangle soup for one grid and parameter set
pub fn generate(grid: &GridSpec, params: &FractalParameters) -> Result<TriangleBuffer> {
    let mut session = GenerationSession::new(*grid, *params)?;
    session.regenerate()?;
    Ok(session.into_triangles())
}

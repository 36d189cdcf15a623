//! Slab-parallel triangulation
//!
//! Cubes are split into z slabs. Each worker triangulates its slab into a
//! private accumulator; the per-slab buffers are then moved into the shared
//! accumulator in slab order, so the result is identical to the sequential
//! pass.

use crate::accumulator::TriangleAccumulator;
use crate::grid::SampleField;
use crate::marching_cubes::{MarchingCubesTriangulator, TriangulationStats};
use morphosis_core::{Error, Result, TriangleBuffer};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Thread pool configuration for parallel triangulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Number of threads to use (None = rayon's global pool)
    pub num_threads: Option<usize>,
    /// Thread name prefix
    pub thread_name_prefix: String,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: "morphosis-mc".to_string(),
        }
    }
}

impl ParallelConfig {
    /// Set number of threads
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Set thread name prefix
    pub fn with_thread_name_prefix(mut self, prefix: &str) -> Self {
        self.thread_name_prefix = prefix.to_string();
        self
    }

    /// Build a dedicated pool, or `None` to run on the global pool
    pub fn build_pool(&self) -> Result<Option<ThreadPool>> {
        let Some(num_threads) = self.num_threads else {
            return Ok(None);
        };

        let prefix = self.thread_name_prefix.clone();
        ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(move |index| format!("{}-{}", prefix, index))
            .build()
            .map(Some)
            .map_err(|e| Error::Unsupported(format!("failed to build thread pool: {}", e)))
    }
}

/// Triangulate every cube of `field` in parallel, appending to `accumulator`
/// in the same order as `MarchingCubesTriangulator::triangulate_field`
pub fn triangulate_field(
    triangulator: &MarchingCubesTriangulator,
    field: &SampleField,
    accumulator: &mut TriangleAccumulator,
    config: &ParallelConfig,
) -> Result<TriangulationStats> {
    match config.build_pool()? {
        Some(pool) => pool.install(|| triangulate_slabs(triangulator, field, accumulator)),
        None => triangulate_slabs(triangulator, field, accumulator),
    }
}

fn triangulate_slabs(
    triangulator: &MarchingCubesTriangulator,
    field: &SampleField,
    accumulator: &mut TriangleAccumulator,
) -> Result<TriangulationStats> {
    let [cx, cy, cz] = field.cube_dims();
    let slab_pool = TriangleAccumulator::pool_for_cubes(cx.saturating_mul(cy))?;

    let slabs = (0..cz)
        .into_par_iter()
        .map(|k| -> Result<(TriangleBuffer, TriangulationStats)> {
            let mut local = TriangleAccumulator::with_pool(slab_pool)?;
            let stats = triangulator.triangulate_cubes(field, field.slab(k), &mut local)?;
            Ok((local.into_buffer(), stats))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut total = TriangulationStats::default();
    for (mut buffer, stats) in slabs {
        accumulator.append_batch(&mut buffer)?;
        total.merge(stats);
    }
    Ok(total)
}

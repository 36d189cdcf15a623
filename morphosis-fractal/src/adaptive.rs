//! Adaptive refinement of lattice cells
//!
//! A cell is refined when the nine samples taken at its corners and centre
//! vary more than the detail threshold, bounded by a maximum depth.

use crate::evaluator::FractalEvaluator;
use crate::params::{FractalParameters, Sampling};
use morphosis_core::Point3f;

/// Mean and population standard deviation of the nine cell samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStatistics {
    pub mean: f32,
    pub std_dev: f32,
}

/// Decides whether a cell is subdivided
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveRefinementController {
    detail_threshold: f32,
    max_depth: u32,
}

impl AdaptiveRefinementController {
    /// Create a new controller
    pub fn new(detail_threshold: f32, max_depth: u32) -> Self {
        Self {
            detail_threshold,
            max_depth,
        }
    }

    /// Controller configured from a parameter set's adaptive settings
    pub fn from_parameters(params: &FractalParameters) -> Self {
        Self::new(params.detail_threshold, params.max_depth)
    }

    pub fn detail_threshold(&self) -> f32 {
        self.detail_threshold
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// True iff `depth < max_depth` and the sample standard deviation of the
    /// cell exceeds the detail threshold
    pub fn should_refine(
        &self,
        evaluator: &FractalEvaluator,
        center: &Point3f,
        size: f32,
        depth: u32,
    ) -> bool {
        if depth >= self.max_depth {
            return false;
        }
        self.cell_statistics(evaluator, center, size).std_dev > self.detail_threshold
    }

    /// Sample the 8 corners and the centre of a cube of edge `size`
    pub fn cell_statistics(
        &self,
        evaluator: &FractalEvaluator,
        center: &Point3f,
        size: f32,
    ) -> CellStatistics {
        let half = size / 2.0;
        let mut samples = [0.0f32; 9];

        for (corner, sample) in samples.iter_mut().take(8).enumerate() {
            let dx = if corner & 1 == 0 { -half } else { half };
            let dy = if corner & 2 == 0 { -half } else { half };
            let dz = if corner & 4 == 0 { -half } else { half };
            let position = Point3f::new(center.x + dx, center.y + dy, center.z + dz);
            *sample = evaluator.evaluate_with(&position, Sampling::Single);
        }
        samples[8] = evaluator.evaluate_with(center, Sampling::Single);

        let mean = samples.iter().sum::<f32>() / 9.0;
        let variance = samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f32>() / 9.0;

        CellStatistics {
            mean,
            std_dev: variance.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn evaluator() -> FractalEvaluator {
        FractalEvaluator::new(FractalParameters::default(), 0.05)
    }

    #[test]
    fn test_uniform_cell_is_not_refined() {
        let controller = AdaptiveRefinementController::new(0.1, 3);
        let far = Point3f::new(5.0, 5.0, 5.0);

        let stats = controller.cell_statistics(&evaluator(), &far, 0.5);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.std_dev, 0.0);
        assert!(!controller.should_refine(&evaluator(), &far, 0.5, 0));
    }

    #[test]
    fn test_boundary_cell_is_refined() {
        let controller = AdaptiveRefinementController::new(0.1, 3);
        let origin = Point3f::origin();

        // Centre bounded, all eight corners at ±1.5 escape
        let stats = controller.cell_statistics(&evaluator(), &origin, 3.0);
        assert_relative_eq!(stats.mean, 1.0 / 9.0, epsilon = 1e-6);
        assert_relative_eq!(stats.std_dev, (8.0f32 / 81.0).sqrt(), epsilon = 1e-6);
        assert!(controller.should_refine(&evaluator(), &origin, 3.0, 0));
        assert!(controller.should_refine(&evaluator(), &origin, 3.0, 2));
    }

    #[test]
    fn test_depth_limit() {
        let controller = AdaptiveRefinementController::new(0.1, 2);
        let origin = Point3f::origin();

        assert!(controller.should_refine(&evaluator(), &origin, 3.0, 1));
        assert!(!controller.should_refine(&evaluator(), &origin, 3.0, 2));
        assert!(!controller.should_refine(&evaluator(), &origin, 3.0, 5));
        assert!(!AdaptiveRefinementController::new(0.1, 0).should_refine(&evaluator(), &origin, 3.0, 0));
    }

    #[test]
    fn test_threshold_is_strict() {
        let origin = Point3f::origin();
        let std_dev = AdaptiveRefinementController::new(0.0, 1)
            .cell_statistics(&evaluator(), &origin, 3.0)
            .std_dev;

        assert!(!AdaptiveRefinementController::new(std_dev, 3).should_refine(&evaluator(), &origin, 3.0, 0));
    }

    #[test]
    fn test_from_parameters() {
        let params = FractalParameters::default().with_adaptive(0.25, 4);
        let controller = AdaptiveRefinementController::from_parameters(&params);
        assert_eq!(controller.detail_threshold(), 0.25);
        assert_eq!(controller.max_depth(), 4);
    }
}

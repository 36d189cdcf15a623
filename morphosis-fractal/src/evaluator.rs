//! Escape-time evaluation of the quaternion fractal field
//!
//! `FractalEvaluator::evaluate` maps a 3D position onto the field value:
//! `0.0` for points whose orbit escapes, `1.0` for bounded points, and the
//! mean of the sub-samples in `[0, 1]` when supersampling is active. The
//! evaluator holds no mutable state and is safe to share between threads.

use crate::params::{FractalKind, FractalParameters, Formula, Sampling};
use morphosis_core::{Point3f, Quaternion, Quaterniond};
use nalgebra::RealField;

/// Evaluates the fractal field for one parameter set and grid step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractalEvaluator {
    params: FractalParameters,
    step_size: f32,
}

impl FractalEvaluator {
    /// Create an evaluator. `step_size` is the lattice spacing, used to
    /// derive the supersampling sub-grid.
    pub fn new(params: FractalParameters, step_size: f32) -> Self {
        Self { params, step_size }
    }

    /// Parameters this evaluator was built with
    pub fn params(&self) -> &FractalParameters {
        &self.params
    }

    /// Lattice spacing used for supersampling
    pub fn step_size(&self) -> f32 {
        self.step_size
    }

    /// Field value at `position`, supersampled when the factor is above 1
    #[inline]
    pub fn evaluate(&self, position: &Point3f) -> f32 {
        self.evaluate_with(position, Sampling::Supersampled)
    }

    /// Field value at `position` with explicit control over supersampling
    pub fn evaluate_with(&self, position: &Point3f, sampling: Sampling) -> f32 {
        let n = self.params.supersampling;
        if sampling == Sampling::Single || n <= 1 {
            return self.evaluate_point(position);
        }

        let total: f32 = self
            .supersample_positions(position)
            .map(|p| self.evaluate_with(&p, Sampling::Single))
            .sum();
        total / (n as f32).powi(3)
    }

    /// The `N×N×N` sub-grid centred on `position`, spacing `step / 2N`,
    /// in x-major order. Yields only `position` itself when `N ≤ 1`.
    pub fn supersample_positions(&self, position: &Point3f) -> impl Iterator<Item = Point3f> {
        let n = self.params.supersampling.max(1);
        let spacing = self.step_size / (2.0 * n as f32);
        let centre = (n - 1) as f32 / 2.0;
        let offset = move |i: u32| (i as f32 - centre) * spacing;
        let origin = *position;

        (0..n).flat_map(move |x| {
            (0..n).flat_map(move |y| {
                (0..n).map(move |z| {
                    Point3f::new(origin.x + offset(x), origin.y + offset(y), origin.z + offset(z))
                })
            })
        })
    }

    fn evaluate_point(&self, position: &Point3f) -> f32 {
        let params = &self.params;
        let seed = params.c.scale(0.1);

        if params.is_deep_zoom() {
            let zoom = params.zoom_level;
            let pos = [
                position.x as f64 / zoom,
                position.y as f64 / zoom,
                position.z as f64 / zoom,
            ];
            let w = params.w as f64 / zoom;
            let threshold = params.threshold as f64;
            let phase = (pos[0] + pos[1] + pos[2]) as f32;

            sample_kind(
                params,
                pos,
                w,
                Quaterniond::from(params.c),
                Quaterniond::from(seed),
                threshold * threshold,
                phase,
            )
        } else {
            let pos = if params.zoom_level > 1.0 {
                let zoom = params.zoom_level as f32;
                [position.x / zoom, position.y / zoom, position.z / zoom]
            } else {
                [position.x, position.y, position.z]
            };
            let phase = pos[0] + pos[1] + pos[2];

            sample_kind(
                params,
                pos,
                params.w,
                params.c,
                seed,
                params.threshold_squared(),
                phase,
            )
        }
    }
}

/// Evaluate one position with the given parameters and lattice step
pub fn evaluate(position: &Point3f, params: &FractalParameters, step_size: f32) -> f32 {
    FractalEvaluator::new(*params, step_size).evaluate(position)
}

fn sample_kind<T: RealField + Copy>(
    params: &FractalParameters,
    pos: [T; 3],
    w: T,
    c: Quaternion<T>,
    seed: Quaternion<T>,
    threshold_sq: T,
    phase: f32,
) -> f32 {
    let point = Quaternion::new(pos[0], pos[1], pos[2], w);
    let julia = || iterate(params.formula, point, c, params.max_iterations, threshold_sq);
    let mandelbrot = || iterate(params.formula, seed, point, params.max_iterations, threshold_sq);

    match params.kind {
        FractalKind::Julia => julia(),
        FractalKind::Mandelbrot => mandelbrot(),
        FractalKind::Hybrid => {
            let blend = 0.5 + 0.5 * phase.sin();
            julia() * blend + mandelbrot() * (1.0 - blend)
        }
    }
}

/// Pick the monomorphized loop for `formula` once, outside the iteration
fn iterate<T: RealField + Copy>(
    formula: Formula,
    z: Quaternion<T>,
    c: Quaternion<T>,
    max_iterations: u32,
    threshold_sq: T,
) -> f32 {
    match formula {
        Formula::Standard => escape_time(z, c, max_iterations, threshold_sq, Quaternion::square),
        Formula::Cubic => escape_time(z, c, max_iterations, threshold_sq, Quaternion::cube),
        Formula::QuadraticLinear => {
            escape_time(z, c, max_iterations, threshold_sq, |z| z.square() + z)
        }
        Formula::MagnitudeBased => escape_time(z, c, max_iterations, threshold_sq, |z| {
            Quaternion::from_real(z.magnitude_squared()) - z.square()
        }),
    }
}

#[inline(always)]
fn escape_time<T, F>(mut z: Quaternion<T>, c: Quaternion<T>, max_iterations: u32, threshold_sq: T, f: F) -> f32
where
    T: RealField + Copy,
    F: Fn(Quaternion<T>) -> Quaternion<T>,
{
    for _ in 0..max_iterations {
        z = f(z) + c;
        if z.magnitude_squared() > threshold_sq {
            return 0.0;
        }
    }
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Precision;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_position(rng: &mut StdRng) -> Point3f {
        Point3f::new(
            rng.gen_range(-1.5..1.5),
            rng.gen_range(-1.5..1.5),
            rng.gen_range(-1.5..1.5),
        )
    }

    #[test]
    fn test_julia_origin_is_bounded() {
        let evaluator = FractalEvaluator::new(FractalParameters::default(), 0.05);
        assert_eq!(evaluator.evaluate(&Point3f::origin()), 1.0);
    }

    #[test]
    fn test_julia_far_point_escapes() {
        let evaluator = FractalEvaluator::new(FractalParameters::default(), 0.05);
        assert_eq!(evaluator.evaluate(&Point3f::new(1.0, 1.0, 1.0)), 0.0);
        assert_eq!(evaluator.evaluate(&Point3f::new(-1.5, 1.5, -1.5)), 0.0);
    }

    #[test]
    fn test_mandelbrot_dispatch() {
        let params = FractalParameters::default().with_kind(FractalKind::Mandelbrot);
        let evaluator = FractalEvaluator::new(params, 0.05);

        assert_eq!(evaluator.evaluate(&Point3f::origin()), 1.0);
        assert_eq!(evaluator.evaluate(&Point3f::new(1.0, 1.0, 1.0)), 0.0);
        // Bounded for Mandelbrot, escapes for Julia
        assert_eq!(evaluator.evaluate(&Point3f::new(-1.0, 0.0, 0.0)), 1.0);
        assert_eq!(
            evaluate(&Point3f::new(-1.0, 0.0, 0.0), &FractalParameters::default(), 0.05),
            0.0
        );
    }

    #[test]
    fn test_hybrid_blends_between_kinds() {
        let params = FractalParameters::default().with_kind(FractalKind::Hybrid);
        let evaluator = FractalEvaluator::new(params, 0.05);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let p = random_position(&mut rng);
            let julia = evaluate(&p, &params.with_kind(FractalKind::Julia), 0.05);
            let mandelbrot = evaluate(&p, &params.with_kind(FractalKind::Mandelbrot), 0.05);
            let blend = 0.5 + 0.5 * (p.x + p.y + p.z).sin();

            let value = evaluator.evaluate(&p);
            assert!((0.0..=1.0).contains(&value));
            assert_relative_eq!(value, julia * blend + mandelbrot * (1.0 - blend));
        }
    }

    #[test]
    fn test_unknown_codes_match_defaults() {
        let fallback = FractalParameters::default()
            .with_kind(FractalKind::from_code(42))
            .with_formula(Formula::from_code(42));
        let standard = FractalParameters::default();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..100 {
            let p = random_position(&mut rng);
            assert_eq!(evaluate(&p, &fallback, 0.05), evaluate(&p, &standard, 0.05));
        }
    }

    #[test]
    fn test_determinism() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for formula in 0..4 {
            for kind in 0..3 {
                let params = FractalParameters::default()
                    .with_kind(FractalKind::from_code(kind))
                    .with_formula(Formula::from_code(formula))
                    .with_supersampling(2);
                let evaluator = FractalEvaluator::new(params, 0.1);

                for _ in 0..100 {
                    let p = random_position(&mut rng);
                    let first = evaluator.evaluate(&p);
                    let second = evaluator.evaluate(&p);
                    assert_eq!(first.to_bits(), second.to_bits());
                    assert_eq!(first.to_bits(), evaluate(&p, &params, 0.1).to_bits());
                }
            }
        }
    }

    #[test]
    fn test_escape_monotonicity() {
        let mut rng = StdRng::seed_from_u64(42);
        for formula in 0..4 {
            let base = FractalParameters::default().with_formula(Formula::from_code(formula));

            for _ in 0..300 {
                let p = random_position(&mut rng);
                let k = rng.gen_range(1..8);
                if evaluate(&p, &base.with_max_iterations(k), 0.05) == 0.0 {
                    for larger in k..k + 8 {
                        assert_eq!(
                            evaluate(&p, &base.with_max_iterations(larger), 0.05),
                            0.0,
                            "position {:?} escaped at {} but not at {}",
                            p,
                            k,
                            larger
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_supersample_positions() {
        let params = FractalParameters::default().with_supersampling(2);
        let evaluator = FractalEvaluator::new(params, 0.4);
        let positions: Vec<Point3f> = evaluator.supersample_positions(&Point3f::origin()).collect();

        assert_eq!(positions.len(), 8);
        // spacing 0.4 / 4 = 0.1, offsets ±0.05
        assert_relative_eq!(positions[0].x, -0.05);
        assert_relative_eq!(positions[0].z, -0.05);
        assert_relative_eq!(positions[1].z, 0.05);
        assert_relative_eq!(positions[7].x, 0.05);

        let single = FractalEvaluator::new(FractalParameters::default(), 0.4);
        let p = Point3f::new(0.3, -0.2, 0.1);
        assert_eq!(single.supersample_positions(&p).collect::<Vec<_>>(), vec![p]);
    }

    #[test]
    fn test_supersampling_is_mean_of_subsamples() {
        let mut rng = StdRng::seed_from_u64(11);
        for n in 2..=3 {
            let params = FractalParameters::default().with_supersampling(n);
            let evaluator = FractalEvaluator::new(params, 0.25);

            for _ in 0..100 {
                let p = random_position(&mut rng);
                let subsamples: Vec<f32> = evaluator
                    .supersample_positions(&p)
                    .map(|s| evaluator.evaluate_with(&s, Sampling::Single))
                    .collect();
                assert_eq!(subsamples.len(), (n * n * n) as usize);

                let mean = subsamples.iter().sum::<f32>() / subsamples.len() as f32;
                let value = evaluator.evaluate(&p);
                assert_relative_eq!(value, mean, epsilon = 1e-6);
                assert!((0.0..=1.0).contains(&value));
            }
        }
    }

    #[test]
    fn test_single_sampling_ignores_factor() {
        let params = FractalParameters::default().with_supersampling(3);
        let evaluator = FractalEvaluator::new(params, 0.05);
        let plain = FractalEvaluator::new(FractalParameters::default(), 0.05);
        let p = Point3f::new(0.2, 0.1, -0.3);

        assert_eq!(evaluator.evaluate_with(&p, Sampling::Single), plain.evaluate(&p));
    }

    #[test]
    fn test_zoom_divides_position() {
        let zoomed = FractalParameters::default().with_zoom_level(4.0);
        let p = Point3f::new(1.2, 0.8, -0.4);
        let scaled = Point3f::new(0.3, 0.2, -0.1);

        assert_eq!(
            evaluate(&p, &zoomed, 0.05),
            evaluate(&scaled, &FractalParameters::default(), 0.05)
        );
    }

    #[test]
    fn test_deep_zoom_uses_double_precision_path() {
        let params = FractalParameters::default()
            .with_precision(Precision::Double)
            .with_zoom_level(1.0e6);
        let evaluator = FractalEvaluator::new(params, 0.05);

        // Everything near the origin after the zoom division is bounded
        assert_eq!(evaluator.evaluate(&Point3f::new(1.5, -1.5, 1.5)), 1.0);

        let mandelbrot = FractalEvaluator::new(params.with_kind(FractalKind::Mandelbrot), 0.05);
        assert_eq!(mandelbrot.evaluate(&Point3f::new(1.5, 1.5, 1.5)), 1.0);
    }

    #[test]
    fn test_deep_zoom_divides_w() {
        let p = Point3f::new(1.5, -1.5, 1.5);
        let single = FractalParameters::default().with_w(1.9).with_zoom_level(1.0e6);
        let double = single.with_precision(Precision::Double);
        assert!(double.is_deep_zoom());

        // Only the position is zoomed in single precision, so w = 1.9 escapes
        assert_eq!(evaluate(&p, &single, 0.05), 0.0);
        // Deep zoom also divides w and the point collapses onto the origin
        assert_eq!(evaluate(&p, &double, 0.05), 1.0);

        // Below the deep-zoom threshold double precision behaves like single
        let shallow = double.with_zoom_level(10.0);
        assert!(!shallow.is_deep_zoom());
        assert_eq!(evaluate(&p, &shallow, 0.05), 0.0);
    }

    #[test]
    fn test_large_supersampling_factor() {
        let params = FractalParameters::default().with_supersampling(2000);
        let evaluator = FractalEvaluator::new(params, 0.05);
        let mut positions = evaluator.supersample_positions(&Point3f::origin());

        // spacing 0.05 / 4000, first offset −999.5 spacings
        let first = positions.next().unwrap();
        assert_relative_eq!(first.x, -999.5 * 0.05 / 4000.0, epsilon = 1e-7);
        assert_relative_eq!(first.z, first.x);
    }
}

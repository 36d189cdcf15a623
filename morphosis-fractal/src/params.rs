//! Fractal parameter set
//!
//! Integer codes coming from interactive front ends are mapped onto closed
//! enums with `from_code`; unknown codes fall back to the Julia kind and the
//! standard formula so parameter cycling never fails mid-session.

use morphosis_core::{Error, Quaternion, Quaternionf, Result};
use nalgebra::RealField;
use serde::{Deserialize, Serialize};

/// Which escape-time set is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FractalKind {
    /// `z₀ = (x, y, z, w)`, constant `c` from the parameters
    #[default]
    Julia,
    /// `c = (x, y, z, w)`, `z₀` a small offset derived from the parameter constant
    Mandelbrot,
    /// Julia and Mandelbrot blended by a sinusoidal weight of the position
    Hybrid,
}

impl FractalKind {
    /// Map an integer code, falling back to `Julia` for unknown codes
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => FractalKind::Mandelbrot,
            2 => FractalKind::Hybrid,
            _ => FractalKind::Julia,
        }
    }

    /// Integer code of this kind
    pub fn code(self) -> i32 {
        match self {
            FractalKind::Julia => 0,
            FractalKind::Mandelbrot => 1,
            FractalKind::Hybrid => 2,
        }
    }
}

/// Non-constant term `f(z)` of the iteration `z ← f(z) + c`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// `z²`
    #[default]
    Standard,
    /// `z³`
    Cubic,
    /// `z² + z`
    QuadraticLinear,
    /// `|z|² − z²`
    MagnitudeBased,
}

impl Formula {
    /// Map an integer code, falling back to `Standard` for unknown codes
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Formula::Cubic,
            2 => Formula::QuadraticLinear,
            3 => Formula::MagnitudeBased,
            _ => Formula::Standard,
        }
    }

    /// Integer code of this formula
    pub fn code(self) -> i32 {
        match self {
            Formula::Standard => 0,
            Formula::Cubic => 1,
            Formula::QuadraticLinear => 2,
            Formula::MagnitudeBased => 3,
        }
    }

    /// Apply the non-constant term to `z`
    #[inline]
    pub fn apply<T: RealField + Copy>(self, z: Quaternion<T>) -> Quaternion<T> {
        match self {
            Formula::Standard => z.square(),
            Formula::Cubic => z.cube(),
            Formula::QuadraticLinear => z.square() + z,
            Formula::MagnitudeBased => Quaternion::from_real(z.magnitude_squared()) - z.square(),
        }
    }
}

/// Arithmetic precision requested for iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    #[default]
    Single,
    /// Only takes effect once the zoom level passes the deep-zoom threshold
    Double,
}

/// Whether a call to the evaluator may supersample.
///
/// Recursive sub-sample evaluations are made with `Single`, so the
/// parameter set itself is never toggled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Honour the supersampling factor of the parameters
    Supersampled,
    /// Evaluate exactly one position
    Single,
}

/// Full parameter set of the fractal field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalParameters {
    /// Julia constant, also the Mandelbrot seed offset
    pub c: Quaternionf,
    /// Fourth coordinate of the sampled 3D slice
    pub w: f32,
    /// Maximum number of iterations (≥ 1)
    pub max_iterations: u32,
    /// Escape radius; `|z|²` is compared against its square
    pub threshold: f32,
    pub kind: FractalKind,
    pub formula: Formula,
    pub precision: Precision,
    /// Magnification (≥ 1); positions are divided by it
    pub zoom_level: f64,
    /// Zoom above which double precision iteration is used when requested
    pub deep_zoom_threshold: f64,
    /// Sub-samples per axis (≥ 1)
    pub supersampling: u32,
    /// Enable adaptive cell refinement
    pub adaptive: bool,
    /// Standard deviation above which a cell is refined
    pub detail_threshold: f32,
    /// Maximum refinement depth
    pub max_depth: u32,
}

impl Default for FractalParameters {
    fn default() -> Self {
        Self {
            c: Quaternion::new(-0.2, 0.8, 0.0, 0.0),
            w: 0.0,
            max_iterations: 6,
            threshold: 2.0,
            kind: FractalKind::Julia,
            formula: Formula::Standard,
            precision: Precision::Single,
            zoom_level: 1.0,
            deep_zoom_threshold: 1000.0,
            supersampling: 1,
            adaptive: false,
            detail_threshold: 0.1,
            max_depth: 3,
        }
    }
}

impl FractalParameters {
    /// Create a parameter set with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Julia constant
    pub fn with_c(mut self, c: Quaternionf) -> Self {
        self.c = c;
        self
    }

    /// Set the `w` slice offset
    pub fn with_w(mut self, w: f32) -> Self {
        self.w = w;
        self
    }

    /// Set the maximum iteration count
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the escape threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the fractal kind
    pub fn with_kind(mut self, kind: FractalKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the iteration formula
    pub fn with_formula(mut self, formula: Formula) -> Self {
        self.formula = formula;
        self
    }

    /// Set the arithmetic precision
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Set the zoom level
    pub fn with_zoom_level(mut self, zoom_level: f64) -> Self {
        self.zoom_level = zoom_level;
        self
    }

    /// Set the supersampling factor
    pub fn with_supersampling(mut self, supersampling: u32) -> Self {
        self.supersampling = supersampling;
        self
    }

    /// Enable adaptive refinement with the given detail threshold and depth
    pub fn with_adaptive(mut self, detail_threshold: f32, max_depth: u32) -> Self {
        self.adaptive = true;
        self.detail_threshold = detail_threshold;
        self.max_depth = max_depth;
        self
    }

    /// `threshold²`, the value `|z|²` is compared against
    pub fn threshold_squared(&self) -> f32 {
        self.threshold * self.threshold
    }

    /// Whether iteration runs in double precision on zoom-divided coordinates
    pub fn is_deep_zoom(&self) -> bool {
        self.precision == Precision::Double && self.zoom_level > self.deep_zoom_threshold
    }

    /// Check the parameter invariants
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations < 1 {
            return Err(Error::InvalidParameters(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(Error::InvalidParameters(format!(
                "escape threshold must be positive, got {}",
                self.threshold
            )));
        }
        if !(self.zoom_level.is_finite() && self.zoom_level >= 1.0) {
            return Err(Error::InvalidParameters(format!(
                "zoom level must be at least 1, got {}",
                self.zoom_level
            )));
        }
        if !(self.deep_zoom_threshold.is_finite() && self.deep_zoom_threshold > 0.0) {
            return Err(Error::InvalidParameters(format!(
                "deep zoom threshold must be positive, got {}",
                self.deep_zoom_threshold
            )));
        }
        if self.supersampling < 1 {
            return Err(Error::InvalidParameters(
                "supersampling factor must be at least 1".to_string(),
            ));
        }
        if !(self.detail_threshold.is_finite() && self.detail_threshold >= 0.0) {
            return Err(Error::InvalidParameters(format!(
                "detail threshold must be non-negative, got {}",
                self.detail_threshold
            )));
        }
        let components = [self.c.x, self.c.y, self.c.z, self.c.w, self.w];
        if components.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameters(
                "fractal constant and w offset must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

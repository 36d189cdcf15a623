//! Quaternion fractal field evaluation for morphosis
//!
//! This crate provides:
//! - The fractal parameter set with its kind/formula/precision variants
//! - The escape-time evaluator (Julia, Mandelbrot, hybrid; four formulas;
//!   single and double precision; supersampling)
//! - The adaptive cell refinement controller

pub mod adaptive;
pub mod evaluator;
pub mod params;

pub use adaptive::*;
pub use evaluator::*;
pub use params::*;

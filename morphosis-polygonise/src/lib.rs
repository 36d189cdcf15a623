//! # Morphosis Polygonise
//!
//! Turns the quaternion fractal field into a triangle soup.
//!
//! This crate samples the fractal over a dense lattice, classifies every
//! lattice cube with the marching cubes tables and accumulates the emitted
//! triangles in a reusable buffer. `GenerationSession` ties the stages
//! together for repeated regeneration.

pub mod accumulator;
pub mod grid;
pub mod marching_cubes;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod pipeline;
pub mod tables;

// Re-export commonly used items
pub use accumulator::*;
pub use grid::*;
pub use marching_cubes::*;
#[cfg(feature = "parallel")]
pub use parallel::ParallelConfig;
pub use pipeline::*;

//! # Morphosis
//!
//! Quaternion Julia/Mandelbrot fractals sampled over a 3D lattice and meshed
//! with marching cubes.
//!
//! This is the umbrella crate that provides convenient access to all morphosis
//! functionality. You can use this crate to get everything in one place, or use
//! individual crates for more granular control over dependencies.
//!
//! ## Crates
//!
//! - **Core**: Quaternions, points, triangles and the triangle buffer
//! - **Fractal**: Parameters, escape-time evaluation and adaptive refinement
//! - **Polygonise**: Lattice sampling, marching cubes and the generation session
//! - **I/O**: Wavefront OBJ export
//!
//! ## Quick Start
//!
//! ```rust
//! use morphosis::prelude::*;
//!
//! let grid = GridSpec::centered(1.5, 0.25)?;
//! let params = FractalParameters::default()
//!     .with_kind(FractalKind::Mandelbrot)
//!     .with_supersampling(1);
//!
//! let mut session = GenerationSession::new(grid, params)?;
//! let report = session.regenerate()?;
//! assert_eq!(report.triangle_count, session.triangles().len());
//! # Ok::<(), morphosis::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables io
//! - `io`: OBJ export
//! - `parallel`: Slab-parallel triangulation on rayon
//! - `all`: Enables all features

// Re-export core functionality
pub use morphosis_core::*;

// Re-export sub-crates
pub use morphosis_fractal as fractal;
pub use morphosis_polygonise as polygonise;

#[cfg(feature = "io")]
pub use morphosis_io as io;

/// Convenient imports for common use cases
pub mod prelude {
    pub use morphosis_core::*;
    pub use morphosis_fractal::*;
    pub use morphosis_polygonise::*;

    #[cfg(feature = "io")]
    pub use morphosis_io::*;
}

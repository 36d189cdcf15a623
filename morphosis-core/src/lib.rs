//! Core data structures and traits for morphosis
//!
//! This crate provides the value types shared by the fractal sampler and the
//! mesher: quaternions, points, triangles, the flat triangle buffer with its
//! render attribute streams, and the common error type.

pub mod attributes;
pub mod error;
pub mod mesh;
pub mod point;
pub mod quaternion;
pub mod traits;

pub use attributes::*;
pub use error::*;
pub use mesh::*;
pub use point::*;
pub use quaternion::*;
pub use traits::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

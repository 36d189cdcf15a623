//! Mesh export for morphosis
//!
//! Writes the triangle soup produced by a generation session to disk.
//! Wavefront OBJ is the only supported format.

pub mod obj;

pub use obj::{ObjWriteOptions, ObjWriter};

use morphosis_core::{Error, Result, TriangleBuffer};
use std::path::Path;

/// Default export file name
pub const DEFAULT_OUTPUT: &str = "fractal.obj";

/// Trait for writing triangle soups to files
pub trait MeshWriter {
    fn write_mesh<P: AsRef<Path>>(triangles: &TriangleBuffer, path: P) -> Result<()>;
}

/// Auto-detect format from the extension and write the mesh
pub fn write_mesh<P: AsRef<Path>>(triangles: &TriangleBuffer, path: P) -> Result<()> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("obj") => ObjWriter::write_mesh(triangles, path),
        _ => Err(Error::Unsupported(format!(
            "Unsupported mesh format: {:?}",
            path.extension()
        ))),
    }
}

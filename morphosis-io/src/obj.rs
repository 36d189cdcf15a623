//! Wavefront OBJ export
//!
//! The triangle soup is written as-is: one `v` line per triangle vertex and
//! one `f` line per triangle, so the file carries the same duplicated
//! positions as the in-memory buffer.

use crate::MeshWriter;
use morphosis_core::{Result, TriangleBuffer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// OBJ writer options
#[derive(Debug, Clone, PartialEq)]
pub struct ObjWriteOptions {
    /// Decimal places for coordinates
    pub precision: usize,
    /// Emit one `vn` per face and reference it from the face line
    pub write_normals: bool,
    /// Optional header comment
    pub comment: Option<String>,
}

impl Default for ObjWriteOptions {
    fn default() -> Self {
        Self {
            precision: 3,
            write_normals: false,
            comment: None,
        }
    }
}

impl ObjWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_normals(mut self, write_normals: bool) -> Self {
        self.write_normals = write_normals;
        self
    }

    pub fn with_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// OBJ mesh writer
pub struct ObjWriter;

impl ObjWriter {
    /// Write triangles to an OBJ file with options
    pub fn write_obj_file<P: AsRef<Path>>(
        triangles: &TriangleBuffer,
        path: P,
        options: &ObjWriteOptions,
    ) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_obj(triangles, options, &mut writer)?;
        writer.flush()?;

        info!(
            path = %path.display(),
            triangles = triangles.len(),
            "mesh exported"
        );
        Ok(())
    }

    /// Write triangles as OBJ text to any writer
    pub fn write_obj<W: Write>(
        triangles: &TriangleBuffer,
        options: &ObjWriteOptions,
        writer: &mut W,
    ) -> Result<()> {
        let prec = options.precision;

        if let Some(comment) = &options.comment {
            for line in comment.lines() {
                writeln!(writer, "# {}", line)?;
            }
        }
        writeln!(writer, "# {} triangles", triangles.len())?;

        for v in triangles.vertices() {
            writeln!(writer, "v {:.prec$} {:.prec$} {:.prec$}", v.x, v.y, v.z, prec = prec)?;
        }

        if options.write_normals {
            for triangle in triangles.iter() {
                let n = triangle.normal();
                writeln!(writer, "vn {:.prec$} {:.prec$} {:.prec$}", n.x, n.y, n.z, prec = prec)?;
            }
        }

        for face in 0..triangles.len() {
            let base = face * 3 + 1;
            if options.write_normals {
                let n = face + 1;
                writeln!(writer, "f {}//{} {}//{} {}//{}", base, n, base + 1, n, base + 2, n)?;
            } else {
                writeln!(writer, "f {} {} {}", base, base + 1, base + 2)?;
            }
        }

        Ok(())
    }
}

impl MeshWriter for ObjWriter {
    fn write_mesh<P: AsRef<Path>>(triangles: &TriangleBuffer, path: P) -> Result<()> {
        Self::write_obj_file(triangles, path, &ObjWriteOptions::default())
    }
}

//! Error types for morphosis

use std::collections::TryReserveError;
use thiserror::Error;

/// Main error type for morphosis operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    /// A field or buffer allocation could not be satisfied. The generation
    /// session is unusable; retry with a coarser grid.
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl Error {
    /// Build an `OutOfMemory` error for a failed reservation of `count` elements of `what`
    pub fn out_of_memory(what: &str, count: usize, source: Option<TryReserveError>) -> Self {
        match source {
            Some(e) => Error::OutOfMemory(format!("cannot reserve {} {}: {}", count, what, e)),
            None => Error::OutOfMemory(format!("cannot reserve {} {}: size overflow", count, what)),
        }
    }
}

/// Result type alias for morphosis operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_memory_message() {
        let err = Error::out_of_memory("samples", 42, None);
        assert!(matches!(err, Error::OutOfMemory(_)));
        assert_eq!(err.to_string(), "Out of memory: cannot reserve 42 samples: size overflow");
    }

    #[test]
    fn test_out_of_memory_from_try_reserve() {
        let mut v: Vec<u64> = Vec::new();
        let reserve_err = v.try_reserve_exact(usize::MAX).unwrap_err();
        let err = Error::out_of_memory("triangles", usize::MAX, Some(reserve_err));
        assert!(err.to_string().starts_with("Out of memory: cannot reserve"));
    }
}

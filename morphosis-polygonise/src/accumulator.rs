//! Append-only, resettable triangle accumulator
//!
//! The accumulator keeps a pre-reserved pool region sized for the worst case
//! of the current lattice. Appends inside the pool never allocate. Past the
//! pool the buffer falls back to doubling growth, logged once per
//! regeneration, and generation continues.

use morphosis_core::{Error, Result, Triangle, TriangleBuffer};
use tracing::{debug, warn};

const MIN_GROWTH: usize = 64;

/// Triangle accumulator with a bounded fast-path pool
#[derive(Debug, Clone, Default)]
pub struct TriangleAccumulator {
    buffer: TriangleBuffer,
    pool_capacity: usize,
    overflow_count: usize,
}

impl TriangleAccumulator {
    /// Create an accumulator without a pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator with a pool of `pool_triangles` triangles
    pub fn with_pool(pool_triangles: usize) -> Result<Self> {
        let mut accumulator = Self::new();
        accumulator.reserve_pool(pool_triangles)?;
        Ok(accumulator)
    }

    /// Worst-case pool size for `cubes` cubes
    pub fn pool_for_cubes(cubes: usize) -> Result<usize> {
        cubes
            .checked_mul(crate::tables::MAX_TRIANGLES_PER_CUBE)
            .ok_or_else(|| Error::out_of_memory("triangles", usize::MAX, None))
    }

    /// Make sure the pool region holds at least `pool_triangles` triangles.
    /// Existing capacity is kept when it already suffices.
    pub fn reserve_pool(&mut self, pool_triangles: usize) -> Result<()> {
        let free = self.buffer.capacity() - self.buffer.len();
        if pool_triangles > free {
            self.buffer.try_reserve_exact(pool_triangles)?;
            debug!(
                pool = pool_triangles,
                capacity = self.buffer.capacity(),
                "triangle pool reserved"
            );
        }
        self.pool_capacity = self.buffer.len() + pool_triangles;
        Ok(())
    }

    /// Append one triangle, amortized O(1)
    #[inline]
    pub fn append(&mut self, triangle: Triangle) -> Result<()> {
        if self.pool_capacity > 0 && self.buffer.len() >= self.pool_capacity {
            self.note_overflow(1);
        }
        if self.buffer.len() >= self.buffer.capacity() {
            self.grow(1)?;
        }
        self.buffer.push(triangle);
        Ok(())
    }

    /// Move every triangle of `batch` to the end, leaving `batch` empty
    pub fn append_batch(&mut self, batch: &mut TriangleBuffer) -> Result<()> {
        let incoming = batch.len();
        let end = self.buffer.len() + incoming;
        if self.pool_capacity > 0 && end > self.pool_capacity {
            self.note_overflow(end - self.pool_capacity.max(self.buffer.len()));
        }
        if end > self.buffer.capacity() {
            self.grow(incoming)?;
        }
        self.buffer.append(batch);
        Ok(())
    }

    /// Drop all triangles, keeping the allocation and the pool for reuse
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.overflow_count = 0;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Triangles the buffer holds without reallocating
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Size of the pre-reserved fast-path region
    pub fn pool_capacity(&self) -> usize {
        self.pool_capacity
    }

    /// Triangles appended past the pool since the last reset. Always zero
    /// when no pool is reserved.
    pub fn overflow_count(&self) -> usize {
        self.overflow_count
    }

    /// The accumulated triangles
    pub fn triangles(&self) -> &TriangleBuffer {
        &self.buffer
    }

    /// Take the accumulated triangles, leaving the accumulator empty
    pub fn into_buffer(self) -> TriangleBuffer {
        self.buffer
    }

    fn note_overflow(&mut self, triangles: usize) {
        if self.overflow_count == 0 {
            warn!(
                pool = self.pool_capacity,
                "triangle pool exhausted, falling back to buffer growth"
            );
        }
        self.overflow_count += triangles;
    }

    /// Grow to at least double the current capacity
    fn grow(&mut self, needed: usize) -> Result<()> {
        let len = self.buffer.len();
        let additional = needed.max(len).max(MIN_GROWTH);
        self.buffer.try_reserve_exact(additional)?;
        debug!(
            triangles = len,
            capacity = self.buffer.capacity(),
            "triangle buffer grown"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morphosis_core::Point3f;

    fn triangle(i: usize) -> Triangle {
        let x = i as f32;
        Triangle::new(
            Point3f::new(x, 0.0, 0.0),
            Point3f::new(x, 1.0, 0.0),
            Point3f::new(x, 0.0, 1.0),
        )
    }

    fn batch(range: std::ops::Range<usize>) -> TriangleBuffer {
        range.map(triangle).collect()
    }

    #[test]
    fn test_append_in_order() {
        let mut acc = TriangleAccumulator::new();
        for i in 0..100 {
            acc.append(triangle(i)).unwrap();
        }

        assert_eq!(acc.len(), 100);
        assert!(acc.capacity() >= 100);
        assert_eq!(acc.overflow_count(), 0);
        for (i, t) in acc.triangles().iter().enumerate() {
            assert_eq!(t, triangle(i));
        }
    }

    #[test]
    fn test_pool_appends_do_not_allocate() {
        let mut acc = TriangleAccumulator::with_pool(40).unwrap();
        let capacity = acc.capacity();
        let ptr = acc.triangles().vertices().as_ptr();

        for i in 0..40 {
            acc.append(triangle(i)).unwrap();
        }

        assert_eq!(acc.capacity(), capacity);
        assert_eq!(acc.triangles().vertices().as_ptr(), ptr);
        assert_eq!(acc.overflow_count(), 0);
    }

    #[test]
    fn test_pool_exhaustion_falls_back() {
        let mut acc = TriangleAccumulator::with_pool(4).unwrap();
        for i in 0..10 {
            acc.append(triangle(i)).unwrap();
        }

        assert_eq!(acc.len(), 10);
        assert_eq!(acc.overflow_count(), 6);
        assert_eq!(acc.triangles().get(9), Some(triangle(9)));
    }

    #[test]
    fn test_reset_preserves_capacity() {
        let mut acc = TriangleAccumulator::new();
        for i in 0..500 {
            acc.append(triangle(i)).unwrap();
        }
        let capacity = acc.capacity();

        acc.reset();
        assert_eq!(acc.len(), 0);
        assert_eq!(acc.capacity(), capacity);

        let ptr = acc.triangles().vertices().as_ptr();
        for i in 0..capacity {
            acc.append(triangle(i)).unwrap();
        }
        assert_eq!(acc.capacity(), capacity);
        assert_eq!(acc.triangles().vertices().as_ptr(), ptr);
    }

    #[test]
    fn test_reset_clears_overflow_state() {
        let mut acc = TriangleAccumulator::with_pool(2).unwrap();
        for i in 0..5 {
            acc.append(triangle(i)).unwrap();
        }
        assert_eq!(acc.overflow_count(), 3);

        acc.reset();
        assert_eq!(acc.overflow_count(), 0);
        acc.append(triangle(0)).unwrap();
        assert_eq!(acc.overflow_count(), 0);
    }

    #[test]
    fn test_append_batch_count_law() {
        let mut acc = TriangleAccumulator::new();
        for i in 0..7 {
            acc.append(triangle(i)).unwrap();
        }
        let mut source = batch(7..20);

        acc.append_batch(&mut source).unwrap();

        assert_eq!(acc.len(), 20);
        assert!(source.is_empty());
        for (i, t) in acc.triangles().iter().enumerate() {
            assert_eq!(t, triangle(i));
        }
    }

    #[test]
    fn test_no_pool_reports_no_overflow() {
        let mut acc = TriangleAccumulator::new();
        acc.append_batch(&mut batch(0..50)).unwrap();
        for i in 50..80 {
            acc.append(triangle(i)).unwrap();
        }

        assert_eq!(acc.len(), 80);
        assert_eq!(acc.pool_capacity(), 0);
        assert_eq!(acc.overflow_count(), 0);
    }

    #[test]
    fn test_append_empty_batch() {
        let mut acc = TriangleAccumulator::with_pool(8).unwrap();
        acc.append(triangle(0)).unwrap();
        acc.append_batch(&mut TriangleBuffer::new()).unwrap();

        assert_eq!(acc.len(), 1);
        assert_eq!(acc.overflow_count(), 0);
    }

    #[test]
    fn test_append_batch_past_pool() {
        let mut acc = TriangleAccumulator::with_pool(5).unwrap();
        acc.append_batch(&mut batch(0..3)).unwrap();
        acc.append_batch(&mut batch(3..9)).unwrap();

        assert_eq!(acc.len(), 9);
        assert_eq!(acc.overflow_count(), 4);
    }

    #[test]
    fn test_reserve_pool_keeps_sufficient_capacity() {
        let mut acc = TriangleAccumulator::with_pool(100).unwrap();
        let ptr = acc.triangles().vertices().as_ptr();

        acc.reserve_pool(50).unwrap();
        assert_eq!(acc.pool_capacity(), 50);
        assert_eq!(acc.triangles().vertices().as_ptr(), ptr);
    }

    #[test]
    fn test_pool_size_overflow() {
        assert_eq!(TriangleAccumulator::pool_for_cubes(8).unwrap(), 40);
        assert!(matches!(
            TriangleAccumulator::pool_for_cubes(usize::MAX),
            Err(Error::OutOfMemory(_))
        ));
    }
}

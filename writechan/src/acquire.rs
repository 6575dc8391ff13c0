//! Buffer acquisition
//!
//! Every write asks an [`AcquireBuffer`] for a fresh, empty buffer. Where the
//! buffer comes from (allocator, pool, arena) is the acquirer's business, and
//! so is getting it back: writers never return buffers.

use std::sync::Arc;

use crate::buffer::{Buffer, VecBuffer};

/// Source of fresh buffers for writers
///
/// `size_hint` is advisory. Implementations may round it up or ignore it,
/// but must return an empty buffer owned by the caller.
pub trait AcquireBuffer: Send + Sync {
    type Buffer: Buffer;

    fn acquire(&self, size_hint: usize) -> Self::Buffer;
}

impl<A: AcquireBuffer + ?Sized> AcquireBuffer for Arc<A> {
    type Buffer = A::Buffer;

    fn acquire(&self, size_hint: usize) -> Self::Buffer {
        (**self).acquire(size_hint)
    }
}

/// Allocates a new [`VecBuffer`] on every call
///
/// # Example
///
/// ```
/// use writechan::{AcquireBuffer, Buffer, Heap};
///
/// let heap = Heap::capped(4);
/// let mut buffer = heap.acquire(10);
/// assert_eq!(buffer.write(b"abcdef").unwrap(), 4);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Heap {
    limit: Option<usize>,
}

impl Heap {
    /// Unbounded buffers
    #[must_use]
    pub fn new() -> Self {
        Self { limit: None }
    }

    /// Buffers that never grow past `limit` bytes
    #[must_use]
    pub fn capped(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl AcquireBuffer for Heap {
    type Buffer = VecBuffer;

    fn acquire(&self, size_hint: usize) -> VecBuffer {
        match self.limit {
            Some(limit) => VecBuffer::with_limit(size_hint, limit),
            None => VecBuffer::with_capacity(size_hint),
        }
    }
}

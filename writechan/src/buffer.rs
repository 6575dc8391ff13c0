//! Owned byte buffers handed from a writer to the queue consumer
//!
//! A buffer is filled exactly once by the writer and then moved into the
//! queue. It is never shared: the writer owns it while filling, the queue
//! while it is pending, and the consumer after dequeue.

use std::collections::TryReserveError;
use std::fmt;
use std::ops::Deref;

/// Error type for buffer operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Growing the buffer failed
    Alloc(TryReserveError),
    /// The buffer already holds `limit` bytes and accepts no more
    Full { limit: usize },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc(e) => write!(f, "Buffer error: {e}"),
            Self::Full { limit } => write!(f, "Buffer error: full at {limit} bytes"),
        }
    }
}

impl std::error::Error for BufferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Alloc(e) => Some(e),
            Self::Full { .. } => None,
        }
    }
}

impl embedded_io::Error for BufferError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::Alloc(_) => embedded_io::ErrorKind::OutOfMemory,
            Self::Full { .. } => embedded_io::ErrorKind::WriteZero,
        }
    }
}

impl From<BufferError> for std::io::Error {
    fn from(e: BufferError) -> Self {
        let kind = match e {
            BufferError::Alloc(_) => std::io::ErrorKind::OutOfMemory,
            BufferError::Full { .. } => std::io::ErrorKind::WriteZero,
        };
        std::io::Error::new(kind, e)
    }
}

/// Owned, growable byte container
///
/// `write` is the copy-in step: `Ok(n)` with `n < data.len()` is a short
/// write, `Err` means nothing was copied.
pub trait Buffer: Send {
    /// Append `data`, returning the number of bytes copied
    ///
    /// # Errors
    /// Returns an error if the buffer cannot take any of `data`.
    fn write(&mut self, data: &[u8]) -> Result<usize, BufferError>;

    fn len(&self) -> usize;

    fn as_slice(&self) -> &[u8];

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `Vec<u8>`-backed buffer with an optional size limit
///
/// # Example
///
/// ```
/// use writechan::{Buffer, VecBuffer};
///
/// let mut buffer = VecBuffer::with_capacity(5);
/// assert_eq!(buffer.write(b"hello").unwrap(), 5);
/// assert_eq!(&*buffer, b"hello");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct VecBuffer {
    data: Vec<u8>,
    limit: Option<usize>,
}

impl VecBuffer {
    /// Create an empty, unbounded buffer
    ///
    /// `size_hint` only pre-sizes the allocation.
    #[must_use]
    pub fn with_capacity(size_hint: usize) -> Self {
        Self {
            data: Vec::with_capacity(size_hint),
            limit: None,
        }
    }

    /// Create an empty buffer that never holds more than `limit` bytes
    #[must_use]
    pub fn with_limit(size_hint: usize, limit: usize) -> Self {
        Self {
            data: Vec::with_capacity(size_hint.min(limit)),
            limit: Some(limit),
        }
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Buffer for VecBuffer {
    fn write(&mut self, data: &[u8]) -> Result<usize, BufferError> {
        if data.is_empty() {
            return Ok(0);
        }

        let to_copy = match self.limit {
            Some(limit) => {
                let room = limit.saturating_sub(self.data.len());
                if room == 0 {
                    return Err(BufferError::Full { limit });
                }
                room.min(data.len())
            }
            None => data.len(),
        };

        self.data.try_reserve(to_copy).map_err(BufferError::Alloc)?;
        self.data.extend_from_slice(&data[..to_copy]);
        Ok(to_copy)
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Deref for VecBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for VecBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<VecBuffer> for Vec<u8> {
    fn from(buffer: VecBuffer) -> Self {
        buffer.data
    }
}

impl fmt::Debug for VecBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VecBuffer(len={}, capacity={}, limit={:?})",
            self.data.len(),
            self.data.capacity(),
            self.limit
        )
    }
}

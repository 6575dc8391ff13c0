//! Byte sink that turns every write into one buffer on a bounded queue
//!
//! A write acquires a fresh buffer sized from the write length, copies the
//! data into it and moves the buffer into the queue. The caller gets back
//! exactly what the copy step reported. The buffer is queued even if the copy
//! was short or failed, so a consumer may see partial or empty buffers.
//!
//! ```text
//!  write(data)
//!     │ acquire(len)         ┌────────────────┐
//!     ├────────────────────► │ AcquireBuffer  │
//!     │ buffer.write(data)   └────────────────┘
//!     │ send(buffer)         ┌────────────────┐      ┌──────────┐
//!     └────────────────────► │ mpsc (bounded) │ ───► │ consumer │
//!                            └────────────────┘      └──────────┘
//! ```
//!
//! The queue send is the only place a write waits. There is no timeout; wrap
//! `write_async` in `tokio::time::timeout` or a `select!` to bound it.

use std::fmt;

use log::{trace, warn};
use tokio::sync::mpsc::{self, error::SendError, Receiver, Sender};

use crate::acquire::{AcquireBuffer, Heap};
use crate::buffer::{Buffer, BufferError, VecBuffer};
use crate::config::{ConfigError, WriterConfig};

/// Writer half of a buffer queue
///
/// Holds the queue's sender and the buffer acquirer, nothing else. Clones
/// share the queue, so any number of threads or tasks can produce into it.
/// Buffers from one producer arrive in the order it wrote them; buffers from
/// different producers interleave in whatever order their sends won the queue.
///
/// # Example
///
/// ```
/// use writechan::{ChannelWriter, WriterConfig};
///
/// let (writer, mut rx) = ChannelWriter::channel(&WriterConfig::default()).unwrap();
/// assert_eq!(writer.write_sync(b"hello").unwrap(), 5);
///
/// let buffer = rx.try_recv().unwrap();
/// assert_eq!(&*buffer, b"hello");
/// ```
pub struct ChannelWriter<A: AcquireBuffer = Heap> {
    queue: Sender<A::Buffer>,
    acquirer: A,
}

impl ChannelWriter<Heap> {
    /// Wrap a queue sender, allocating unbounded buffers
    #[must_use]
    pub fn new(queue: Sender<VecBuffer>) -> Self {
        Self::with_acquirer(queue, Heap::new())
    }

    /// Create a bounded queue and a writer for it
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroCapacity` if `config.queue_capacity` is zero.
    pub fn channel(config: &WriterConfig) -> Result<(Self, Receiver<VecBuffer>), ConfigError> {
        config.validate()?;
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let heap = match config.max_buffer_len {
            Some(limit) => Heap::capped(limit),
            None => Heap::new(),
        };
        Ok((Self::with_acquirer(tx, heap), rx))
    }
}

impl<A: AcquireBuffer> ChannelWriter<A> {
    #[must_use]
    pub fn with_acquirer(queue: Sender<A::Buffer>, acquirer: A) -> Self {
        Self { queue, acquirer }
    }

    /// Write `data` as one buffer, blocking while the queue is full
    ///
    /// Returns the result of copying `data` into the buffer. The buffer is
    /// queued regardless of that result.
    ///
    /// # Errors
    ///
    /// Returns whatever the buffer's copy step returned.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context. Use
    /// [`write_async`](Self::write_async) there.
    pub fn write_sync(&self, data: &[u8]) -> Result<usize, BufferError> {
        let (buffer, copied) = self.fill(data);
        let result = self.queue.blocking_send(buffer);
        self.after_send(result);
        copied
    }

    /// Write `data` as one buffer, waiting while the queue is full
    ///
    /// Dropping the future before it completes drops the filled buffer; it is
    /// never half-queued.
    ///
    /// # Errors
    ///
    /// Returns whatever the buffer's copy step returned.
    pub async fn write_async(&self, data: &[u8]) -> Result<usize, BufferError> {
        let (buffer, copied) = self.fill(data);
        let result = self.queue.send(buffer).await;
        self.after_send(result);
        copied
    }

    /// Free slots in the queue right now
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Slots in the queue when it is empty
    #[must_use]
    pub fn max_capacity(&self) -> usize {
        self.queue.max_capacity()
    }

    /// True once every receiver is gone and writes can no longer be delivered
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    #[must_use]
    pub fn acquirer(&self) -> &A {
        &self.acquirer
    }

    fn fill(&self, data: &[u8]) -> (A::Buffer, Result<usize, BufferError>) {
        let mut buffer = self.acquirer.acquire(data.len());
        let copied = buffer.write(data);
        (buffer, copied)
    }

    fn after_send(&self, result: Result<(), SendError<A::Buffer>>) {
        match result {
            Ok(()) => trace!("ChannelWriter: queued buffer, {} slots left", self.capacity()),
            Err(SendError(buffer)) => warn!(
                "ChannelWriter: queue closed, dropping buffer of {} bytes",
                buffer.len()
            ),
        }
    }
}

impl<A: AcquireBuffer + Clone> Clone for ChannelWriter<A> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            acquirer: self.acquirer.clone(),
        }
    }
}

impl From<Sender<VecBuffer>> for ChannelWriter<Heap> {
    fn from(queue: Sender<VecBuffer>) -> Self {
        Self::new(queue)
    }
}

impl<A: AcquireBuffer> fmt::Debug for ChannelWriter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChannelWriter(capacity={}/{}, closed={})",
            self.queue.capacity(),
            self.queue.max_capacity(),
            self.queue.is_closed()
        )
    }
}

/// Blocking; same rules as [`ChannelWriter::write_sync`]. `write_all` and
/// formatted writes may split data, and every piece becomes its own buffer.
impl<A: AcquireBuffer> std::io::Write for ChannelWriter<A> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.write_sync(buf).map_err(Into::into)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<A: AcquireBuffer> embedded_io::ErrorType for ChannelWriter<A> {
    type Error = BufferError;
}

impl<A: AcquireBuffer> embedded_io::Write for ChannelWriter<A> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.write_sync(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<A: AcquireBuffer> embedded_io_async::Write for ChannelWriter<A> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.write_async(buf).await
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

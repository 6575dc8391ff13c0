//! Byte writes delivered as owned buffers through a bounded queue
//!
//! [`ChannelWriter`] is a byte sink: each write becomes one freshly acquired
//! buffer that is moved into a `tokio::sync::mpsc` queue for a consumer to
//! drain. Writers block (or, in async code, wait) while the queue is full.

pub mod acquire;
pub mod buffer;
pub mod config;
pub mod writer;

pub use acquire::{AcquireBuffer, Heap};
pub use buffer::{Buffer, BufferError, VecBuffer};
pub use config::{ConfigError, WriterConfig};
pub use writer::ChannelWriter;

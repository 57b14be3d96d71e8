//! Stream-to-sink writing with managed writer lifecycle.
//!
//! [`ToWritable`] is a pass-through stream: every value of the source is
//! written to a sink, the write is awaited, and the value is emitted
//! unchanged. Around that it manages the writer's lifecycle:
//!
//! - it watches the sink's closed-notification and stops writing once the
//!   sink is closed, without raising an error;
//! - it closes the sink when the source completes or the stream is dropped;
//! - it aborts the sink when the source or a write fails;
//! - it issues at most one terminal call per stream, on every exit path.
//!
//! # Example
//!
//! ```rust
//! use futures::{stream, StreamExt};
//! use rapids::writer::{MemorySink, WriteError, WriteStreamExt};
//!
//! # tokio_test::block_on(async {
//! let sink = MemorySink::new();
//! let source = stream::iter(vec![Ok(1), Ok(2), Ok(3), Err("boom")]);
//!
//! let out: Vec<_> = source.to_writable_sink(&sink).unwrap().collect().await;
//!
//! assert_eq!(out, vec![Ok(1), Ok(2), Ok(3), Err(WriteError::Source("boom"))]);
//! assert_eq!(sink.written(), vec![1, 2, 3]);
//! assert_eq!(sink.abort_reasons(), vec!["boom".to_string()]);
//! assert_eq!(sink.close_calls(), 0);
//! # });
//! ```
//!
//! # Module Structure
//!
//! - [`SinkWriter`], [`WritableSink`] - the contracts a sink implements
//! - [`ToWritable`], [`WriteStreamExt`] - the adapter and its entry points
//! - [`WriteOptions`] - finalization options
//! - [`MemorySink`] - an in-memory sink that records every call
//! - [`SinkCompat`] - any `futures::Sink` as a writer

mod adapter;
mod compat;
mod error;
mod memory;
mod options;
mod trait_def;

pub use adapter::{ToWritable, WriteStreamExt};
pub use compat::SinkCompat;
pub use error::{AcquireError, WriteError};
pub use memory::{MemoryError, MemorySink, MemoryWriter, SinkState};
pub use options::WriteOptions;
pub use trait_def::{SinkWriter, WritableSink};

#[cfg(test)]
mod tests;

//! Sink and writer contracts.

use futures::future::BoxFuture;

use crate::writer::error::AcquireError;

/// A handle through which values are written to an external sink.
///
/// Every operation *issues* its call synchronously and returns a `'static`
/// future reporting the outcome. Dropping that future does not revoke the
/// call, which is what lets the adapter issue a terminal call from `Drop`.
///
/// Writes are expected to be applied in the order they were issued.
///
/// # Example
///
/// ```rust
/// use rapids::writer::{MemorySink, SinkWriter, WritableSink};
///
/// # tokio_test::block_on(async {
/// let sink = MemorySink::<i32>::new();
/// let mut writer = sink.get_writer().unwrap();
///
/// writer.write(1).await.unwrap();
/// writer.close().await.unwrap();
///
/// assert_eq!(sink.written(), vec![1]);
/// assert!(sink.is_closed());
/// # });
/// ```
pub trait SinkWriter {
    /// The type of values accepted by the sink.
    type Item;

    /// The error reported by failed sink operations.
    type Error;

    /// Issue a write of `item`.
    fn write(&mut self, item: Self::Item) -> BoxFuture<'static, Result<(), Self::Error>>;

    /// Issue a graceful close. Pending writes are flushed first.
    fn close(&mut self) -> BoxFuture<'static, Result<(), Self::Error>>;

    /// Issue an abort, discarding queued writes.
    ///
    /// `reason` is a human-readable description of why the sink is aborted.
    fn abort(&mut self, reason: String) -> BoxFuture<'static, Result<(), Self::Error>>;

    /// A future that resolves once the sink has transitioned to closed,
    /// whatever the cause.
    fn closed(&self) -> BoxFuture<'static, ()>;
}

/// An external resource that hands out writers.
///
/// A sink is locked to at most one writer at a time. Acquiring a second
/// writer while the first is alive fails with [`AcquireError::Locked`].
pub trait WritableSink {
    /// The writer type handed out by this sink.
    type Writer: SinkWriter;

    /// Acquire a dedicated writer for this sink.
    fn get_writer(&self) -> Result<Self::Writer, AcquireError>;
}

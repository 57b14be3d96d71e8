//! Bridge from any `futures::Sink` to the [`SinkWriter`] contract.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};

use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use futures::Future;
use futures::lock::Mutex;
use futures::{Sink, SinkExt};

use crate::writer::trait_def::SinkWriter;

/// A [`SinkWriter`] over a [`futures::Sink`], such as an mpsc sender.
///
/// `futures::Sink` has no abort, so `abort` flushes and closes like `close`.
/// The closed-notification fires once this writer has closed the sink, or
/// once the signal given to [`with_closed`](SinkCompat::with_closed)
/// resolves.
///
/// Unlike [`MemorySink`](crate::writer::MemorySink), operations only make
/// progress while their futures are polled: dropping a
/// [`ToWritable`](crate::writer::ToWritable) over a `SinkCompat` closes the
/// sink only when the `async` feature can drive the close on the current
/// tokio runtime. Use [`ToWritable::cancel`](crate::writer::ToWritable::cancel)
/// otherwise.
///
/// # Example
///
/// ```rust
/// use futures::channel::mpsc;
/// use futures::{stream, StreamExt};
/// use rapids::writer::{SinkCompat, WriteStreamExt};
///
/// # tokio_test::block_on(async {
/// let (tx, rx) = mpsc::unbounded::<i32>();
///
/// let _: Vec<_> = stream::iter(1..=3)
///     .map(Ok::<_, String>)
///     .to_writable(SinkCompat::new(tx))
///     .collect()
///     .await;
///
/// let received: Vec<i32> = rx.collect().await;
/// assert_eq!(received, vec![1, 2, 3]);
/// # });
/// ```
pub struct SinkCompat<Si, T> {
    sink: Arc<Mutex<Si>>,
    closed_tx: Arc<SyncMutex<Option<oneshot::Sender<()>>>>,
    closed: Shared<BoxFuture<'static, ()>>,
    _item: PhantomData<fn(T)>,
}

impl<Si, T> SinkCompat<Si, T>
where
    Si: Sink<T> + Unpin + Send + 'static,
    Si::Error: Send + 'static,
    T: Send + 'static,
{
    /// Wrap `sink`.
    pub fn new(sink: Si) -> Self {
        Self::with_closed(sink, future::pending())
    }

    /// Wrap `sink`, treating it as closed once `external` resolves.
    ///
    /// Use this when the far end can close the sink on its own, such as a
    /// channel whose receiver may be dropped. The closed-notification
    /// fires on whichever comes first: `external`, or a close through
    /// this writer.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures::channel::{mpsc, oneshot};
    /// use futures::{stream, FutureExt, StreamExt};
    /// use rapids::writer::{SinkCompat, WriteStreamExt};
    ///
    /// # tokio_test::block_on(async {
    /// let (tx, rx) = mpsc::unbounded::<i32>();
    /// let (gone_tx, gone_rx) = oneshot::channel::<()>();
    /// drop(rx);
    /// gone_tx.send(()).unwrap();
    ///
    /// let out: Vec<_> = stream::iter(1..=3)
    ///     .map(Ok::<_, String>)
    ///     .to_writable(SinkCompat::with_closed(tx, gone_rx.map(|_| ())))
    ///     .collect()
    ///     .await;
    ///
    /// assert_eq!(out, vec![Ok(1), Ok(2), Ok(3)]);
    /// # });
    /// ```
    pub fn with_closed<F>(sink: Si, external: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel::<()>();
        let closed = future::select(rx.map(|_| ()), external.boxed())
            .map(|_| ())
            .boxed()
            .shared();
        Self {
            sink: Arc::new(Mutex::new(sink)),
            closed_tx: Arc::new(SyncMutex::new(Some(tx))),
            closed,
            _item: PhantomData,
        }
    }

    fn shutdown(&self) -> BoxFuture<'static, Result<(), Si::Error>> {
        let sink = Arc::clone(&self.sink);
        let closed_tx = Arc::clone(&self.closed_tx);
        async move {
            let result = sink.lock().await.close().await;
            let tx = closed_tx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(tx) = tx {
                let _ = tx.send(());
            }
            result
        }
        .boxed()
    }
}

impl<Si, T> fmt::Debug for SinkCompat<Si, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkCompat").finish_non_exhaustive()
    }
}

impl<Si, T> SinkWriter for SinkCompat<Si, T>
where
    Si: Sink<T> + Unpin + Send + 'static,
    Si::Error: Send + 'static,
    T: Send + 'static,
{
    type Item = T;
    type Error = Si::Error;

    fn write(&mut self, item: T) -> BoxFuture<'static, Result<(), Si::Error>> {
        let sink = Arc::clone(&self.sink);
        async move { sink.lock().await.send(item).await }.boxed()
    }

    fn close(&mut self) -> BoxFuture<'static, Result<(), Si::Error>> {
        self.shutdown()
    }

    fn abort(&mut self, _reason: String) -> BoxFuture<'static, Result<(), Si::Error>> {
        #[cfg(feature = "tracing")]
        tracing::debug!("futures sink has no abort, closing instead: {}", _reason);
        self.shutdown()
    }

    fn closed(&self) -> BoxFuture<'static, ()> {
        self.closed.clone().boxed()
    }
}

//! The `ToWritable` stream: forwards every source value into a sink writer.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::stream::{FusedStream, Stream, TryStream};
use futures::FutureExt;

use crate::writer::error::{AcquireError, WriteError};
use crate::writer::options::WriteOptions;
use crate::writer::trait_def::{SinkWriter, WritableSink};

type Outcome<W> = BoxFuture<'static, Result<(), W>>;

enum State<T, E, W> {
    /// Waiting for the next source value.
    Pulling,
    /// A write is in flight; `value` is emitted once it resolves.
    Writing { value: T, write: Outcome<W> },
    /// The single terminal call is in flight.
    Finalizing {
        call: Outcome<W>,
        exit: Exit<E, W>,
    },
    Done,
}

enum Exit<E, W> {
    Complete,
    Fail(WriteError<E, W>),
}

/// A pass-through stream that writes each source value to a sink.
///
/// Created by [`WriteStreamExt::to_writable`] or
/// [`WriteStreamExt::to_writable_sink`]. Each value is written and the write
/// is awaited before the value is emitted downstream, so writes are issued
/// in source order and never overlap.
///
/// # Lifecycle
///
/// - The writer's closed-notification is watched from construction on.
///   Once it fires, remaining values pass through without being written.
/// - When the source completes, the sink is closed (unless
///   [`WriteOptions::skip_close`] was requested) and the close is awaited
///   before the stream ends.
/// - When the source fails or a write fails, the sink is aborted and the
///   error is yielded as the final item. A write that fails because the
///   sink closed meanwhile is not an error: its value passes through.
/// - When the stream is dropped before finishing, the sink is closed as if
///   the source had completed.
///
/// At most one terminal call (`close` or `abort`) reaches the writer, and
/// none does if the sink already reported closed.
///
/// # Example
///
/// ```rust
/// use futures::{stream, StreamExt};
/// use rapids::writer::{MemorySink, WriteStreamExt};
///
/// # tokio_test::block_on(async {
/// let sink = MemorySink::new();
/// let source = stream::iter(vec!["Hello", " ", "Ninja"]).map(Ok::<_, String>);
///
/// let out: Vec<_> = source
///     .to_writable_sink(&sink)
///     .unwrap()
///     .collect()
///     .await;
///
/// assert_eq!(out.len(), 3);
/// assert_eq!(sink.written().concat(), "Hello Ninja");
/// assert_eq!(sink.close_calls(), 1);
/// # });
/// ```
#[must_use = "streams do nothing unless polled"]
pub struct ToWritable<S, W>
where
    S: TryStream,
    W: SinkWriter,
    W::Error: fmt::Debug + Send + 'static,
{
    source: Pin<Box<S>>,
    writer: W,
    options: WriteOptions,
    closed_watch: Option<BoxFuture<'static, ()>>,
    closed: bool,
    finalized: bool,
    state: State<S::Ok, S::Error, W::Error>,
}

// Neither the writer nor buffered values are ever pinned.
impl<S, W> Unpin for ToWritable<S, W>
where
    S: TryStream,
    W: SinkWriter,
    W::Error: fmt::Debug + Send + 'static,
{
}

impl<S, W> ToWritable<S, W>
where
    S: TryStream,
    W: SinkWriter<Item = S::Ok>,
    W::Error: fmt::Debug + Send + 'static,
{
    /// Wrap `source`, writing through an already-acquired `writer`.
    pub fn new(source: S, writer: W) -> Self {
        let closed_watch = writer.closed();

        #[cfg(feature = "tracing")]
        tracing::debug!("sink writer attached");

        Self {
            source: Box::pin(source),
            writer,
            options: WriteOptions::default(),
            closed_watch: Some(closed_watch),
            closed: false,
            finalized: false,
            state: State::Pulling,
        }
    }

    /// Wrap `source`, acquiring a dedicated writer from `sink`.
    pub fn from_sink<K>(source: S, sink: &K) -> Result<Self, AcquireError>
    where
        K: WritableSink<Writer = W>,
    {
        let writer = sink.get_writer()?;
        Ok(Self::new(source, writer))
    }

    /// Replace the finalization options.
    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Leave closing the sink to the caller.
    pub fn skip_close(self) -> Self {
        let options = self.options.skip_close();
        self.with_options(options)
    }

    /// The options in effect.
    pub fn options(&self) -> WriteOptions {
        self.options
    }

    /// Whether the sink is known to be closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether the terminal call has been issued.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Stop writing and close the sink, awaiting the outcome.
    ///
    /// This is the awaitable counterpart of dropping the stream. If a
    /// terminal call is already in flight, its outcome is awaited instead.
    /// With [`WriteOptions::skip_close`] the sink is left open.
    pub async fn cancel(mut self) -> Result<(), W::Error> {
        let call = match std::mem::replace(&mut self.state, State::Done) {
            State::Finalizing { call, .. } => Some(call),
            State::Done => None,
            State::Pulling | State::Writing { .. } => self.issue_close(),
        };

        match call {
            Some(call) => call.await,
            None => Ok(()),
        }
    }
}

impl<S, W> ToWritable<S, W>
where
    S: TryStream,
    W: SinkWriter,
    W::Error: fmt::Debug + Send + 'static,
{
    fn poll_closed(&mut self, cx: &mut Context<'_>) {
        if let Some(watch) = self.closed_watch.as_mut() {
            if watch.poll_unpin(cx).is_ready() {
                self.closed_watch = None;
                if !self.closed {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("sink reported closed, remaining values will not be written");
                    self.closed = true;
                }
            }
        }
    }

    fn issue_close(&mut self) -> Option<Outcome<W::Error>> {
        if self.finalized || self.closed || !self.options.close_on_complete() {
            return None;
        }
        self.finalized = true;
        self.closed = true;

        #[cfg(feature = "tracing")]
        tracing::debug!("closing sink");

        Some(self.writer.close())
    }

    fn issue_abort(&mut self, reason: String) -> Option<Outcome<W::Error>> {
        if self.finalized || self.closed {
            return None;
        }
        self.finalized = true;
        self.closed = true;

        #[cfg(feature = "tracing")]
        tracing::debug!("aborting sink: {}", reason);

        Some(self.writer.abort(reason))
    }

    /// Abort the sink and park `error` until the abort resolves. Returns the
    /// error straight back when no abort is needed.
    fn fail(
        &mut self,
        reason: String,
        error: WriteError<S::Error, W::Error>,
    ) -> Option<WriteError<S::Error, W::Error>> {
        match self.issue_abort(reason) {
            Some(call) => {
                self.state = State::Finalizing {
                    call,
                    exit: Exit::Fail(error),
                };
                None
            }
            None => {
                self.state = State::Done;
                Some(error)
            }
        }
    }
}

impl<S, W> Stream for ToWritable<S, W>
where
    S: TryStream,
    S::Ok: Clone,
    S::Error: fmt::Display,
    W: SinkWriter<Item = S::Ok>,
    W::Error: fmt::Debug + Send + 'static,
{
    type Item = Result<S::Ok, WriteError<S::Error, W::Error>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            this.poll_closed(cx);

            match std::mem::replace(&mut this.state, State::Done) {
                State::Pulling => match this.source.as_mut().try_poll_next(cx) {
                    Poll::Pending => {
                        this.state = State::Pulling;
                        return Poll::Pending;
                    }
                    Poll::Ready(Some(Ok(value))) => {
                        // Pulling may have closed the sink.
                        this.poll_closed(cx);
                        if this.closed {
                            #[cfg(feature = "tracing")]
                            tracing::trace!("sink closed, skipping write");
                            this.state = State::Pulling;
                            return Poll::Ready(Some(Ok(value)));
                        }
                        let write = this.writer.write(value.clone());
                        this.state = State::Writing { value, write };
                    }
                    Poll::Ready(Some(Err(error))) => {
                        let reason = error.to_string();
                        if let Some(error) = this.fail(reason, WriteError::Source(error)) {
                            return Poll::Ready(Some(Err(error)));
                        }
                    }
                    Poll::Ready(None) => match this.issue_close() {
                        Some(call) => {
                            this.state = State::Finalizing {
                                call,
                                exit: Exit::Complete,
                            };
                        }
                        None => return Poll::Ready(None),
                    },
                },
                State::Writing { value, mut write } => match write.poll_unpin(cx) {
                    Poll::Pending => {
                        this.state = State::Writing { value, write };
                        return Poll::Pending;
                    }
                    Poll::Ready(Ok(())) => {
                        this.state = State::Pulling;
                        return Poll::Ready(Some(Ok(value)));
                    }
                    Poll::Ready(Err(error)) => {
                        this.poll_closed(cx);
                        if this.closed {
                            #[cfg(feature = "tracing")]
                            tracing::trace!("write raced a sink close, dropped: {:?}", error);
                            this.state = State::Pulling;
                            return Poll::Ready(Some(Ok(value)));
                        }
                        #[cfg(feature = "tracing")]
                        tracing::warn!("sink write failed: {:?}", error);
                        let reason = format!("write failed: {:?}", error);
                        if let Some(error) = this.fail(reason, WriteError::Write(error)) {
                            return Poll::Ready(Some(Err(error)));
                        }
                    }
                },
                State::Finalizing { mut call, exit } => match call.poll_unpin(cx) {
                    Poll::Pending => {
                        this.state = State::Finalizing { call, exit };
                        return Poll::Pending;
                    }
                    Poll::Ready(result) => {
                        return match (exit, result) {
                            (Exit::Complete, Ok(())) => Poll::Ready(None),
                            (Exit::Complete, Err(error)) => {
                                Poll::Ready(Some(Err(WriteError::Close(error))))
                            }
                            (Exit::Fail(error), Ok(())) => Poll::Ready(Some(Err(error))),
                            (Exit::Fail(error), Err(cleanup)) => {
                                report_cleanup_failure(&cleanup);
                                Poll::Ready(Some(Err(error)))
                            }
                        };
                    }
                },
                State::Done => return Poll::Ready(None),
            }
        }
    }
}

impl<S, W> FusedStream for ToWritable<S, W>
where
    S: TryStream,
    S::Ok: Clone,
    S::Error: fmt::Display,
    W: SinkWriter<Item = S::Ok>,
    W::Error: fmt::Debug + Send + 'static,
{
    fn is_terminated(&self) -> bool {
        matches!(self.state, State::Done)
    }
}

impl<S, W> Drop for ToWritable<S, W>
where
    S: TryStream,
    W: SinkWriter,
    W::Error: fmt::Debug + Send + 'static,
{
    fn drop(&mut self) {
        if matches!(self.state, State::Done) {
            return;
        }
        if let Some(call) = self.issue_close() {
            #[cfg(feature = "tracing")]
            tracing::debug!("stream dropped before completion, sink closed");
            drive_outcome(call);
        }
    }
}

impl<S, W> fmt::Debug for ToWritable<S, W>
where
    S: TryStream,
    W: SinkWriter,
    W::Error: fmt::Debug + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Pulling => "pulling",
            State::Writing { .. } => "writing",
            State::Finalizing { .. } => "finalizing",
            State::Done => "done",
        };
        f.debug_struct("ToWritable")
            .field("options", &self.options)
            .field("closed", &self.closed)
            .field("finalized", &self.finalized)
            .field("state", &state)
            .finish()
    }
}

fn report_cleanup_failure<W: fmt::Debug>(error: &W) {
    #[cfg(feature = "tracing")]
    tracing::warn!("sink cleanup failed: {:?}", error);
    #[cfg(not(feature = "tracing"))]
    eprintln!("sink cleanup failed: {:?}", error);
}

#[cfg(feature = "async")]
fn drive_outcome<W>(call: Outcome<W>)
where
    W: fmt::Debug + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(error) = call.await {
                    report_cleanup_failure(&error);
                }
            });
        }
        Err(_) => drop(call),
    }
}

#[cfg(not(feature = "async"))]
fn drive_outcome<W>(call: Outcome<W>)
where
    W: fmt::Debug + Send + 'static,
{
    // The close is already issued; nothing left to drive its outcome.
    drop(call);
}

/// Extension methods attaching a sink writer to any fallible stream.
///
/// Plain streams lift with `map(Ok::<_, E>)`.
pub trait WriteStreamExt: TryStream + Sized {
    /// Write every value through an already-acquired `writer`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures::{stream, StreamExt};
    /// use rapids::writer::{MemorySink, WritableSink, WriteStreamExt};
    ///
    /// # tokio_test::block_on(async {
    /// let sink = MemorySink::new();
    /// let writer = sink.get_writer().unwrap();
    ///
    /// let out: Vec<_> = stream::iter(1..=5)
    ///     .map(Ok::<_, String>)
    ///     .to_writable(writer)
    ///     .collect()
    ///     .await;
    ///
    /// assert_eq!(out.len(), 5);
    /// assert_eq!(sink.written(), vec![1, 2, 3, 4, 5]);
    /// # });
    /// ```
    fn to_writable<W>(self, writer: W) -> ToWritable<Self, W>
    where
        W: SinkWriter<Item = Self::Ok>,
        W::Error: fmt::Debug + Send + 'static,
    {
        ToWritable::new(self, writer)
    }

    /// Acquire a writer from `sink` and write every value through it.
    fn to_writable_sink<K>(self, sink: &K) -> Result<ToWritable<Self, K::Writer>, AcquireError>
    where
        K: WritableSink,
        K::Writer: SinkWriter<Item = Self::Ok>,
        <K::Writer as SinkWriter>::Error: fmt::Debug + Send + 'static,
    {
        ToWritable::from_sink(self, sink)
    }
}

impl<S: TryStream> WriteStreamExt for S {}

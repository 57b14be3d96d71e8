//! Operator arguments that are either fixed values or streams.
//!
//! Most operators take auxiliary arguments such as a range bound, a
//! divisor or a comparison list. Each one is an [`Input`]: a plain value,
//! or a stream whose *latest* value is used whenever the main stream
//! produces an item.
//!
//! [`WithLatest`] pairs each source item with the latest value of one or
//! more inputs. Source items that arrive before every input has produced a
//! value are dropped.
//!
//! # Example
//!
//! ```rust
//! use futures::{stream, StreamExt};
//! use rapids::input::{Input, WithLatest};
//!
//! # tokio_test::block_on(async {
//! let threshold = Input::from(2);
//! let pairs: Vec<_> = WithLatest::new(stream::iter(1..=3), threshold.latest())
//!     .collect()
//!     .await;
//!
//! assert_eq!(pairs, vec![(1, 2), (2, 2), (3, 2)]);
//! # });
//! ```

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, FusedStream, Stream, StreamExt};

/// A fixed value or a stream of values.
pub enum Input<T> {
    /// A value that never changes.
    Value(T),
    /// A stream whose most recent item is the current value.
    Stream(BoxStream<'static, T>),
}

impl<T> Input<T> {
    /// A fixed input.
    pub fn value(value: T) -> Self {
        Self::Value(value)
    }

    /// An input that follows `stream`.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }

    /// Start tracking this input's latest value.
    pub fn latest(self) -> LatestValue<T> {
        match self {
            Self::Value(value) => LatestValue {
                current: Some(value),
                stream: None,
            },
            Self::Stream(stream) => LatestValue {
                current: None,
                stream: Some(stream),
            },
        }
    }
}

impl<T> From<T> for Input<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Input<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Stream(_) => f.write_str("Stream(<stream>)"),
        }
    }
}

/// Something that can report the latest value of one or more inputs.
pub trait Latest {
    /// The combined latest value.
    type Output;

    /// Drain every ready update and return the newest value, or `None` if
    /// some input has not produced a value yet.
    ///
    /// Pending inputs register `cx` for wake-up.
    fn poll_latest(&mut self, cx: &mut Context<'_>) -> Option<Self::Output>;
}

/// Tracks the latest value of a single [`Input`].
pub struct LatestValue<T> {
    current: Option<T>,
    stream: Option<BoxStream<'static, T>>,
}

impl<T: Clone> Latest for LatestValue<T> {
    type Output = T;

    fn poll_latest(&mut self, cx: &mut Context<'_>) -> Option<T> {
        if let Some(stream) = self.stream.as_mut() {
            loop {
                match stream.poll_next_unpin(cx) {
                    Poll::Ready(Some(value)) => self.current = Some(value),
                    Poll::Ready(None) => {
                        // An exhausted input keeps its last value.
                        self.stream = None;
                        break;
                    }
                    Poll::Pending => break,
                }
            }
        }
        self.current.clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for LatestValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatestValue")
            .field("current", &self.current)
            .field("live", &self.stream.is_some())
            .finish()
    }
}

impl<A: Latest, B: Latest> Latest for (A, B) {
    type Output = (A::Output, B::Output);

    fn poll_latest(&mut self, cx: &mut Context<'_>) -> Option<Self::Output> {
        let a = self.0.poll_latest(cx);
        let b = self.1.poll_latest(cx);
        Some((a?, b?))
    }
}

impl<A: Latest, B: Latest, C: Latest> Latest for (A, B, C) {
    type Output = (A::Output, B::Output, C::Output);

    fn poll_latest(&mut self, cx: &mut Context<'_>) -> Option<Self::Output> {
        let a = self.0.poll_latest(cx);
        let b = self.1.poll_latest(cx);
        let c = self.2.poll_latest(cx);
        Some((a?, b?, c?))
    }
}

/// Pairs each source item with the latest value of `L`.
///
/// Ends when the source ends; inputs never end the stream.
#[must_use = "streams do nothing unless polled"]
pub struct WithLatest<S, L> {
    source: Pin<Box<S>>,
    latest: L,
    done: bool,
}

impl<S, L> WithLatest<S, L>
where
    S: Stream,
    L: Latest,
{
    /// Combine `source` with `latest`.
    pub fn new(source: S, latest: L) -> Self {
        Self {
            source: Box::pin(source),
            latest,
            done: false,
        }
    }
}

impl<S, L> Unpin for WithLatest<S, L> {}

impl<S, L> Stream for WithLatest<S, L>
where
    S: Stream,
    L: Latest,
{
    type Item = (S::Item, L::Output);

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        loop {
            let latest = this.latest.poll_latest(cx);
            match this.source.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => {
                    if let Some(latest) = latest {
                        return Poll::Ready(Some((item, latest)));
                    }
                }
                Poll::Ready(None) => {
                    this.done = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl<S, L> FusedStream for WithLatest<S, L>
where
    S: Stream,
    L: Latest,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}

impl<S, L> fmt::Debug for WithLatest<S, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithLatest")
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

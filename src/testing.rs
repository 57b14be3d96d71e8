//! Testing utilities for code that writes streams to sinks.
//!
//! This module provides a builder for scripted fallible sources and
//! assertion macros over [`MemorySink`](crate::writer::MemorySink)
//! recordings.
//!
//! # Examples
//!
//! ## MockSource Builder
//!
//! ```rust
//! use futures::StreamExt;
//! use rapids::testing::MockSource;
//!
//! # tokio_test::block_on(async {
//! let items: Vec<_> = MockSource::new().emit(1).emit(2).fail("boom").build().collect().await;
//! assert_eq!(items, vec![Ok(1), Ok(2), Err("boom")]);
//! # });
//! ```
//!
//! ## Assertion Macros
//!
//! ```rust
//! use futures::StreamExt;
//! use rapids::testing::MockSource;
//! use rapids::writer::{MemorySink, WriteStreamExt};
//! use rapids::{assert_closed_once, assert_written};
//!
//! # tokio_test::block_on(async {
//! let sink = MemorySink::new();
//! let source = MockSource::<_, String>::new().emit_all(vec!['a', 'b']).build();
//! let _: Vec<_> = source.to_writable_sink(&sink).unwrap().collect().await;
//!
//! assert_written!(sink, vec!['a', 'b']);
//! assert_closed_once!(sink);
//! # });
//! ```

use futures::stream::{self, Iter};

/// Builder for scripted fallible sources.
///
/// Each call appends one item; [`build`](MockSource::build) turns the script
/// into a stream that yields the items in order and then completes.
///
/// # Example
///
/// ```rust
/// use futures::StreamExt;
/// use rapids::testing::MockSource;
///
/// # tokio_test::block_on(async {
/// let items: Vec<Result<i32, &str>> = MockSource::new()
///     .emit_all(1..=2)
///     .fail("bad input")
///     .emit(3)
///     .build()
///     .collect()
///     .await;
///
/// assert_eq!(items, vec![Ok(1), Ok(2), Err("bad input"), Ok(3)]);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockSource<T, E> {
    items: Vec<Result<T, E>>,
}

impl<T, E> MockSource<T, E> {
    /// Create an empty script.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append a value.
    pub fn emit(mut self, value: T) -> Self {
        self.items.push(Ok(value));
        self
    }

    /// Append every value of `values`.
    pub fn emit_all(mut self, values: impl IntoIterator<Item = T>) -> Self {
        self.items.extend(values.into_iter().map(Ok));
        self
    }

    /// Append an error.
    pub fn fail(mut self, error: E) -> Self {
        self.items.push(Err(error));
        self
    }

    /// Number of scripted items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is scripted.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Build the source stream.
    pub fn build(self) -> Iter<std::vec::IntoIter<Result<T, E>>> {
        stream::iter(self.items)
    }
}

impl<T, E> Default for MockSource<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert that a memory sink received exactly the expected values.
///
/// # Example
///
/// ```rust
/// use rapids::assert_written;
/// use rapids::writer::MemorySink;
///
/// let sink = MemorySink::<i32>::new();
/// assert_written!(sink, Vec::<i32>::new());
/// ```
#[macro_export]
macro_rules! assert_written {
    ($sink:expr, $expected:expr) => {
        assert_eq!($sink.written(), $expected, "sink received unexpected values");
    };
}

/// Assert that a memory sink was closed by exactly one `close` call and
/// never aborted.
#[macro_export]
macro_rules! assert_closed_once {
    ($sink:expr) => {
        match $sink.state() {
            $crate::writer::SinkState::Closed => {}
            other => panic!("Expected Closed sink, got {:?}", other),
        }
        let closes = $sink.close_calls();
        let aborts = $sink.abort_reasons();
        if closes != 1 || !aborts.is_empty() {
            panic!(
                "Expected a single close, got {} close call(s) and aborts {:?}",
                closes, aborts
            );
        }
    };
}

/// Assert that a memory sink was aborted once with the given reason and
/// never closed.
///
/// # Example
///
/// ```rust
/// use rapids::assert_aborted_with;
/// use rapids::writer::{MemorySink, SinkWriter, WritableSink};
///
/// # tokio_test::block_on(async {
/// let sink = MemorySink::<i32>::new();
/// let mut writer = sink.get_writer().unwrap();
/// writer.abort("boom".to_string()).await.unwrap();
///
/// assert_aborted_with!(sink, "boom");
/// # });
/// ```
#[macro_export]
macro_rules! assert_aborted_with {
    ($sink:expr, $reason:expr) => {
        let aborts = $sink.abort_reasons();
        let closes = $sink.close_calls();
        if aborts.len() != 1 || aborts[0] != $reason || closes != 0 {
            panic!(
                "Expected a single abort with {:?}, got aborts {:?} and {} close call(s)",
                $reason, aborts, closes
            );
        }
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl Arbitrary for crate::writer::WriteOptions {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        any::<bool>()
            .prop_map(|close| Self::new().with_close_on_complete(close))
            .boxed()
    }
}

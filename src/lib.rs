//! # Rapids
//!
//! Push-based stream operators for [`futures`] streams, built around a
//! lifecycle-aware stream-to-sink writer.
//!
//! ## Writing a stream to a sink
//!
//! [`ToWritable`](writer::ToWritable) forwards every value of a fallible
//! source to a sink writer, awaits each write, and re-emits the value. It
//! closes the sink when the source completes, aborts it when the source
//! fails, and stops quietly when the sink is closed by someone else.
//!
//! ```rust
//! use futures::{stream, StreamExt};
//! use rapids::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let sink = MemorySink::new();
//! let source = stream::iter(vec![Ok::<_, String>("Hello"), Ok("Rust"), Ok("Ninja")]);
//!
//! let echoed: Vec<_> = source.to_writable_sink(&sink).unwrap().collect().await;
//!
//! assert_eq!(echoed, vec![Ok("Hello"), Ok("Rust"), Ok("Ninja")]);
//! assert_eq!(sink.written(), vec!["Hello", "Rust", "Ninja"]);
//! assert_eq!(sink.close_calls(), 1);
//! # });
//! ```
//!
//! ## Operators
//!
//! Operators are extension traits over [`Stream`](futures::Stream). Extra
//! arguments are [`Input`]s: fixed values, or streams whose latest value
//! is used.
//!
//! ```rust
//! use futures::{stream, StreamExt};
//! use rapids::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let bounds = Input::stream(stream::iter(vec![0.0, 1.0]));
//! let kept: Vec<_> = stream::iter(vec![0.5, 1.5, 2.0])
//!     .filter_in_range(bounds, 2.0, false)
//!     .collect()
//!     .await;
//!
//! assert_eq!(kept, vec![1.5, 2.0]);
//! # });
//! ```
//!
//! ## Features
//!
//! - `async`: drive the sink's close on the current tokio runtime when a
//!   writing stream is dropped mid-flight. Without it that outcome is
//!   discarded.
//! - `random` (default): random number sources. Enables `async`, so the
//!   default build drives the close outcome on tokio.
//! - `tracing`: lifecycle logging through `tracing`
//! - `serde`: `Serialize`/`Deserialize` for option types
//! - `proptest`: `Arbitrary` implementations

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod array;
pub mod boolean;
pub mod input;
pub mod number;
#[cfg(feature = "random")]
pub mod random;
pub mod string;
pub mod testing;
pub mod writer;

// Re-exports
pub use input::{Input, WithLatest};
pub use number::NumberError;
#[cfg(feature = "random")]
pub use random::RandomError;
pub use writer::{AcquireError, ToWritable, WriteError, WriteOptions, WriteStreamExt};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::array::ArrayStreamExt;
    pub use crate::boolean::BooleanStreamExt;
    pub use crate::input::{Input, Latest, WithLatest};
    pub use crate::number::{NumberError, NumberStreamExt, ParseFloatStreamExt};
    #[cfg(feature = "random")]
    pub use crate::random::{from_crypto_random, from_random, RandomError};
    pub use crate::string::{CharCodeStreamExt, StringStreamExt};
    pub use crate::writer::{
        AcquireError, MemorySink, SinkCompat, SinkWriter, ToWritable, WritableSink, WriteError,
        WriteOptions, WriteStreamExt,
    };
}

//! Streams of random numbers.
//!
//! Both sources emit their first value immediately and then one value per
//! `period`. A zero period produces a stream that is always ready, so bound
//! it with [`take`](futures::StreamExt::take) or similar. Non-zero periods
//! are timed with [`tokio::time::interval`] and need a tokio runtime.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use futures::StreamExt;
//! use rapids::random::from_random;
//!
//! # tokio_test::block_on(async {
//! let values: Vec<f64> = from_random(5.0, 10.0, Duration::ZERO).take(3).collect().await;
//!
//! assert_eq!(values.len(), 3);
//! assert!(values.iter().all(|v| (5.0..10.0).contains(v)));
//! # });
//! ```

use std::fmt;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use rand::{Rng, TryRngCore};
use tokio::time::{self, MissedTickBehavior};

/// Error yielded by [`from_crypto_random`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RandomError {
    /// The operating system's random source failed.
    Unavailable(String),
}

impl fmt::Display for RandomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "os random source unavailable: {}", msg),
        }
    }
}

impl std::error::Error for RandomError {}

fn every<T, F>(period: Duration, next: F) -> BoxStream<'static, T>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    if period.is_zero() {
        return stream::repeat_with(next).boxed();
    }

    // The interval is created on first poll so construction needs no runtime.
    stream::unfold((None, next), move |(interval, mut next)| async move {
        let mut interval = interval.unwrap_or_else(|| {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
        let value = next();
        Some((value, (Some(interval), next)))
    })
    .boxed()
}

/// An endless stream of `f64` values uniformly distributed in `[min, max)`.
///
/// # Panics
///
/// Panics if `period` is non-zero and the stream is polled outside a tokio
/// runtime.
pub fn from_random(min: f64, max: f64, period: Duration) -> BoxStream<'static, f64> {
    #[cfg(feature = "tracing")]
    tracing::debug!(min, max, ?period, "starting random source");

    every(period, move || rand::rng().random::<f64>() * (max - min) + min)
}

/// An endless stream of `u32` values read from the operating system's
/// cryptographically secure random source.
///
/// A failed read is yielded as an error and the stream keeps going.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use futures::StreamExt;
/// use rapids::random::from_crypto_random;
///
/// # tokio_test::block_on(async {
/// let values: Vec<_> = from_crypto_random(Duration::ZERO).take(2).collect().await;
/// assert!(values.iter().all(Result::is_ok));
/// # });
/// ```
pub fn from_crypto_random(period: Duration) -> BoxStream<'static, Result<u32, RandomError>> {
    every(period, || {
        rand::rngs::OsRng.try_next_u32().map_err(|e| {
            #[cfg(feature = "tracing")]
            tracing::warn!("os random read failed: {}", e);
            RandomError::Unavailable(e.to_string())
        })
    })
}

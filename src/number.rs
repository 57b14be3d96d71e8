//! Numeric operators.
//!
//! Range bounds and divisors are [`Input`]s, so they can be fixed values or
//! streams that change over time.
//!
//! # Example
//!
//! ```rust
//! use futures::{stream, StreamExt};
//! use rapids::number::NumberStreamExt;
//!
//! # tokio_test::block_on(async {
//! let out: Vec<_> = stream::iter(vec![-1.0, 0.0, 1.0, 2.0, 3.14])
//!     .filter_out_of_range(0.0, 2.0, false)
//!     .collect()
//!     .await;
//!
//! assert_eq!(out, vec![-1.0, 3.14]);
//! # });
//! ```

use std::fmt;

use futures::future;
use futures::stream::{Stream, StreamExt};

use crate::input::{Input, WithLatest};

/// Error yielded by numeric operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberError {
    /// [`NumberStreamExt::div`] received a zero divisor.
    DivideByZero,
}

impl fmt::Display for NumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivideByZero => write!(f, "div operator cannot divide by 0"),
        }
    }
}

impl std::error::Error for NumberError {}

/// Parse the longest leading float literal of `input`.
///
/// Leading whitespace is skipped and trailing garbage ignored. A signed
/// `Infinity` prefix parses to an infinity. Returns `NaN` when no prefix
/// parses.
///
/// # Example
///
/// ```rust
/// use rapids::number::parse_float;
///
/// assert_eq!(parse_float("  3.14abc"), 3.14);
/// assert_eq!(parse_float("-2e3 apples"), -2000.0);
/// assert_eq!(parse_float("-Infinity"), f64::NEG_INFINITY);
/// assert!(parse_float("abc").is_nan());
/// ```
pub fn parse_float(input: &str) -> f64 {
    let trimmed = input.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    let bytes = trimmed.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if trimmed[end..].starts_with("Infinity") {
        return if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let int_digits = digits(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    trimmed[..end].parse().unwrap_or(f64::NAN)
}

fn is_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

fn within(value: f64, min: f64, max: f64, exclude_bounds: bool) -> bool {
    if exclude_bounds {
        value > min && value < max
    } else {
        value >= min && value <= max
    }
}

/// Parsing operators for streams of strings.
pub trait ParseFloatStreamExt: Stream + Sized
where
    Self::Item: AsRef<str>,
{
    /// Parse each string with [`parse_float`].
    fn parse_float(self) -> impl Stream<Item = f64> {
        self.map(|value| parse_float(value.as_ref()))
    }
}

impl<S> ParseFloatStreamExt for S
where
    S: Stream,
    S::Item: AsRef<str>,
{
}

/// Extension methods for streams of `f64`.
pub trait NumberStreamExt: Stream<Item = f64> + Sized {
    /// Emit whether each value is `NaN`.
    fn is_nan(self) -> impl Stream<Item = bool> {
        self.map(f64::is_nan)
    }

    /// Emit whether each value is finite with a fractional part.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures::{stream, StreamExt};
    /// use rapids::number::NumberStreamExt;
    ///
    /// # tokio_test::block_on(async {
    /// let out: Vec<_> = stream::iter(vec![f64::NEG_INFINITY, -1.1, 0.0, f64::NAN])
    ///     .is_float()
    ///     .collect()
    ///     .await;
    ///
    /// assert_eq!(out, vec![false, true, false, false]);
    /// # });
    /// ```
    fn is_float(self) -> impl Stream<Item = bool> {
        self.map(|value| value.is_finite() && value.fract() != 0.0)
    }

    /// Emit whether each value is a finite integer.
    fn is_integer(self) -> impl Stream<Item = bool> {
        self.map(is_integer)
    }

    /// Keep only finite integers.
    fn filter_is_integer(self) -> impl Stream<Item = f64> {
        self.filter(|value| future::ready(is_integer(*value)))
    }

    /// Emit whether each value lies between the latest `min` and `max`.
    ///
    /// Bounds are inclusive unless `exclude_bounds` is true.
    fn in_range(
        self,
        min: impl Into<Input<f64>>,
        max: impl Into<Input<f64>>,
        exclude_bounds: impl Into<Input<bool>>,
    ) -> impl Stream<Item = bool> {
        let bounds = (
            min.into().latest(),
            max.into().latest(),
            exclude_bounds.into().latest(),
        );
        WithLatest::new(self, bounds)
            .map(|(value, (min, max, exclude))| within(value, min, max, exclude))
    }

    /// Keep values between the latest `min` and `max`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures::{stream, StreamExt};
    /// use rapids::number::NumberStreamExt;
    ///
    /// # tokio_test::block_on(async {
    /// let out: Vec<_> = stream::iter(vec![0.0, 1.0, 2.0, 3.0])
    ///     .filter_in_range(0.0, 2.0, true)
    ///     .collect()
    ///     .await;
    ///
    /// assert_eq!(out, vec![1.0]);
    /// # });
    /// ```
    fn filter_in_range(
        self,
        min: impl Into<Input<f64>>,
        max: impl Into<Input<f64>>,
        exclude_bounds: impl Into<Input<bool>>,
    ) -> impl Stream<Item = f64> {
        let bounds = (
            min.into().latest(),
            max.into().latest(),
            exclude_bounds.into().latest(),
        );
        WithLatest::new(self, bounds).filter_map(|(value, (min, max, exclude))| {
            future::ready(within(value, min, max, exclude).then_some(value))
        })
    }

    /// Keep values outside the latest `min` and `max`.
    ///
    /// The bounds themselves pass only when `include_bounds` is true.
    fn filter_out_of_range(
        self,
        min: impl Into<Input<f64>>,
        max: impl Into<Input<f64>>,
        include_bounds: impl Into<Input<bool>>,
    ) -> impl Stream<Item = f64> {
        let bounds = (
            min.into().latest(),
            max.into().latest(),
            include_bounds.into().latest(),
        );
        WithLatest::new(self, bounds).filter_map(|(value, (min, max, include))| {
            let outside = if include {
                value <= min || value >= max
            } else {
                value < min || value > max
            };
            future::ready(outside.then_some(value))
        })
    }

    /// Divide each value by the latest `divisor`.
    ///
    /// A zero divisor yields [`NumberError::DivideByZero`] and ends the
    /// stream.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures::{stream, StreamExt};
    /// use rapids::number::{NumberError, NumberStreamExt};
    ///
    /// # tokio_test::block_on(async {
    /// let out: Vec<_> = stream::iter(vec![4.0, 10.0]).div(0.0).collect().await;
    /// assert_eq!(out, vec![Err(NumberError::DivideByZero)]);
    /// # });
    /// ```
    fn div(self, divisor: impl Into<Input<f64>>) -> impl Stream<Item = Result<f64, NumberError>> {
        WithLatest::new(self, divisor.into().latest())
            .map(|(value, divisor)| {
                if divisor == 0.0 {
                    Err(NumberError::DivideByZero)
                } else {
                    Ok(value / divisor)
                }
            })
            .scan(false, |failed, result| {
                if *failed {
                    return future::ready(None);
                }
                *failed = result.is_err();
                future::ready(Some(result))
            })
    }
}

impl<S: Stream<Item = f64>> NumberStreamExt for S {}

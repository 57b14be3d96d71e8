//! String operators.

use futures::stream::{Stream, StreamExt};

use crate::input::{Input, WithLatest};

/// Build strings from UTF-16 code units.
pub trait CharCodeStreamExt: Stream + Sized
where
    Self::Item: IntoIterator<Item = u16>,
{
    /// Decode each sequence of code units into a `String`.
    ///
    /// Unpaired surrogates decode to `U+FFFD`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures::{stream, StreamExt};
    /// use rapids::string::CharCodeStreamExt;
    ///
    /// # tokio_test::block_on(async {
    /// let out: Vec<_> = stream::iter(vec![vec![72, 105], vec![0xD83E, 0xDD80]])
    ///     .map_char_code()
    ///     .collect()
    ///     .await;
    ///
    /// assert_eq!(out, vec!["Hi".to_string(), "🦀".to_string()]);
    /// # });
    /// ```
    fn map_char_code(self) -> impl Stream<Item = String> {
        self.map(|units| {
            let units: Vec<u16> = units.into_iter().collect();
            String::from_utf16_lossy(&units)
        })
    }
}

impl<S> CharCodeStreamExt for S
where
    S: Stream,
    S::Item: IntoIterator<Item = u16>,
{
}

/// Extension methods for streams of strings.
pub trait StringStreamExt: Stream + Sized
where
    Self::Item: AsRef<str>,
{
    /// Emit the character at the latest `index` as a one-character string,
    /// or an empty string when the index is past the end.
    ///
    /// Indices count `char`s, not bytes.
    fn char_at(self, index: impl Into<Input<usize>>) -> impl Stream<Item = String> {
        WithLatest::new(self, index.into().latest()).map(|(value, index)| {
            value
                .as_ref()
                .chars()
                .nth(index)
                .map(String::from)
                .unwrap_or_default()
        })
    }
}

impl<S> StringStreamExt for S
where
    S: Stream,
    S::Item: AsRef<str>,
{
}

//! Conditional operators.

use futures::stream::{Stream, StreamExt};

/// Extension methods for branching on stream values.
pub trait BooleanStreamExt: Stream + Sized {
    /// Map each value with `on_true` or `on_false`, chosen by `predicate`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures::{stream, StreamExt};
    /// use rapids::boolean::BooleanStreamExt;
    ///
    /// # tokio_test::block_on(async {
    /// let out: Vec<_> = stream::iter(1..=4)
    ///     .if_source(|n| n % 2 == 0, |n| n * 10, |n| -n)
    ///     .collect()
    ///     .await;
    ///
    /// assert_eq!(out, vec![-1, 20, -3, 40]);
    /// # });
    /// ```
    fn if_source<P, T, F, U>(self, predicate: P, on_true: T, on_false: F) -> impl Stream<Item = U>
    where
        P: FnMut(&Self::Item) -> bool,
        T: FnMut(Self::Item) -> U,
        F: FnMut(Self::Item) -> U,
    {
        let (mut predicate, mut on_true, mut on_false) = (predicate, on_true, on_false);
        self.map(move |value| {
            if predicate(&value) {
                on_true(value)
            } else {
                on_false(value)
            }
        })
    }
}

impl<S: Stream> BooleanStreamExt for S {}

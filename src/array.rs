//! Operators over streams of collections.
//!
//! Each item of the source stream is a collection (anything implementing
//! `IntoIterator`); each operator transforms that collection into a new
//! `Vec` or picks a single element out of it.
//!
//! # Example
//!
//! ```rust
//! use futures::{stream, StreamExt};
//! use rapids::array::ArrayStreamExt;
//!
//! # tokio_test::block_on(async {
//! let out: Vec<_> = stream::iter(vec![vec!["Hello", "Rust", "Ninja"]])
//!     .reverse()
//!     .collect()
//!     .await;
//!
//! assert_eq!(out, vec![vec!["Ninja", "Rust", "Hello"]]);
//! # });
//! ```

use std::collections::HashSet;
use std::hash::Hash;

use futures::stream::{Stream, StreamExt};

use crate::input::{Input, WithLatest};

/// Extension methods for streams whose items are collections.
pub trait ArrayStreamExt: Stream + Sized {
    /// Emit each collection reversed.
    fn reverse<T>(self) -> impl Stream<Item = Vec<T>>
    where
        Self::Item: IntoIterator<Item = T>,
    {
        self.map(|items| {
            let mut items: Vec<T> = items.into_iter().collect();
            items.reverse();
            items
        })
    }

    /// Emit the first element of each collection matching `predicate`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures::{stream, StreamExt};
    /// use rapids::array::ArrayStreamExt;
    ///
    /// # tokio_test::block_on(async {
    /// let out: Vec<_> = stream::iter(vec![vec!["", "", "Hello", "Rust", "Ninja"]])
    ///     .find(|s: &&str| !s.is_empty() && s.len() < 5)
    ///     .collect()
    ///     .await;
    ///
    /// assert_eq!(out, vec![Some("Rust")]);
    /// # });
    /// ```
    fn find<T, P>(self, predicate: P) -> impl Stream<Item = Option<T>>
    where
        Self::Item: IntoIterator<Item = T>,
        P: FnMut(&T) -> bool,
    {
        let mut predicate = predicate;
        self.map(move |items| items.into_iter().find(|item| predicate(item)))
    }

    /// Emit the last element of each collection matching `predicate`.
    fn find_last<T, P>(self, predicate: P) -> impl Stream<Item = Option<T>>
    where
        Self::Item: IntoIterator<Item = T>,
        P: FnMut(&T) -> bool,
    {
        let mut predicate = predicate;
        self.map(move |items| {
            items
                .into_iter()
                .fold(None, |found, item| if predicate(&item) { Some(item) } else { found })
        })
    }

    /// Emit the distinct elements of each collection that are absent from
    /// the latest `compare` collection, in first-occurrence order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures::{stream, StreamExt};
    /// use rapids::array::ArrayStreamExt;
    ///
    /// # tokio_test::block_on(async {
    /// let out: Vec<_> = stream::iter(vec![vec!['a', 'b', 'd', 'a', 'b']])
    ///     .difference(vec!['a', 'c'])
    ///     .collect()
    ///     .await;
    ///
    /// assert_eq!(out, vec![vec!['b', 'd']]);
    /// # });
    /// ```
    fn difference<T>(self, compare: impl Into<Input<Vec<T>>>) -> impl Stream<Item = Vec<T>>
    where
        Self::Item: IntoIterator<Item = T>,
        T: Eq + Hash + Clone,
    {
        WithLatest::new(self, compare.into().latest()).map(|(items, compare)| {
            let excluded: HashSet<T> = compare.into_iter().collect();
            let mut seen = HashSet::new();
            items
                .into_iter()
                .filter(|item| !excluded.contains(item) && seen.insert(item.clone()))
                .collect()
        })
    }

    /// Emit each map-like collection as a list of `(key, value)` pairs with
    /// string keys.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use futures::{stream, StreamExt};
    /// use rapids::array::ArrayStreamExt;
    ///
    /// # tokio_test::block_on(async {
    /// let input = BTreeMap::from([(1, 'a'), (2, 'b'), (3, 'c')]);
    /// let out: Vec<_> = stream::iter(vec![input]).from_object_entries().collect().await;
    ///
    /// assert_eq!(
    ///     out,
    ///     vec![vec![("1".to_string(), 'a'), ("2".to_string(), 'b'), ("3".to_string(), 'c')]]
    /// );
    /// # });
    /// ```
    fn from_object_entries<K, V>(self) -> impl Stream<Item = Vec<(String, V)>>
    where
        Self::Item: IntoIterator<Item = (K, V)>,
        K: ToString,
    {
        self.map(|entries| {
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect()
        })
    }

    /// Map every element with `f`, then emit the results sorted ascending.
    fn sort_map<T, U, F>(self, f: F) -> impl Stream<Item = Vec<U>>
    where
        Self::Item: IntoIterator<Item = T>,
        F: FnMut(T) -> U,
        U: Ord,
    {
        let mut f = f;
        self.map(move |items| {
            let mut mapped: Vec<U> = items.into_iter().map(&mut f).collect();
            mapped.sort();
            mapped
        })
    }
}

impl<S: Stream> ArrayStreamExt for S {}

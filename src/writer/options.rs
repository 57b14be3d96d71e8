//! Adapter configuration.

/// Options controlling how a [`ToWritable`](crate::writer::ToWritable)
/// finalizes its sink.
///
/// Options are plain data: easy to clone, compare and (with the `serde`
/// feature) load from configuration files.
///
/// # Example
///
/// ```rust
/// use rapids::writer::WriteOptions;
///
/// let options = WriteOptions::default();
/// assert!(options.close_on_complete());
///
/// let options = WriteOptions::new().skip_close();
/// assert!(!options.close_on_complete());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WriteOptions {
    close_on_complete: bool,
}

impl WriteOptions {
    /// Default options: the sink is closed when the source completes or the
    /// adapter is dropped.
    pub fn new() -> Self {
        Self {
            close_on_complete: true,
        }
    }

    /// Leave closing the sink to the caller.
    ///
    /// The adapter still stops writing once the sink reports closed, and a
    /// source error still aborts the sink.
    pub fn skip_close(mut self) -> Self {
        self.close_on_complete = false;
        self
    }

    /// Set whether the sink is closed on completion.
    pub fn with_close_on_complete(mut self, close: bool) -> Self {
        self.close_on_complete = close;
        self
    }

    /// Whether the adapter closes the sink on completion or cancellation.
    pub fn close_on_complete(&self) -> bool {
        self.close_on_complete
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::new()
    }
}

//! Error types for sink writing.

use std::fmt;

/// Error yielded by a [`ToWritable`](crate::writer::ToWritable) stream.
///
/// Each variant names the phase that failed. When a source error triggers
/// finalization and the abort itself fails as well, the source error wins
/// and the abort failure is only logged.
///
/// # Example
///
/// ```rust
/// use rapids::writer::WriteError;
///
/// let err: WriteError<&str, &str> = WriteError::Source("boom");
/// assert!(err.is_source());
/// assert_eq!(err.to_string(), "boom");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteError<E, W> {
    /// The source stream failed.
    Source(E),
    /// A write to the sink failed.
    Write(W),
    /// Closing the sink after the source completed failed.
    Close(W),
}

impl<E, W> WriteError<E, W> {
    /// Returns true if the source stream failed.
    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source(_))
    }

    /// Returns true if the failure came from the sink.
    pub fn is_sink(&self) -> bool {
        !self.is_source()
    }

    /// Returns the source error, if any.
    pub fn source_error(&self) -> Option<&E> {
        match self {
            Self::Source(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the sink error, if any.
    pub fn sink_error(&self) -> Option<&W> {
        match self {
            Self::Write(e) | Self::Close(e) => Some(e),
            Self::Source(_) => None,
        }
    }

    /// Extract the source error, discarding sink failures.
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Source(e) => Some(e),
            _ => None,
        }
    }
}

impl<E: fmt::Display, W: fmt::Display> fmt::Display for WriteError<E, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(e) => write!(f, "{}", e),
            Self::Write(e) => write!(f, "write to sink failed: {}", e),
            Self::Close(e) => write!(f, "closing sink failed: {}", e),
        }
    }
}

impl<E, W> std::error::Error for WriteError<E, W>
where
    E: std::error::Error + 'static,
    W: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(e) => Some(e),
            Self::Write(e) | Self::Close(e) => Some(e),
        }
    }
}

/// Error returned when a writer cannot be acquired from a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// Another writer currently holds the sink.
    Locked,
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "sink is locked to another writer"),
        }
    }
}

impl std::error::Error for AcquireError {}

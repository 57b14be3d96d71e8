//! An in-memory sink that records everything written to it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt, Shared};

use crate::writer::error::AcquireError;
use crate::writer::trait_def::{SinkWriter, WritableSink};

/// Error reported by [`MemoryWriter`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// The sink was already closed or aborted.
    Closed,
    /// A failure configured with [`MemorySink::fail_write_at`],
    /// [`MemorySink::fail_close`] or [`MemorySink::fail_abort`].
    Injected(String),
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "sink is closed"),
            Self::Injected(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for MemoryError {}

/// Lifecycle state of a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkState {
    /// Accepting writes.
    Open,
    /// Closed gracefully, by a writer or externally.
    Closed,
    /// Aborted with the given reason.
    Aborted(String),
}

struct Inner<T> {
    written: Vec<T>,
    state: SinkState,
    locked: bool,
    write_attempts: usize,
    close_calls: usize,
    abort_reasons: Vec<String>,
    fail_write_at: Option<(usize, String)>,
    fail_close: Option<String>,
    fail_abort: Option<String>,
    closed_tx: Option<oneshot::Sender<()>>,
}

impl<T> Inner<T> {
    fn transition(&mut self, state: SinkState) {
        if self.state == SinkState::Open {
            self.state = state;
        }
        if let Some(tx) = self.closed_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A shared, in-memory [`WritableSink`].
///
/// Clones share the same storage, so a test can hand one clone to the
/// stream under test and inspect another afterwards. Operations take effect
/// as soon as they are issued.
///
/// # Example
///
/// ```rust
/// use rapids::writer::{MemorySink, SinkState, SinkWriter, WritableSink};
///
/// # tokio_test::block_on(async {
/// let sink = MemorySink::new();
/// let mut writer = sink.get_writer().unwrap();
///
/// writer.write("a").await.unwrap();
/// writer.abort("stopped".to_string()).await.unwrap();
///
/// assert_eq!(sink.written(), vec!["a"]);
/// assert_eq!(sink.state(), SinkState::Aborted("stopped".to_string()));
/// assert_eq!(sink.abort_reasons(), vec!["stopped".to_string()]);
/// # });
/// ```
pub struct MemorySink<T> {
    inner: Arc<Mutex<Inner<T>>>,
    closed: Shared<BoxFuture<'static, ()>>,
}

impl<T> MemorySink<T> {
    /// Create an open, unlocked sink.
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel::<()>();
        Self {
            inner: Arc::new(Mutex::new(Inner {
                written: Vec::new(),
                state: SinkState::Open,
                locked: false,
                write_attempts: 0,
                close_calls: 0,
                abort_reasons: Vec::new(),
                fail_write_at: None,
                fail_close: None,
                fail_abort: None,
                closed_tx: Some(tx),
            })),
            closed: rx.map(|_| ()).boxed().shared(),
        }
    }

    /// Make the write attempt at `index` (zero-based) fail with `message`.
    ///
    /// The sink stays open after the failure.
    pub fn fail_write_at(self, index: usize, message: impl Into<String>) -> Self {
        self.lock().fail_write_at = Some((index, message.into()));
        self
    }

    /// Make `close` fail with `message`. The sink still ends up closed.
    pub fn fail_close(self, message: impl Into<String>) -> Self {
        self.lock().fail_close = Some(message.into());
        self
    }

    /// Make `abort` fail with `message`. The sink still ends up aborted.
    pub fn fail_abort(self, message: impl Into<String>) -> Self {
        self.lock().fail_abort = Some(message.into());
        self
    }

    /// Close the sink from outside any writer.
    ///
    /// Fires the closed-notification; later writes fail with
    /// [`MemoryError::Closed`].
    pub fn close_externally(&self) {
        self.lock().transition(SinkState::Closed);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SinkState {
        self.lock().state.clone()
    }

    /// Whether the sink is closed or aborted.
    pub fn is_closed(&self) -> bool {
        self.lock().state != SinkState::Open
    }

    /// Whether a writer currently holds the sink.
    pub fn is_locked(&self) -> bool {
        self.lock().locked
    }

    /// Number of `close` calls received.
    pub fn close_calls(&self) -> usize {
        self.lock().close_calls
    }

    /// Reasons of every `abort` call received, in order.
    pub fn abort_reasons(&self) -> Vec<String> {
        self.lock().abort_reasons.clone()
    }

    /// Total number of `close` and `abort` calls received.
    pub fn terminal_calls(&self) -> usize {
        let inner = self.lock();
        inner.close_calls + inner.abort_reasons.len()
    }

    /// Number of writes attempted, failed ones included.
    pub fn write_attempts(&self) -> usize {
        self.lock().write_attempts
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> MemorySink<T> {
    /// Values successfully written so far, in order.
    pub fn written(&self) -> Vec<T> {
        self.lock().written.clone()
    }
}

impl<T> Default for MemorySink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for MemorySink<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            closed: self.closed.clone(),
        }
    }
}

impl<T> fmt::Debug for MemorySink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("MemorySink")
            .field("state", &inner.state)
            .field("written", &inner.written.len())
            .field("locked", &inner.locked)
            .finish()
    }
}

impl<T: Send + 'static> WritableSink for MemorySink<T> {
    type Writer = MemoryWriter<T>;

    fn get_writer(&self) -> Result<Self::Writer, AcquireError> {
        let mut inner = self.lock();
        if inner.locked {
            return Err(AcquireError::Locked);
        }
        inner.locked = true;
        Ok(MemoryWriter {
            inner: Arc::clone(&self.inner),
            closed: self.closed.clone(),
        })
    }
}

/// The writer handed out by [`MemorySink`]. Releases the lock on drop.
pub struct MemoryWriter<T> {
    inner: Arc<Mutex<Inner<T>>>,
    closed: Shared<BoxFuture<'static, ()>>,
}

impl<T> MemoryWriter<T> {
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> fmt::Debug for MemoryWriter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryWriter")
            .field("state", &self.lock().state)
            .finish()
    }
}

impl<T> Drop for MemoryWriter<T> {
    fn drop(&mut self) {
        self.lock().locked = false;
    }
}

impl<T: Send + 'static> SinkWriter for MemoryWriter<T> {
    type Item = T;
    type Error = MemoryError;

    fn write(&mut self, item: T) -> BoxFuture<'static, Result<(), MemoryError>> {
        let mut inner = self.lock();
        let result = if inner.state != SinkState::Open {
            Err(MemoryError::Closed)
        } else {
            let attempt = inner.write_attempts;
            inner.write_attempts += 1;
            let injected = match &inner.fail_write_at {
                Some((index, message)) if *index == attempt => Some(message.clone()),
                _ => None,
            };
            match injected {
                Some(message) => Err(MemoryError::Injected(message)),
                None => {
                    inner.written.push(item);
                    Ok(())
                }
            }
        };
        future::ready(result).boxed()
    }

    fn close(&mut self) -> BoxFuture<'static, Result<(), MemoryError>> {
        let mut inner = self.lock();
        inner.close_calls += 1;
        let result = if inner.state != SinkState::Open {
            Err(MemoryError::Closed)
        } else {
            inner.transition(SinkState::Closed);
            match &inner.fail_close {
                Some(message) => Err(MemoryError::Injected(message.clone())),
                None => Ok(()),
            }
        };
        future::ready(result).boxed()
    }

    fn abort(&mut self, reason: String) -> BoxFuture<'static, Result<(), MemoryError>> {
        let mut inner = self.lock();
        inner.abort_reasons.push(reason.clone());
        inner.transition(SinkState::Aborted(reason));
        let result = match &inner.fail_abort {
            Some(message) => Err(MemoryError::Injected(message.clone())),
            None => Ok(()),
        };
        future::ready(result).boxed()
    }

    fn closed(&self) -> BoxFuture<'static, ()> {
        self.closed.clone().boxed()
    }
}

//! Live handles and the value cells behind them.
//!
//! A [`LiveHandle`] is what a session returns from its `*_live` accessors: a
//! stream of values that starts when the handle is created and stops when it
//! is dropped. Whether the first value arrives immediately is up to the
//! producer. Callers must not assume it does.
//!
//! [`LiveData`] is the producer used by in-process sessions. It keeps the
//! latest value and emits it to every new observer, followed by each change.
//!
//! # Invariants
//!
//! - A handle never yields values set before its creation, except the value
//!   current at creation time (for handles produced by [`LiveData`]).
//! - Observers of the same [`LiveData`] are independent: dropping one does not
//!   affect the others.
//! - Rapid successive changes may coalesce. The latest value is always
//!   delivered.

use std::{
    fmt,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::{
    Stream, StreamExt,
    stream::{self, BoxStream},
};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Subscription to a changing value.
///
/// Owned by whoever consumes it. Dropping the handle releases the
/// subscription; there is no explicit close.
pub struct LiveHandle<T> {
    inner: BoxStream<'static, T>,
}

impl<T: Send + 'static> LiveHandle<T> {
    /// Wrap any stream of values.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        Self { inner: stream.boxed() }
    }

    /// A handle that never emits and never ends.
    pub fn pending() -> Self {
        Self::new(stream::pending())
    }

    /// A handle that emits the given values, then ends.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::new(stream::iter(values))
    }

    /// Project every emitted value.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> LiveHandle<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        LiveHandle::new(self.inner.map(f))
    }
}

impl<T> Stream for LiveHandle<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> fmt::Debug for LiveHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveHandle").finish_non_exhaustive()
    }
}

/// Multicast value cell.
///
/// Cloning a `LiveData` shares the cell. Observers end once every clone has
/// been dropped.
pub struct LiveData<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> Clone for LiveData<T> {
    fn clone(&self) -> Self {
        Self { sender: Arc::clone(&self.sender) }
    }
}

impl<T> LiveData<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cell holding `initial`.
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender: Arc::new(sender) }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.sender.borrow())
    }

    /// Replace the value and notify observers.
    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Modify the value in place.
    ///
    /// `f` returns whether it changed anything. Observers are notified only
    /// when it did. Returns the same flag.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        self.sender.send_if_modified(f)
    }

    /// Subscribe: emits the current value, then every change.
    pub fn observe(&self) -> LiveHandle<T> {
        LiveHandle::new(WatchStream::new(self.sender.subscribe()))
    }

    /// Subscribe to changes only. The value current at subscription time is
    /// not emitted.
    pub fn observe_changes(&self) -> LiveHandle<T> {
        LiveHandle::new(WatchStream::from_changes(self.sender.subscribe()))
    }

    /// Subscribe through a projection of the value.
    ///
    /// The projection runs once per emission, on the consumer's task.
    pub fn observe_map<U, F>(&self, f: F) -> LiveHandle<U>
    where
        U: Send + 'static,
        F: Fn(&T) -> U + Send + 'static,
    {
        self.observe().map(move |value| f(&value))
    }

    /// Number of live handles currently subscribed.
    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: fmt::Debug> fmt::Debug for LiveData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveData")
            .field("value", &*self.sender.borrow())
            .field("observers", &self.sender.receiver_count())
            .finish()
    }
}

//! Snapshot-then-live combinator.
//!
//! Turns a pair of session accessors into a lazy stream:
//!
//! 1. On first poll, subscribe to the live handle.
//! 2. Read the snapshot and emit it. A failed read is emitted as the only
//!    item and ends the stream; the live handle is dropped unread.
//! 3. Forward every live emission as-is, in order.
//!
//! The live handle is subscribed before the snapshot is read, so a change that
//! lands during the read is still delivered. The price is that a handle which
//! emits its current value on subscription produces a second, equal item right
//! after the snapshot. That repeat is kept: consumers get every update, at the
//! cost of occasionally seeing the same state twice.
//!
//! Queries without a snapshot accessor skip step 2 and behave as a plain
//! pass-through of the live handle.
//!
//! # Invariants
//!
//! - Neither accessor is called before the first poll
//! - The snapshot is read at most once per stream
//! - Items from the live handle are never dropped, merged or reordered
//! - Errors are passed through untouched, never retried

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures::{
    Stream, StreamExt, future,
    stream::{self, BoxStream},
};
use rivulet_core::{LiveHandle, SessionError};

/// Stream produced for one subscriber of a live query.
pub type Flow<T, E = SessionError> = BoxStream<'static, Result<T, E>>;

type SnapshotFn<T, E> = Box<dyn FnOnce() -> Result<T, E> + Send>;
type LiveFn<T> = Box<dyn FnOnce() -> LiveHandle<T> + Send>;

/// A configured live query: a live accessor plus an optional snapshot.
#[must_use = "a live query does nothing until turned into a flow and polled"]
pub struct LiveQuery<T, E = SessionError> {
    label: &'static str,
    live: LiveFn<T>,
    snapshot: Option<SnapshotFn<T, E>>,
}

impl<T, E> LiveQuery<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Pass-through query over a live accessor.
    pub fn new<L>(live: L) -> Self
    where
        L: FnOnce() -> LiveHandle<T> + Send + 'static,
    {
        Self { label: "live_query", live: Box::new(live), snapshot: None }
    }

    /// Prepend the result of `snapshot` to the live emissions.
    pub fn with_snapshot<S>(mut self, snapshot: S) -> Self
    where
        S: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.snapshot = Some(Box::new(snapshot));
        self
    }

    /// Drop a configured snapshot, turning the query into a pass-through.
    pub fn without_snapshot(mut self) -> Self {
        self.snapshot = None;
        self
    }

    /// Name used in tracing events.
    pub fn named(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Whether a snapshot will be prepended.
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Build the lazy stream.
    pub fn into_flow(self) -> Flow<T, E> {
        let Self { label, live, snapshot } = self;

        stream::once(future::lazy(move |_| subscribe(label, live, snapshot))).flatten().boxed()
    }
}

/// Runs on the first poll of a flow.
fn subscribe<T, E>(
    label: &'static str,
    live: LiveFn<T>,
    snapshot: Option<SnapshotFn<T, E>>,
) -> Flow<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    tracing::debug!(query = label, snapshot = snapshot.is_some(), "live query subscribed");
    let live = Subscription { label, handle: live() };

    let Some(read) = snapshot else {
        return live.map(Ok).boxed();
    };

    match read() {
        Ok(initial) => stream::once(future::ready(Ok(initial))).chain(live.map(Ok)).boxed(),
        Err(err) => stream::once(future::ready(Err(err))).boxed(),
    }
}

/// Snapshot first, then every live emission.
///
/// `snapshot` and `live` must evaluate the same query parameters; the bridge
/// cannot check that.
pub fn bridge<T, E, S, L>(snapshot: S, live: L) -> Flow<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    S: FnOnce() -> Result<T, E> + Send + 'static,
    L: FnOnce() -> LiveHandle<T> + Send + 'static,
{
    LiveQuery::new(live).with_snapshot(snapshot).into_flow()
}

/// Every live emission, with no snapshot in front.
pub fn passthrough<T, E, L>(live: L) -> Flow<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
    L: FnOnce() -> LiveHandle<T> + Send + 'static,
{
    LiveQuery::new(live).into_flow()
}

/// Live handle held by a running flow.
struct Subscription<T> {
    label: &'static str,
    handle: LiveHandle<T>,
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.handle.poll_next_unpin(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.handle.size_hint()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        tracing::trace!(query = self.label, "live query released");
    }
}

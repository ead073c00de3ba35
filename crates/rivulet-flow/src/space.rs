//! Current space selection.
//!
//! A client shows one space at a time. [`SpaceStateHandler`] is the seam UI
//! code depends on; [`SpaceStateHolder`] is the implementation backed by a
//! session's space summaries.
//!
//! # Invariants
//!
//! - The selection is either `None` or a space the session reported at the
//!   time it was resolved.
//! - Observers are notified only when the selection actually changes.

use std::sync::Arc;

use futures::{StreamExt, stream::BoxStream};
use rivulet_core::{LiveData, QueryStringValue, RoomSummaryQueryParams, SpaceService};
use rivulet_proto::{Membership, RoomSummary};
use tracing::{debug, warn};

/// Holder of the currently selected space.
pub trait SpaceStateHandler: Send + Sync {
    /// The selected space, if any.
    fn current_space(&self) -> Option<RoomSummary>;

    /// Select a space by ID, or clear the selection with `None`.
    fn set_current_space(&self, space_id: Option<&str>);

    /// The selection now, then every change.
    fn selected_space_flow(&self) -> BoxStream<'static, Option<RoomSummary>>;

    /// ID of the selected space while the user is joined to it.
    fn safe_active_space_id(&self) -> Option<String>;
}

/// Space selection resolved through a [`SpaceService`].
pub struct SpaceStateHolder<S: ?Sized> {
    session: Arc<S>,
    selection: LiveData<Option<RoomSummary>>,
}

impl<S> SpaceStateHolder<S>
where
    S: SpaceService + ?Sized,
{
    /// Holder with nothing selected.
    pub fn new(session: Arc<S>) -> Self {
        Self { session, selection: LiveData::new(None) }
    }

    /// Re-read the selected space from the session.
    ///
    /// Picks up renames and membership changes. A space that disappeared
    /// clears the selection.
    pub fn refresh(&self) {
        let Some(space_id) = self.selected_id() else {
            return;
        };
        self.select(self.resolve(&space_id));
    }

    fn selected_id(&self) -> Option<String> {
        self.selection.with(|selection| selection.as_ref().map(|space| space.room_id.clone()))
    }

    fn resolve(&self, space_id: &str) -> Option<RoomSummary> {
        let params =
            RoomSummaryQueryParams::spaces().with_room_id(QueryStringValue::equals(space_id));

        match self.session.space_summaries(&params) {
            Ok(spaces) => {
                let space = spaces.into_iter().next();
                if space.is_none() {
                    warn!(space_id, "unknown space, clearing selection");
                }
                space
            },
            Err(err) => {
                warn!(space_id, error = %err, "space lookup failed, clearing selection");
                None
            },
        }
    }

    fn select(&self, next: Option<RoomSummary>) {
        let changed = self.selection.update(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });

        if changed {
            debug!(space_id = ?self.selected_id(), "space selection changed");
        }
    }
}

impl<S> SpaceStateHandler for SpaceStateHolder<S>
where
    S: SpaceService + ?Sized,
{
    fn current_space(&self) -> Option<RoomSummary> {
        self.selection.get()
    }

    fn set_current_space(&self, space_id: Option<&str>) {
        let next = space_id.and_then(|id| self.resolve(id));
        self.select(next);
    }

    fn selected_space_flow(&self) -> BoxStream<'static, Option<RoomSummary>> {
        self.selection.observe().boxed()
    }

    fn safe_active_space_id(&self) -> Option<String> {
        self.selection.with(|selection| {
            selection
                .as_ref()
                .filter(|space| space.membership == Membership::Join)
                .map(|space| space.room_id.clone())
        })
    }
}

//! Test doubles.
//!
//! Every member has a relaxed default: queries return `None` or an empty
//! stream, commands are recorded and otherwise ignored. Tests program answers
//! with `given_*` hooks and check interactions with `verify_*` hooks.

use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::{
    StreamExt,
    stream::{self, BoxStream},
};
use rivulet_flow::SpaceStateHandler;
use rivulet_proto::RoomSummary;

#[derive(Debug, Default)]
struct FakeSpaceState {
    current_space: Option<RoomSummary>,
    safe_active_space_id: Option<String>,
    selected_space: Option<RoomSummary>,
    set_calls: Vec<Option<String>>,
}

/// Stand-in for a [`SpaceStateHandler`].
#[derive(Debug, Default)]
pub struct FakeSpaceStateHandler {
    state: Mutex<FakeSpaceState>,
}

impl FakeSpaceStateHandler {
    /// Fake with every member at its relaxed default.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeSpaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `selected_space_flow` yield `Some(space)` once, then end.
    pub fn given_selected_space_flow_returns(&self, space: RoomSummary) {
        self.state().selected_space = Some(space);
    }

    /// Make `current_space` return `space`.
    pub fn given_current_space(&self, space: Option<RoomSummary>) {
        self.state().current_space = space;
    }

    /// Make `safe_active_space_id` return `space_id`.
    pub fn given_safe_active_space_id(&self, space_id: Option<&str>) {
        self.state().safe_active_space_id = space_id.map(str::to_owned);
    }

    /// Every argument `set_current_space` received, in call order.
    pub fn set_current_space_calls(&self) -> Vec<Option<String>> {
        self.state().set_calls.clone()
    }

    /// Assert `set_current_space` was called exactly once, with `Some(space_id)`.
    #[track_caller]
    pub fn verify_set_current_space(&self, space_id: &str) {
        let calls = self.set_current_space_calls();
        assert_eq!(
            calls,
            vec![Some(space_id.to_owned())],
            "expected exactly one set_current_space({space_id:?})"
        );
    }
}

impl SpaceStateHandler for FakeSpaceStateHandler {
    fn current_space(&self) -> Option<RoomSummary> {
        self.state().current_space.clone()
    }

    fn set_current_space(&self, space_id: Option<&str>) {
        self.state().set_calls.push(space_id.map(str::to_owned));
    }

    fn selected_space_flow(&self) -> BoxStream<'static, Option<RoomSummary>> {
        match self.state().selected_space.clone() {
            Some(space) => stream::iter([Some(space)]).boxed(),
            None => stream::empty().boxed(),
        }
    }

    fn safe_active_space_id(&self) -> Option<String> {
        self.state().safe_active_space_id.clone()
    }
}

//! Operations for model-based testing.
//!
//! Operations represent every mutation of the room table. They are generated
//! randomly by proptest and applied to both the model and a memory session.

use rivulet_proto::{Membership, RoomSummary};

/// Room identifier (uses u8 to keep the test space small).
pub type ModelRoomId = u8;

/// Mutations of the room table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Insert a room, or replace the one with the same ID.
    UpsertRoom {
        /// Room to store.
        room: SmallRoom,
    },

    /// Change the local user's membership in a room.
    SetMembership {
        /// Target room.
        room_id: ModelRoomId,
        /// New membership.
        membership: Membership,
    },

    /// Forget a room.
    RemoveRoom {
        /// Room to remove.
        room_id: ModelRoomId,
    },

    /// Open a room, moving it to the front of the breadcrumbs.
    VisitRoom {
        /// Room visited.
        room_id: ModelRoomId,
    },
}

/// Compact room description.
///
/// Expanded into a full [`RoomSummary`] with [`SmallRoom::to_summary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmallRoom {
    /// Room identifier.
    pub id: ModelRoomId,
    /// Name seed (expanded to `"Room <seed>"`).
    pub name_seed: u8,
    /// Membership of the local user.
    pub membership: Membership,
    /// Whether the room is a space.
    pub is_space: bool,
}

impl SmallRoom {
    /// Expand to a room summary.
    pub fn to_summary(&self) -> RoomSummary {
        let summary = RoomSummary::new(room_id(self.id))
            .with_display_name(format!("Room {}", self.name_seed))
            .with_membership(self.membership);

        if self.is_space { summary.into_space() } else { summary }
    }
}

/// Full room ID of a model room.
pub fn room_id(id: ModelRoomId) -> String {
    format!("!r{id}:example.org")
}

/// Result of applying an operation.
///
/// Used to compare model and memory session behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation succeeded.
    Ok,

    /// Operation failed with expected error.
    Error(OperationError),
}

/// Expected errors that can occur during operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Room not found.
    RoomNotFound,
}

impl OperationResult {
    /// Check if operation succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Check if operation failed.
    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// `Ok` when `found`, `RoomNotFound` otherwise.
    pub fn found(found: bool) -> Self {
        if found { Self::Ok } else { Self::Error(OperationError::RoomNotFound) }
    }
}

//! Model world.
//!
//! Holds the room table as plain vectors and applies operations to it.

use rivulet_core::RoomSummaryQueryParams;
use rivulet_proto::RoomSummary;

use super::operation::{ModelRoomId, Operation, OperationResult, room_id};

/// Model world - the reference implementation.
#[derive(Debug, Clone, Default)]
pub struct ModelWorld {
    /// Rooms in insertion order.
    rooms: Vec<RoomSummary>,
    /// Visited room IDs, most recent first.
    breadcrumbs: Vec<String>,
}

impl ModelWorld {
    /// Empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an operation and return the result.
    ///
    /// The result should match what the memory session reports for the same
    /// operation.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::UpsertRoom { room } => {
                let summary = room.to_summary();
                match self.position(room.id) {
                    Some(i) => self.rooms[i] = summary,
                    None => self.rooms.push(summary),
                }
                OperationResult::Ok
            },
            Operation::SetMembership { room_id, membership } => {
                let found = self.position(*room_id);
                if let Some(i) = found {
                    self.rooms[i].membership = *membership;
                }
                OperationResult::found(found.is_some())
            },
            Operation::RemoveRoom { room_id: id } => {
                let found = self.position(*id);
                if let Some(i) = found {
                    self.rooms.remove(i);
                    let full_id = room_id(*id);
                    self.breadcrumbs.retain(|b| *b != full_id);
                }
                OperationResult::found(found.is_some())
            },
            Operation::VisitRoom { room_id: id } => {
                let found = self.position(*id).is_some();
                if found {
                    let full_id = room_id(*id);
                    self.breadcrumbs.retain(|b| *b != full_id);
                    self.breadcrumbs.insert(0, full_id);
                }
                OperationResult::found(found)
            },
        }
    }

    fn position(&self, id: ModelRoomId) -> Option<usize> {
        let full_id = room_id(id);
        self.rooms.iter().position(|room| room.room_id == full_id)
    }

    /// Rooms a room-summary query over `params` must return.
    pub fn expected_rooms(&self, params: &RoomSummaryQueryParams) -> Vec<RoomSummary> {
        self.rooms.iter().filter(|room| params.matches(room)).cloned().collect()
    }

    /// Rooms a breadcrumbs query over `params` must return.
    pub fn expected_breadcrumbs(&self, params: &RoomSummaryQueryParams) -> Vec<RoomSummary> {
        self.breadcrumbs
            .iter()
            .filter_map(|id| self.rooms.iter().find(|room| room.room_id == *id))
            .filter(|room| params.matches(room))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rivulet_proto::Membership;

    use super::*;
    use crate::model::{OperationError, SmallRoom};

    fn room(id: ModelRoomId) -> SmallRoom {
        SmallRoom { id, name_seed: id, membership: Membership::Join, is_space: false }
    }

    #[test]
    fn model_basic_operations() {
        let mut model = ModelWorld::new();

        assert!(model.apply(&Operation::UpsertRoom { room: room(1) }).is_ok());
        assert!(model.apply(&Operation::VisitRoom { room_id: 1 }).is_ok());
        assert_eq!(
            model.apply(&Operation::VisitRoom { room_id: 2 }),
            OperationResult::Error(OperationError::RoomNotFound)
        );

        let all = RoomSummaryQueryParams::all();
        assert_eq!(model.expected_breadcrumbs(&all), vec![room(1).to_summary()]);

        assert!(model.apply(&Operation::RemoveRoom { room_id: 1 }).is_ok());
        assert!(model.expected_rooms(&all).is_empty());
        assert!(model.expected_breadcrumbs(&all).is_empty());
        assert!(model.apply(&Operation::RemoveRoom { room_id: 1 }).is_err());
    }

    #[test]
    fn upsert_keeps_insertion_order() {
        let mut model = ModelWorld::new();
        model.apply(&Operation::UpsertRoom { room: room(2) });
        model.apply(&Operation::UpsertRoom { room: room(1) });
        model.apply(&Operation::UpsertRoom { room: SmallRoom { name_seed: 9, ..room(2) } });

        let names: Vec<_> = model
            .expected_rooms(&RoomSummaryQueryParams::all())
            .into_iter()
            .map(|r| r.display_name)
            .collect();
        assert_eq!(names, vec!["Room 9", "Room 1"]);
    }
}

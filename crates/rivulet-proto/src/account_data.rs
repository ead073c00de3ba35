//! Account data events.
//!
//! Event content is kept as an untyped CBOR value; consumers decode the types
//! they care about.

use serde::{Deserialize, Serialize};

/// Account data scoped to the user (`m.direct`, `m.ignored_user_list`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccountDataEvent {
    /// Event type.
    pub event_type: String,
    /// Event content.
    pub content: ciborium::Value,
}

/// Account data scoped to a room (`m.tag`, `m.fully_read`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAccountDataEvent {
    /// Room the event belongs to.
    pub room_id: String,
    /// Event type.
    pub event_type: String,
    /// Event content.
    pub content: ciborium::Value,
}

//! Room summaries and membership.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Membership of the local user (or of a member) in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    /// No membership event known.
    #[default]
    None,
    /// Invited but not joined yet.
    Invite,
    /// Joined.
    Join,
    /// Asked to join.
    Knock,
    /// Left or was kicked.
    Leave,
    /// Banned.
    Ban,
}

impl Membership {
    /// All membership values, in declaration order.
    pub const ALL: [Self; 6] =
        [Self::None, Self::Invite, Self::Join, Self::Knock, Self::Leave, Self::Ban];

    /// Invited or joined. These are the rooms a room list normally shows.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Invite | Self::Join)
    }

    /// Wire name of the membership (`"join"`, `"invite"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Invite => "invite",
            Self::Join => "join",
            Self::Knock => "knock",
            Self::Leave => "leave",
            Self::Ban => "ban",
        }
    }
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown membership name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown membership: {0:?}")]
pub struct ParseMembershipError(pub String);

impl FromStr for Membership {
    type Err = ParseMembershipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ParseMembershipError(s.to_string()))
    }
}

/// Kind of room, taken from the room's create event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    /// A regular room holding a timeline.
    #[default]
    Room,
    /// A space grouping other rooms.
    Space,
}

/// Summary of a room as shown in room lists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Room identifier, e.g. `!abc:example.org`.
    pub room_id: String,
    /// Computed display name.
    pub display_name: String,
    /// Canonical alias, e.g. `#room:example.org`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub canonical_alias: Option<String>,
    /// Room topic.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub topic: Option<String>,
    /// Membership of the local user.
    pub membership: Membership,
    /// Room or space.
    #[serde(default)]
    pub room_type: RoomType,
    /// Joined member count.
    pub joined_members_count: u32,
    /// Invited member count.
    pub invited_members_count: u32,
    /// Unread notification count.
    pub notification_count: u32,
    /// Unread highlight count.
    pub highlight_count: u32,
    /// Whether the room has encryption enabled.
    pub is_encrypted: bool,
    /// Room tags (`m.favourite`, `m.lowpriority`, ...).
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RoomSummary {
    /// Create a joined, unnamed room summary.
    pub fn new(room_id: impl Into<String>) -> Self {
        let room_id = room_id.into();
        Self {
            display_name: room_id.clone(),
            room_id,
            membership: Membership::Join,
            ..Self::default()
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the membership.
    #[must_use]
    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.membership = membership;
        self
    }

    /// Mark the summary as a space.
    #[must_use]
    pub fn into_space(mut self) -> Self {
        self.room_type = RoomType::Space;
        self
    }

    /// Whether this summary describes a space.
    pub fn is_space(&self) -> bool {
        self.room_type == RoomType::Space
    }

    /// Whether the room carries the `m.favourite` tag.
    pub fn is_favourite(&self) -> bool {
        self.tags.iter().any(|t| t == "m.favourite")
    }
}

/// Summary of one member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMemberSummary {
    /// Room the membership belongs to.
    pub room_id: String,
    /// Member's user ID.
    pub user_id: String,
    /// Per-room display name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub display_name: Option<String>,
    /// Per-room avatar.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avatar_url: Option<String>,
    /// Membership state.
    pub membership: Membership,
}

/// Progress of a join or leave requested by the local user.
///
/// Reported per room ID while the request is in flight and after it settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum ChangeMembershipState {
    /// No change tracked.
    Unknown,
    /// Join request sent.
    Joining,
    /// Join request failed.
    FailedJoining(String),
    /// Join completed.
    Joined,
    /// Leave request sent.
    Leaving,
    /// Leave request failed.
    FailedLeaving(String),
    /// Leave completed.
    Left,
}

impl ChangeMembershipState {
    /// A request is still outstanding.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Joining | Self::Leaving)
    }

    /// The last request settled successfully.
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Joined | Self::Left)
    }

    /// The last request failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::FailedJoining(_) | Self::FailedLeaving(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn active_memberships() {
        let active: Vec<_> = Membership::ALL.into_iter().filter(|m| m.is_active()).collect();
        assert_eq!(active, vec![Membership::Invite, Membership::Join]);
    }

    #[test]
    fn unknown_membership_is_rejected() {
        let err = "joined".parse::<Membership>().unwrap_err();
        assert_eq!(err.to_string(), "unknown membership: \"joined\"");
    }

    #[test]
    fn new_summary_is_joined_room() {
        let summary = RoomSummary::new("!a:example.org");
        assert_eq!(summary.display_name, "!a:example.org");
        assert_eq!(summary.membership, Membership::Join);
        assert!(!summary.is_space());
        assert!(RoomSummary::new("!s:example.org").into_space().is_space());
    }

    #[test]
    fn change_membership_classification() {
        assert!(ChangeMembershipState::Joining.is_in_progress());
        assert!(ChangeMembershipState::Left.is_successful());
        assert!(ChangeMembershipState::FailedJoining("forbidden".into()).is_failed());
        assert!(!ChangeMembershipState::Unknown.is_in_progress());
    }

    #[test]
    fn change_membership_cbor() {
        let state = ChangeMembershipState::FailedLeaving("timeout".to_string());

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&state, &mut bytes).unwrap();

        let decoded: ChangeMembershipState = ciborium::de::from_reader(&bytes[..]).unwrap();
        assert_eq!(decoded, state);
    }

    proptest! {
        #[test]
        fn membership_name_parses_back(index in 0..Membership::ALL.len()) {
            let membership = Membership::ALL[index];
            prop_assert_eq!(membership.to_string().parse::<Membership>().unwrap(), membership);
        }
    }
}

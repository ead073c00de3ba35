//! Query parameters.
//!
//! Parameters are plain immutable values. The flow layer clones them so the
//! snapshot accessor and the live accessor see identical filters; each type
//! therefore derives `Clone` and `PartialEq`.

use std::collections::BTreeSet;

use rivulet_proto::{GroupSummary, Membership, RoomSummary, RoomType, User, Widget};

/// Case handling for string predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Case {
    /// Exact comparison.
    #[default]
    Sensitive,
    /// Compare lowercased strings.
    Insensitive,
}

impl Case {
    fn fold<'a>(self, s: &'a str) -> std::borrow::Cow<'a, str> {
        match self {
            Self::Sensitive => s.into(),
            Self::Insensitive => s.to_lowercase().into(),
        }
    }
}

/// Predicate on an optional string attribute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueryStringValue {
    /// Matches every value, including absent ones.
    #[default]
    NoCondition,
    /// Matches only an absent value.
    IsNull,
    /// Matches any present value.
    IsNotNull,
    /// Matches an absent or empty value.
    IsEmpty,
    /// Matches a present, non-empty value.
    IsNotEmpty,
    /// Matches a present value equal to the string.
    Equals(String, Case),
    /// Matches a present value containing the string.
    Contains(String, Case),
    /// Matches an absent value or one not containing the string.
    NotContains(String, Case),
}

impl QueryStringValue {
    /// Case-sensitive equality.
    pub fn equals(s: impl Into<String>) -> Self {
        Self::Equals(s.into(), Case::Sensitive)
    }

    /// Case-insensitive substring.
    pub fn contains(s: impl Into<String>) -> Self {
        Self::Contains(s.into(), Case::Insensitive)
    }

    /// Evaluate the predicate.
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Self::NoCondition => true,
            Self::IsNull => value.is_none(),
            Self::IsNotNull => value.is_some(),
            Self::IsEmpty => value.is_none_or(str::is_empty),
            Self::IsNotEmpty => value.is_some_and(|v| !v.is_empty()),
            Self::Equals(expected, case) => {
                value.is_some_and(|v| case.fold(v) == case.fold(expected))
            },
            Self::Contains(needle, case) => {
                value.is_some_and(|v| case.fold(v).contains(case.fold(needle).as_ref()))
            },
            Self::NotContains(needle, case) => {
                !value.is_some_and(|v| case.fold(v).contains(case.fold(needle).as_ref()))
            },
        }
    }
}

/// Restriction on room type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomTypeFilter {
    /// Rooms and spaces.
    #[default]
    Any,
    /// Regular rooms only.
    Rooms,
    /// Spaces only.
    Spaces,
}

impl RoomTypeFilter {
    fn matches(self, room_type: RoomType) -> bool {
        match self {
            Self::Any => true,
            Self::Rooms => room_type == RoomType::Room,
            Self::Spaces => room_type == RoomType::Space,
        }
    }
}

/// Filter for room summary queries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoomSummaryQueryParams {
    /// Predicate on the room ID.
    pub room_id: QueryStringValue,
    /// Predicate on the display name.
    pub display_name: QueryStringValue,
    /// Predicate on the canonical alias.
    pub canonical_alias: QueryStringValue,
    /// Accepted memberships. Empty accepts any membership.
    pub memberships: Vec<Membership>,
    /// Accepted room type.
    pub room_type: RoomTypeFilter,
}

/// Filter for space summary queries.
///
/// Same shape as [`RoomSummaryQueryParams`]; build it with
/// [`RoomSummaryQueryParams::spaces`].
pub type SpaceSummaryQueryParams = RoomSummaryQueryParams;

impl RoomSummaryQueryParams {
    /// Match every room and space.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match regular rooms the user is invited to or joined.
    pub fn active_rooms() -> Self {
        Self::default()
            .with_memberships([Membership::Invite, Membership::Join])
            .with_room_type(RoomTypeFilter::Rooms)
    }

    /// Match spaces only.
    pub fn spaces() -> Self {
        Self::default().with_room_type(RoomTypeFilter::Spaces)
    }

    /// Restrict the room ID.
    #[must_use]
    pub fn with_room_id(mut self, room_id: QueryStringValue) -> Self {
        self.room_id = room_id;
        self
    }

    /// Restrict the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: QueryStringValue) -> Self {
        self.display_name = display_name;
        self
    }

    /// Restrict the canonical alias.
    #[must_use]
    pub fn with_canonical_alias(mut self, canonical_alias: QueryStringValue) -> Self {
        self.canonical_alias = canonical_alias;
        self
    }

    /// Restrict memberships.
    #[must_use]
    pub fn with_memberships(mut self, memberships: impl IntoIterator<Item = Membership>) -> Self {
        self.memberships = memberships.into_iter().collect();
        self
    }

    /// Restrict room type.
    #[must_use]
    pub fn with_room_type(mut self, room_type: RoomTypeFilter) -> Self {
        self.room_type = room_type;
        self
    }

    /// Evaluate the filter against a summary.
    pub fn matches(&self, summary: &RoomSummary) -> bool {
        self.room_id.matches(Some(&summary.room_id))
            && self.display_name.matches(Some(&summary.display_name))
            && self.canonical_alias.matches(summary.canonical_alias.as_deref())
            && (self.memberships.is_empty() || self.memberships.contains(&summary.membership))
            && self.room_type.matches(summary.room_type)
    }
}

/// Filter for group summary queries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupSummaryQueryParams {
    /// Predicate on the display name.
    pub display_name: QueryStringValue,
    /// Accepted memberships. Empty accepts any membership.
    pub memberships: Vec<Membership>,
}

impl GroupSummaryQueryParams {
    /// Restrict memberships.
    #[must_use]
    pub fn with_memberships(mut self, memberships: impl IntoIterator<Item = Membership>) -> Self {
        self.memberships = memberships.into_iter().collect();
        self
    }

    /// Evaluate the filter against a summary.
    pub fn matches(&self, summary: &GroupSummary) -> bool {
        self.display_name.matches(Some(&summary.display_name))
            && (self.memberships.is_empty() || self.memberships.contains(&summary.membership))
    }
}

/// Filter for the user directory pages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPageQuery {
    /// Case-insensitive substring of the user ID or display name. `None` or
    /// empty matches every user.
    pub filter: Option<String>,
    /// Users never returned.
    pub excluded_user_ids: BTreeSet<String>,
}

impl UserPageQuery {
    /// Build a query from optional parts.
    pub fn new(filter: Option<String>, excluded_user_ids: Option<BTreeSet<String>>) -> Self {
        Self { filter, excluded_user_ids: excluded_user_ids.unwrap_or_default() }
    }

    /// Evaluate the filter against a user.
    pub fn matches(&self, user: &User) -> bool {
        if self.excluded_user_ids.contains(&user.user_id) {
            return false;
        }

        match self.filter.as_deref() {
            None | Some("") => true,
            Some(filter) => {
                let needle = QueryStringValue::contains(filter);
                needle.matches(Some(&user.user_id)) || needle.matches(user.display_name.as_deref())
            },
        }
    }
}

/// Filter for a room's widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetQuery {
    /// Room to read widgets from.
    pub room_id: String,
    /// Predicate on the widget ID.
    pub widget_id: QueryStringValue,
    /// Accepted widget types. `None` accepts any type.
    pub widget_types: Option<BTreeSet<String>>,
    /// Rejected widget types. `None` rejects nothing.
    pub excluded_types: Option<BTreeSet<String>>,
}

impl WidgetQuery {
    /// Every active widget of a room.
    pub fn room(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            widget_id: QueryStringValue::NoCondition,
            widget_types: None,
            excluded_types: None,
        }
    }

    /// Evaluate the filter against a widget. Inactive widgets never match.
    pub fn matches(&self, widget: &Widget) -> bool {
        widget.is_active
            && widget.room_id == self.room_id
            && self.widget_id.matches(Some(&widget.widget_id))
            && self.widget_types.as_ref().is_none_or(|types| types.contains(&widget.widget_type))
            && !self
                .excluded_types
                .as_ref()
                .is_some_and(|types| types.contains(&widget.widget_type))
    }
}

/// Whether an account data event type passes a type filter. An empty filter
/// accepts every type.
pub fn accepts_event_type(types: &BTreeSet<String>, event_type: &str) -> bool {
    types.is_empty() || types.contains(event_type)
}

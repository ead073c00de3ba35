//! Flow configuration.

use std::{collections::BTreeSet, fmt};

/// The live queries a [`FlowSession`](crate::FlowSession) exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryKind {
    /// Room summaries.
    RoomSummaries,
    /// Group summaries.
    GroupSummaries,
    /// Space summaries.
    SpaceSummaries,
    /// Recently visited rooms.
    Breadcrumbs,
    /// Devices of the local account.
    MyDevicesInfo,
    /// Sync loop state.
    SyncState,
    /// Pushers.
    Pushers,
    /// A single user.
    User,
    /// A single room member.
    RoomMember,
    /// All known users.
    Users,
    /// Ignored users.
    IgnoredUsers,
    /// User directory page.
    PagedUsers,
    /// Verified third-party identifiers.
    ThreePids,
    /// Third-party identifiers awaiting validation.
    PendingThreePids,
    /// A user's crypto devices.
    UserCryptoDevices,
    /// A user's public cross-signing identity.
    CrossSigningInfo,
    /// The local account's private cross-signing keys.
    CrossSigningPrivateKeys,
    /// User-scoped account data.
    UserAccountData,
    /// Room-scoped account data.
    RoomAccountData,
    /// Room widgets.
    RoomWidgets,
    /// Join/leave progress per room.
    RoomChangeMembershipState,
}

impl QueryKind {
    /// Every query kind.
    pub const ALL: [Self; 21] = [
        Self::RoomSummaries,
        Self::GroupSummaries,
        Self::SpaceSummaries,
        Self::Breadcrumbs,
        Self::MyDevicesInfo,
        Self::SyncState,
        Self::Pushers,
        Self::User,
        Self::RoomMember,
        Self::Users,
        Self::IgnoredUsers,
        Self::PagedUsers,
        Self::ThreePids,
        Self::PendingThreePids,
        Self::UserCryptoDevices,
        Self::CrossSigningInfo,
        Self::CrossSigningPrivateKeys,
        Self::UserAccountData,
        Self::RoomAccountData,
        Self::RoomWidgets,
        Self::RoomChangeMembershipState,
    ];

    /// Whether the session offers a snapshot accessor for this kind.
    ///
    /// Kinds without one are always pass-through.
    pub fn has_snapshot(self) -> bool {
        !matches!(
            self,
            Self::SyncState
                | Self::Pushers
                | Self::Users
                | Self::IgnoredUsers
                | Self::PagedUsers
                | Self::RoomChangeMembershipState
        )
    }

    /// Stable name used in tracing fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoomSummaries => "room_summaries",
            Self::GroupSummaries => "group_summaries",
            Self::SpaceSummaries => "space_summaries",
            Self::Breadcrumbs => "breadcrumbs",
            Self::MyDevicesInfo => "my_devices_info",
            Self::SyncState => "sync_state",
            Self::Pushers => "pushers",
            Self::User => "user",
            Self::RoomMember => "room_member",
            Self::Users => "users",
            Self::IgnoredUsers => "ignored_users",
            Self::PagedUsers => "paged_users",
            Self::ThreePids => "three_pids",
            Self::PendingThreePids => "pending_three_pids",
            Self::UserCryptoDevices => "user_crypto_devices",
            Self::CrossSigningInfo => "cross_signing_info",
            Self::CrossSigningPrivateKeys => "cross_signing_private_keys",
            Self::UserAccountData => "user_account_data",
            Self::RoomAccountData => "room_account_data",
            Self::RoomWidgets => "room_widgets",
            Self::RoomChangeMembershipState => "room_change_membership_state",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flow session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowConfig {
    /// Kinds served as pure pass-through even though a snapshot accessor
    /// exists. Empty by default: every kind with a snapshot prepends it.
    pub skip_snapshot: BTreeSet<QueryKind>,
}

impl FlowConfig {
    /// Serve `kind` without its snapshot.
    #[must_use]
    pub fn skipping_snapshot(mut self, kind: QueryKind) -> Self {
        self.skip_snapshot.insert(kind);
        self
    }

    /// Whether flows of `kind` start with a snapshot.
    pub fn prepends_snapshot(&self, kind: QueryKind) -> bool {
        kind.has_snapshot() && !self.skip_snapshot.contains(&kind)
    }
}

//! Session capability traits.
//!
//! The session is split into small services so the flow layer and its tests
//! depend only on the accessors they call. Most queries come as a pair:
//!
//! - a snapshot accessor: synchronous, possibly blocking, may fail
//! - a `*_live` accessor: returns a [`LiveHandle`] that may or may not emit the
//!   current value on subscription
//!
//! Both members of a pair must evaluate the same parameters the same way.
//! Queries with only a live accessor are used as pure pass-through.

use std::collections::{BTreeMap, BTreeSet};

use rivulet_proto::{
    ChangeMembershipState, CrossSigningInfo, CryptoDeviceInfo, DeviceInfo, GroupSummary,
    PrivateKeysInfo, Pusher, RoomAccountDataEvent, RoomMemberSummary, RoomSummary, SyncState,
    ThreePid, User, UserAccountDataEvent, Widget,
};

use crate::{
    error::SessionResult,
    live::LiveHandle,
    query::{
        GroupSummaryQueryParams, RoomSummaryQueryParams, SpaceSummaryQueryParams, UserPageQuery,
        WidgetQuery,
    },
};

/// Rooms, breadcrumbs, members and pending membership changes.
pub trait RoomService: Send + Sync {
    /// Room summaries matching `params`.
    fn room_summaries(&self, params: &RoomSummaryQueryParams) -> SessionResult<Vec<RoomSummary>>;

    /// Live room summaries matching `params`.
    fn room_summaries_live(&self, params: RoomSummaryQueryParams) -> LiveHandle<Vec<RoomSummary>>;

    /// Recently visited rooms matching `params`, most recent first.
    fn breadcrumbs(&self, params: &RoomSummaryQueryParams) -> SessionResult<Vec<RoomSummary>>;

    /// Live recently visited rooms matching `params`.
    fn breadcrumbs_live(&self, params: RoomSummaryQueryParams) -> LiveHandle<Vec<RoomSummary>>;

    /// A single room member.
    fn room_member(&self, user_id: &str, room_id: &str)
    -> SessionResult<Option<RoomMemberSummary>>;

    /// A single live room member.
    fn room_member_live(
        &self,
        user_id: String,
        room_id: String,
    ) -> LiveHandle<Option<RoomMemberSummary>>;

    /// Live join/leave progress keyed by room ID.
    fn change_memberships_live(&self) -> LiveHandle<BTreeMap<String, ChangeMembershipState>>;
}

/// Groups (communities).
pub trait GroupService: Send + Sync {
    /// Group summaries matching `params`.
    fn group_summaries(&self, params: &GroupSummaryQueryParams)
    -> SessionResult<Vec<GroupSummary>>;

    /// Live group summaries matching `params`.
    fn group_summaries_live(&self, params: GroupSummaryQueryParams)
    -> LiveHandle<Vec<GroupSummary>>;
}

/// Spaces.
pub trait SpaceService: Send + Sync {
    /// Space summaries matching `params`.
    fn space_summaries(&self, params: &SpaceSummaryQueryParams) -> SessionResult<Vec<RoomSummary>>;

    /// Live space summaries matching `params`.
    fn space_summaries_live(&self, params: SpaceSummaryQueryParams)
    -> LiveHandle<Vec<RoomSummary>>;
}

/// Background sync loop.
pub trait SyncStatusService: Send + Sync {
    /// Live sync state. Always initialized, so there is no snapshot accessor.
    fn sync_state_live(&self) -> LiveHandle<SyncState>;
}

/// Push gateway registrations.
pub trait PushersService: Send + Sync {
    /// Live pushers.
    fn pushers_live(&self) -> LiveHandle<Vec<Pusher>>;
}

/// Users known to the session.
pub trait UserService: Send + Sync {
    /// A single user.
    fn user(&self, user_id: &str) -> SessionResult<Option<User>>;

    /// A single live user.
    fn user_live(&self, user_id: String) -> LiveHandle<Option<User>>;

    /// Live list of all known users.
    fn users_live(&self) -> LiveHandle<Vec<User>>;

    /// Live list of ignored users.
    fn ignored_users_live(&self) -> LiveHandle<Vec<User>>;

    /// Live page of the user directory.
    fn paged_users_live(&self, query: UserPageQuery) -> LiveHandle<Vec<User>>;
}

/// Third-party identifiers bound to the account.
pub trait ThreePidService: Send + Sync {
    /// Verified third-party identifiers.
    fn three_pids(&self) -> SessionResult<Vec<ThreePid>>;

    /// Live verified identifiers. `refresh_data` asks the session to refresh
    /// the list from the server.
    fn three_pids_live(&self, refresh_data: bool) -> LiveHandle<Vec<ThreePid>>;

    /// Identifiers awaiting validation.
    fn pending_three_pids(&self) -> SessionResult<Vec<ThreePid>>;

    /// Live identifiers awaiting validation.
    fn pending_three_pids_live(&self) -> LiveHandle<Vec<ThreePid>>;
}

/// Device lists and cross-signing state.
pub trait CryptoService: Send + Sync {
    /// Devices of the local account.
    fn my_devices_info(&self) -> SessionResult<Vec<DeviceInfo>>;

    /// Live devices of the local account.
    fn my_devices_info_live(&self) -> LiveHandle<Vec<DeviceInfo>>;

    /// Crypto devices of a user.
    fn crypto_device_info(&self, user_id: &str) -> SessionResult<Vec<CryptoDeviceInfo>>;

    /// Live crypto devices of a user.
    fn crypto_device_info_live(&self, user_id: String) -> LiveHandle<Vec<CryptoDeviceInfo>>;

    /// Public cross-signing identity of a user.
    fn user_cross_signing_keys(&self, user_id: &str) -> SessionResult<Option<CrossSigningInfo>>;

    /// Live public cross-signing identity of a user.
    fn cross_signing_keys_live(&self, user_id: String) -> LiveHandle<Option<CrossSigningInfo>>;

    /// Private cross-signing keys of the local account.
    fn cross_signing_private_keys(&self) -> SessionResult<Option<PrivateKeysInfo>>;

    /// Live private cross-signing keys of the local account.
    fn cross_signing_private_keys_live(&self) -> LiveHandle<Option<PrivateKeysInfo>>;
}

/// Account data. An empty type set selects every type.
pub trait AccountDataService: Send + Sync {
    /// User-scoped events of the given types.
    fn user_account_data_events(
        &self,
        types: &BTreeSet<String>,
    ) -> SessionResult<Vec<UserAccountDataEvent>>;

    /// Live user-scoped events of the given types.
    fn user_account_data_events_live(
        &self,
        types: BTreeSet<String>,
    ) -> LiveHandle<Vec<UserAccountDataEvent>>;

    /// Room-scoped events of the given types, across rooms.
    fn room_account_data_events(
        &self,
        types: &BTreeSet<String>,
    ) -> SessionResult<Vec<RoomAccountDataEvent>>;

    /// Live room-scoped events of the given types.
    fn room_account_data_events_live(
        &self,
        types: BTreeSet<String>,
    ) -> LiveHandle<Vec<RoomAccountDataEvent>>;
}

/// Room widgets.
pub trait WidgetService: Send + Sync {
    /// Active widgets matching `query`.
    fn room_widgets(&self, query: &WidgetQuery) -> SessionResult<Vec<Widget>>;

    /// Live active widgets matching `query`.
    fn room_widgets_live(&self, query: WidgetQuery) -> LiveHandle<Vec<Widget>>;
}

/// Everything the flow layer needs from a session.
///
/// Implemented automatically for any type providing every service.
pub trait Session:
    RoomService
    + GroupService
    + SpaceService
    + SyncStatusService
    + PushersService
    + UserService
    + ThreePidService
    + CryptoService
    + AccountDataService
    + WidgetService
{
}

impl<T> Session for T where
    T: RoomService
        + GroupService
        + SpaceService
        + SyncStatusService
        + PushersService
        + UserService
        + ThreePidService
        + CryptoService
        + AccountDataService
        + WidgetService
{
}

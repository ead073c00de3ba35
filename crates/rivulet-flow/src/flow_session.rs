//! Stream view of a session.
//!
//! [`FlowSession`] wraps a shared session and offers one `live_*` method per
//! [`QueryKind`]. Each call builds an independent [`LiveQuery`] whose snapshot
//! and live accessors see the same parameters.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use rivulet_core::{
    GroupSummaryQueryParams, LiveHandle, QueryStringValue, RoomSummaryQueryParams, Session,
    SessionResult, SpaceSummaryQueryParams, UserPageQuery, WidgetQuery,
};
use rivulet_proto::{
    ChangeMembershipState, CrossSigningInfo, CryptoDeviceInfo, DeviceInfo, GroupSummary,
    PrivateKeysInfo, Pusher, RoomAccountDataEvent, RoomMemberSummary, RoomSummary, SyncState,
    ThreePid, User, UserAccountDataEvent, Widget,
};

use crate::{
    bridge::{Flow, LiveQuery},
    config::{FlowConfig, QueryKind},
};

/// Live queries of a session, as streams.
///
/// Cheap to clone. Streams returned by the `live_*` methods keep the session
/// alive until they are dropped.
pub struct FlowSession<S: ?Sized> {
    session: Arc<S>,
    config: FlowConfig,
}

impl<S: ?Sized> Clone for FlowSession<S> {
    fn clone(&self) -> Self {
        Self { session: Arc::clone(&self.session), config: self.config.clone() }
    }
}

impl<S> FlowSession<S>
where
    S: Session + ?Sized + 'static,
{
    /// Wrap `session` with the default configuration.
    pub fn new(session: Arc<S>) -> Self {
        Self::with_config(session, FlowConfig::default())
    }

    /// Wrap `session` with an explicit configuration.
    pub fn with_config(session: Arc<S>, config: FlowConfig) -> Self {
        Self { session, config }
    }

    /// The wrapped session.
    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    /// Active configuration.
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    fn observe<T, R, L>(&self, kind: QueryKind, read: R, live: L) -> Flow<T>
    where
        T: Send + 'static,
        R: FnOnce(&S) -> SessionResult<T> + Send + 'static,
        L: FnOnce(&S) -> LiveHandle<T> + Send + 'static,
    {
        let query = self.live_query(kind, live);
        if !self.config.prepends_snapshot(kind) {
            return query.into_flow();
        }

        let session = Arc::clone(&self.session);
        query.with_snapshot(move || read(&*session)).into_flow()
    }

    fn observe_live<T, L>(&self, kind: QueryKind, live: L) -> Flow<T>
    where
        T: Send + 'static,
        L: FnOnce(&S) -> LiveHandle<T> + Send + 'static,
    {
        self.live_query(kind, live).into_flow()
    }

    fn live_query<T, L>(&self, kind: QueryKind, live: L) -> LiveQuery<T>
    where
        T: Send + 'static,
        L: FnOnce(&S) -> LiveHandle<T> + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        LiveQuery::new(move || live(&*session)).named(kind.as_str())
    }

    /// Room summaries matching `params`.
    pub fn live_room_summaries(&self, params: RoomSummaryQueryParams) -> Flow<Vec<RoomSummary>> {
        let read_params = params.clone();
        self.observe(
            QueryKind::RoomSummaries,
            move |s| s.room_summaries(&read_params),
            move |s| s.room_summaries_live(params),
        )
    }

    /// Group summaries matching `params`.
    pub fn live_group_summaries(
        &self,
        params: GroupSummaryQueryParams,
    ) -> Flow<Vec<GroupSummary>> {
        let read_params = params.clone();
        self.observe(
            QueryKind::GroupSummaries,
            move |s| s.group_summaries(&read_params),
            move |s| s.group_summaries_live(params),
        )
    }

    /// Space summaries matching `params`.
    pub fn live_space_summaries(&self, params: SpaceSummaryQueryParams) -> Flow<Vec<RoomSummary>> {
        let read_params = params.clone();
        self.observe(
            QueryKind::SpaceSummaries,
            move |s| s.space_summaries(&read_params),
            move |s| s.space_summaries_live(params),
        )
    }

    /// Recently visited rooms matching `params`.
    pub fn live_breadcrumbs(&self, params: RoomSummaryQueryParams) -> Flow<Vec<RoomSummary>> {
        let read_params = params.clone();
        self.observe(
            QueryKind::Breadcrumbs,
            move |s| s.breadcrumbs(&read_params),
            move |s| s.breadcrumbs_live(params),
        )
    }

    /// Devices of the local account.
    pub fn live_my_devices_info(&self) -> Flow<Vec<DeviceInfo>> {
        self.observe(
            QueryKind::MyDevicesInfo,
            |s| s.my_devices_info(),
            |s| s.my_devices_info_live(),
        )
    }

    /// Sync loop state.
    pub fn live_sync_state(&self) -> Flow<SyncState> {
        self.observe_live(QueryKind::SyncState, |s| s.sync_state_live())
    }

    /// Pushers.
    pub fn live_pushers(&self) -> Flow<Vec<Pusher>> {
        self.observe_live(QueryKind::Pushers, |s| s.pushers_live())
    }

    /// A single user, `None` while unknown.
    pub fn live_user(&self, user_id: impl Into<String>) -> Flow<Option<User>> {
        let user_id = user_id.into();
        let read_id = user_id.clone();
        self.observe(QueryKind::User, move |s| s.user(&read_id), move |s| s.user_live(user_id))
    }

    /// A single room member, `None` while unknown.
    pub fn live_room_member(
        &self,
        user_id: impl Into<String>,
        room_id: impl Into<String>,
    ) -> Flow<Option<RoomMemberSummary>> {
        let (user_id, room_id) = (user_id.into(), room_id.into());
        let (read_user, read_room) = (user_id.clone(), room_id.clone());
        self.observe(
            QueryKind::RoomMember,
            move |s| s.room_member(&read_user, &read_room),
            move |s| s.room_member_live(user_id, room_id),
        )
    }

    /// All known users.
    pub fn live_users(&self) -> Flow<Vec<User>> {
        self.observe_live(QueryKind::Users, |s| s.users_live())
    }

    /// Ignored users.
    pub fn live_ignored_users(&self) -> Flow<Vec<User>> {
        self.observe_live(QueryKind::IgnoredUsers, |s| s.ignored_users_live())
    }

    /// A page of the user directory.
    ///
    /// `filter` is a case-insensitive substring on the user ID or display
    /// name. Users listed in `excluded_user_ids` are left out.
    pub fn live_paged_users(
        &self,
        filter: Option<String>,
        excluded_user_ids: Option<BTreeSet<String>>,
    ) -> Flow<Vec<User>> {
        let query = UserPageQuery::new(filter, excluded_user_ids);
        self.observe_live(QueryKind::PagedUsers, move |s| s.paged_users_live(query))
    }

    /// Verified third-party identifiers.
    ///
    /// `refresh_data` is forwarded to the live accessor only; the snapshot
    /// reflects whatever the session holds at subscription time.
    pub fn live_three_pids(&self, refresh_data: bool) -> Flow<Vec<ThreePid>> {
        self.observe(
            QueryKind::ThreePids,
            |s| s.three_pids(),
            move |s| s.three_pids_live(refresh_data),
        )
    }

    /// Third-party identifiers awaiting validation.
    pub fn live_pending_three_pids(&self) -> Flow<Vec<ThreePid>> {
        self.observe(
            QueryKind::PendingThreePids,
            |s| s.pending_three_pids(),
            |s| s.pending_three_pids_live(),
        )
    }

    /// Crypto devices of a user.
    pub fn live_user_crypto_devices(
        &self,
        user_id: impl Into<String>,
    ) -> Flow<Vec<CryptoDeviceInfo>> {
        let user_id = user_id.into();
        let read_id = user_id.clone();
        self.observe(
            QueryKind::UserCryptoDevices,
            move |s| s.crypto_device_info(&read_id),
            move |s| s.crypto_device_info_live(user_id),
        )
    }

    /// Public cross-signing identity of a user.
    pub fn live_cross_signing_info(
        &self,
        user_id: impl Into<String>,
    ) -> Flow<Option<CrossSigningInfo>> {
        let user_id = user_id.into();
        let read_id = user_id.clone();
        self.observe(
            QueryKind::CrossSigningInfo,
            move |s| s.user_cross_signing_keys(&read_id),
            move |s| s.cross_signing_keys_live(user_id),
        )
    }

    /// Private cross-signing keys of the local account.
    pub fn live_cross_signing_private_keys(&self) -> Flow<Option<PrivateKeysInfo>> {
        self.observe(
            QueryKind::CrossSigningPrivateKeys,
            |s| s.cross_signing_private_keys(),
            |s| s.cross_signing_private_keys_live(),
        )
    }

    /// User-scoped account data of the given types. An empty set selects
    /// every type.
    pub fn live_user_account_data(
        &self,
        types: BTreeSet<String>,
    ) -> Flow<Vec<UserAccountDataEvent>> {
        let read_types = types.clone();
        self.observe(
            QueryKind::UserAccountData,
            move |s| s.user_account_data_events(&read_types),
            move |s| s.user_account_data_events_live(types),
        )
    }

    /// Room-scoped account data of the given types. An empty set selects
    /// every type.
    pub fn live_room_account_data(
        &self,
        types: BTreeSet<String>,
    ) -> Flow<Vec<RoomAccountDataEvent>> {
        let read_types = types.clone();
        self.observe(
            QueryKind::RoomAccountData,
            move |s| s.room_account_data_events(&read_types),
            move |s| s.room_account_data_events_live(types),
        )
    }

    /// Active widgets of a room.
    pub fn live_room_widgets(
        &self,
        room_id: impl Into<String>,
        widget_id: QueryStringValue,
        widget_types: Option<BTreeSet<String>>,
        excluded_types: Option<BTreeSet<String>>,
    ) -> Flow<Vec<Widget>> {
        let query = WidgetQuery {
            room_id: room_id.into(),
            widget_id,
            widget_types,
            excluded_types,
        };
        let read_query = query.clone();
        self.observe(
            QueryKind::RoomWidgets,
            move |s| s.room_widgets(&read_query),
            move |s| s.room_widgets_live(query),
        )
    }

    /// Join/leave progress keyed by room ID.
    pub fn live_room_change_membership_state(
        &self,
    ) -> Flow<BTreeMap<String, ChangeMembershipState>> {
        self.observe_live(QueryKind::RoomChangeMembershipState, |s| s.change_memberships_live())
    }
}

/// `session.flow()` for shared sessions.
pub trait SessionFlowExt<S: ?Sized> {
    /// Stream view of this session with the default configuration.
    fn flow(&self) -> FlowSession<S>;
}

impl<S> SessionFlowExt<S> for Arc<S>
where
    S: Session + ?Sized + 'static,
{
    fn flow(&self) -> FlowSession<S> {
        FlowSession::new(Arc::clone(self))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::{FutureExt, StreamExt};
    use rivulet_core::{
        AccountDataService, CryptoService, GroupService, PushersService, RoomService,
        SessionError, SpaceService, SyncStatusService, ThreePidService, UserService,
        WidgetService,
    };

    use super::*;

    /// Session whose room summaries come from a fixed list and whose other
    /// accessors return empty values.
    #[derive(Default)]
    struct StubSession {
        rooms: Vec<RoomSummary>,
        reads: AtomicUsize,
        refreshes: AtomicUsize,
    }

    impl RoomService for StubSession {
        fn room_summaries(
            &self,
            params: &RoomSummaryQueryParams,
        ) -> SessionResult<Vec<RoomSummary>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.rooms.iter().filter(|r| params.matches(r)).cloned().collect())
        }

        fn room_summaries_live(
            &self,
            _params: RoomSummaryQueryParams,
        ) -> LiveHandle<Vec<RoomSummary>> {
            LiveHandle::pending()
        }

        fn breadcrumbs(&self, _params: &RoomSummaryQueryParams) -> SessionResult<Vec<RoomSummary>> {
            Err(SessionError::Closed)
        }

        fn breadcrumbs_live(
            &self,
            _params: RoomSummaryQueryParams,
        ) -> LiveHandle<Vec<RoomSummary>> {
            LiveHandle::from_values(vec![Vec::new()])
        }

        fn room_member(
            &self,
            _user_id: &str,
            _room_id: &str,
        ) -> SessionResult<Option<RoomMemberSummary>> {
            Ok(None)
        }

        fn room_member_live(
            &self,
            _user_id: String,
            _room_id: String,
        ) -> LiveHandle<Option<RoomMemberSummary>> {
            LiveHandle::pending()
        }

        fn change_memberships_live(&self) -> LiveHandle<BTreeMap<String, ChangeMembershipState>> {
            LiveHandle::from_values(vec![BTreeMap::new()])
        }
    }

    impl GroupService for StubSession {
        fn group_summaries(
            &self,
            _params: &GroupSummaryQueryParams,
        ) -> SessionResult<Vec<GroupSummary>> {
            Ok(Vec::new())
        }

        fn group_summaries_live(
            &self,
            _params: GroupSummaryQueryParams,
        ) -> LiveHandle<Vec<GroupSummary>> {
            LiveHandle::pending()
        }
    }

    impl SpaceService for StubSession {
        fn space_summaries(
            &self,
            _params: &SpaceSummaryQueryParams,
        ) -> SessionResult<Vec<RoomSummary>> {
            Ok(Vec::new())
        }

        fn space_summaries_live(
            &self,
            _params: SpaceSummaryQueryParams,
        ) -> LiveHandle<Vec<RoomSummary>> {
            LiveHandle::pending()
        }
    }

    impl SyncStatusService for StubSession {
        fn sync_state_live(&self) -> LiveHandle<SyncState> {
            LiveHandle::from_values(vec![SyncState::Idle])
        }
    }

    impl PushersService for StubSession {
        fn pushers_live(&self) -> LiveHandle<Vec<Pusher>> {
            LiveHandle::pending()
        }
    }

    impl UserService for StubSession {
        fn user(&self, _user_id: &str) -> SessionResult<Option<User>> {
            Ok(None)
        }

        fn user_live(&self, _user_id: String) -> LiveHandle<Option<User>> {
            LiveHandle::pending()
        }

        fn users_live(&self) -> LiveHandle<Vec<User>> {
            LiveHandle::pending()
        }

        fn ignored_users_live(&self) -> LiveHandle<Vec<User>> {
            LiveHandle::pending()
        }

        fn paged_users_live(&self, _query: UserPageQuery) -> LiveHandle<Vec<User>> {
            LiveHandle::pending()
        }
    }

    impl ThreePidService for StubSession {
        fn three_pids(&self) -> SessionResult<Vec<ThreePid>> {
            Ok(Vec::new())
        }

        fn three_pids_live(&self, refresh_data: bool) -> LiveHandle<Vec<ThreePid>> {
            if refresh_data {
                self.refreshes.fetch_add(1, Ordering::SeqCst);
            }
            LiveHandle::pending()
        }

        fn pending_three_pids(&self) -> SessionResult<Vec<ThreePid>> {
            Ok(Vec::new())
        }

        fn pending_three_pids_live(&self) -> LiveHandle<Vec<ThreePid>> {
            LiveHandle::pending()
        }
    }

    impl CryptoService for StubSession {
        fn my_devices_info(&self) -> SessionResult<Vec<DeviceInfo>> {
            Ok(Vec::new())
        }

        fn my_devices_info_live(&self) -> LiveHandle<Vec<DeviceInfo>> {
            LiveHandle::pending()
        }

        fn crypto_device_info(&self, _user_id: &str) -> SessionResult<Vec<CryptoDeviceInfo>> {
            Ok(Vec::new())
        }

        fn crypto_device_info_live(&self, _user_id: String) -> LiveHandle<Vec<CryptoDeviceInfo>> {
            LiveHandle::pending()
        }

        fn user_cross_signing_keys(
            &self,
            _user_id: &str,
        ) -> SessionResult<Option<CrossSigningInfo>> {
            Ok(None)
        }

        fn cross_signing_keys_live(
            &self,
            _user_id: String,
        ) -> LiveHandle<Option<CrossSigningInfo>> {
            LiveHandle::pending()
        }

        fn cross_signing_private_keys(&self) -> SessionResult<Option<PrivateKeysInfo>> {
            Ok(None)
        }

        fn cross_signing_private_keys_live(&self) -> LiveHandle<Option<PrivateKeysInfo>> {
            LiveHandle::pending()
        }
    }

    impl AccountDataService for StubSession {
        fn user_account_data_events(
            &self,
            _types: &BTreeSet<String>,
        ) -> SessionResult<Vec<UserAccountDataEvent>> {
            Ok(Vec::new())
        }

        fn user_account_data_events_live(
            &self,
            _types: BTreeSet<String>,
        ) -> LiveHandle<Vec<UserAccountDataEvent>> {
            LiveHandle::pending()
        }

        fn room_account_data_events(
            &self,
            _types: &BTreeSet<String>,
        ) -> SessionResult<Vec<RoomAccountDataEvent>> {
            Ok(Vec::new())
        }

        fn room_account_data_events_live(
            &self,
            _types: BTreeSet<String>,
        ) -> LiveHandle<Vec<RoomAccountDataEvent>> {
            LiveHandle::pending()
        }
    }

    impl WidgetService for StubSession {
        fn room_widgets(&self, _query: &WidgetQuery) -> SessionResult<Vec<Widget>> {
            Ok(Vec::new())
        }

        fn room_widgets_live(&self, _query: WidgetQuery) -> LiveHandle<Vec<Widget>> {
            LiveHandle::pending()
        }
    }

    fn stub_with_rooms() -> Arc<StubSession> {
        Arc::new(StubSession {
            rooms: vec![
                RoomSummary::new("!a:example.org"),
                RoomSummary::new("!b:example.org").into_space(),
            ],
            ..StubSession::default()
        })
    }

    #[tokio::test]
    async fn snapshot_applies_query_params() {
        let session = stub_with_rooms();
        let mut flow = session.flow().live_room_summaries(RoomSummaryQueryParams::active_rooms());

        let rooms = flow.next().await.unwrap().unwrap();
        assert_eq!(rooms, vec![RoomSummary::new("!a:example.org")]);
    }

    #[tokio::test]
    async fn skipped_snapshot_is_never_read() {
        let session = stub_with_rooms();
        let config = FlowConfig::default().skipping_snapshot(QueryKind::RoomSummaries);
        let mut flow = FlowSession::with_config(Arc::clone(&session), config)
            .live_room_summaries(RoomSummaryQueryParams::all());

        assert!(flow.next().now_or_never().is_none());
        assert_eq!(session.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_breadcrumbs_read_ends_flow() {
        let session = stub_with_rooms();
        let items: Vec<_> =
            session.flow().live_breadcrumbs(RoomSummaryQueryParams::all()).collect().await;

        assert_eq!(items, vec![Err(SessionError::Closed)]);
    }

    #[tokio::test]
    async fn refresh_flag_reaches_live_accessor() {
        let session = stub_with_rooms();
        let flow = session.flow();

        let mut refreshed = flow.live_three_pids(true);
        let mut plain = flow.live_three_pids(false);
        assert_eq!(refreshed.next().await, Some(Ok(Vec::new())));
        assert_eq!(plain.next().await, Some(Ok(Vec::new())));

        assert_eq!(session.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn works_through_trait_object() {
        let session: Arc<dyn Session> = stub_with_rooms();
        let mut flow = FlowSession::new(session).live_sync_state();

        assert_eq!(flow.next().await, Some(Ok(SyncState::Idle)));
        assert_eq!(flow.next().await, None);
    }

    #[test]
    fn building_a_flow_reads_nothing() {
        let session = stub_with_rooms();
        let _flow = session.flow().live_room_summaries(RoomSummaryQueryParams::all());

        assert_eq!(session.reads.load(Ordering::SeqCst), 0);
    }
}

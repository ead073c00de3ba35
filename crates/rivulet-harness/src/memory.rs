//! In-memory session.
//!
//! Every table is an independent [`LiveData`] cell. Snapshot accessors read
//! the cell and apply the query; live accessors observe the cell through the
//! same query. Mutations notify observers only when a table actually changes.
//!
//! Snapshot reads can be made to fail with [`MemorySession::close`] and
//! [`MemorySession::fail_snapshots`]. Live accessors never fail.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use rivulet_core::{
    AccountDataService, CryptoService, GroupService, GroupSummaryQueryParams, LiveData,
    LiveHandle, PushersService, RoomService, RoomSummaryQueryParams, SessionError, SessionResult,
    SpaceService, SpaceSummaryQueryParams, SyncStatusService, ThreePidService, UserPageQuery,
    UserService, WidgetQuery, WidgetService, accepts_event_type,
};
use rivulet_proto::{
    ChangeMembershipState, CrossSigningInfo, CryptoDeviceInfo, DeviceInfo, GroupSummary,
    Membership, PrivateKeysInfo, Pusher, RoomAccountDataEvent, RoomMemberSummary, RoomSummary,
    SyncState, ThreePid, User, UserAccountDataEvent, Widget,
};
use tracing::trace;

/// Default number of users in a directory page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Memory session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySessionConfig {
    /// Maximum number of users returned by `paged_users_live`.
    pub page_size: usize,
    /// Live handles emit the current value on subscription. When false they
    /// emit changes only, like a source whose first value arrives later.
    pub replay_on_subscribe: bool,
}

impl Default for MemorySessionConfig {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, replay_on_subscribe: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct RoomTable {
    summaries: Vec<RoomSummary>,
    /// Room IDs, most recent first.
    breadcrumbs: Vec<String>,
}

impl RoomTable {
    fn summaries(&self, params: &RoomSummaryQueryParams) -> Vec<RoomSummary> {
        self.summaries.iter().filter(|room| params.matches(room)).cloned().collect()
    }

    fn breadcrumbs(&self, params: &RoomSummaryQueryParams) -> Vec<RoomSummary> {
        self.breadcrumbs
            .iter()
            .filter_map(|id| self.summaries.iter().find(|room| room.room_id == *id))
            .filter(|room| params.matches(room))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct UserTable {
    users: Vec<User>,
    ignored: BTreeSet<String>,
}

impl UserTable {
    fn ignored_users(&self) -> Vec<User> {
        self.ignored
            .iter()
            .map(|id| {
                self.users
                    .iter()
                    .find(|user| user.user_id == *id)
                    .cloned()
                    .unwrap_or_else(|| User::new(id.clone()))
            })
            .collect()
    }
}

/// Replace the item `same` identifies, or append. Returns whether `items`
/// changed.
fn upsert<T: PartialEq>(items: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) -> bool {
    match items.iter().position(|existing| same(existing, &item)) {
        Some(i) if items[i] == item => false,
        Some(i) => {
            items[i] = item;
            true
        },
        None => {
            items.push(item);
            true
        },
    }
}

fn replace<T: PartialEq>(current: &mut T, next: T) -> bool {
    if *current == next {
        return false;
    }
    *current = next;
    true
}

/// Session kept entirely in memory.
#[derive(Debug)]
pub struct MemorySession {
    config: MemorySessionConfig,
    rooms: LiveData<RoomTable>,
    members: LiveData<Vec<RoomMemberSummary>>,
    change_memberships: LiveData<BTreeMap<String, ChangeMembershipState>>,
    groups: LiveData<Vec<GroupSummary>>,
    sync_state: LiveData<SyncState>,
    pushers: LiveData<Vec<Pusher>>,
    users: LiveData<UserTable>,
    three_pids: LiveData<Vec<ThreePid>>,
    pending_three_pids: LiveData<Vec<ThreePid>>,
    my_devices: LiveData<Vec<DeviceInfo>>,
    crypto_devices: LiveData<BTreeMap<String, Vec<CryptoDeviceInfo>>>,
    cross_signing: LiveData<BTreeMap<String, CrossSigningInfo>>,
    private_keys: LiveData<Option<PrivateKeysInfo>>,
    user_account_data: LiveData<Vec<UserAccountDataEvent>>,
    room_account_data: LiveData<Vec<RoomAccountDataEvent>>,
    widgets: LiveData<Vec<Widget>>,
    closed: AtomicBool,
    failure: Mutex<Option<SessionError>>,
    snapshot_reads: AtomicUsize,
    three_pid_refreshes: AtomicUsize,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySession {
    /// Empty session with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MemorySessionConfig::default())
    }

    /// Empty session.
    pub fn with_config(config: MemorySessionConfig) -> Self {
        Self {
            config,
            rooms: LiveData::new(RoomTable::default()),
            members: LiveData::new(Vec::new()),
            change_memberships: LiveData::new(BTreeMap::new()),
            groups: LiveData::new(Vec::new()),
            sync_state: LiveData::new(SyncState::Idle),
            pushers: LiveData::new(Vec::new()),
            users: LiveData::new(UserTable::default()),
            three_pids: LiveData::new(Vec::new()),
            pending_three_pids: LiveData::new(Vec::new()),
            my_devices: LiveData::new(Vec::new()),
            crypto_devices: LiveData::new(BTreeMap::new()),
            cross_signing: LiveData::new(BTreeMap::new()),
            private_keys: LiveData::new(None),
            user_account_data: LiveData::new(Vec::new()),
            room_account_data: LiveData::new(Vec::new()),
            widgets: LiveData::new(Vec::new()),
            closed: AtomicBool::new(false),
            failure: Mutex::new(None),
            snapshot_reads: AtomicUsize::new(0),
            three_pid_refreshes: AtomicUsize::new(0),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &MemorySessionConfig {
        &self.config
    }

    /// Make every later snapshot read fail with [`SessionError::Closed`].
    ///
    /// Live handles already handed out keep working.
    pub fn close(&self) {
        trace!("session closed");
        self.closed.store(true, Ordering::Release);
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Make snapshot reads fail with `failure`, or succeed again with `None`.
    pub fn fail_snapshots(&self, failure: Option<SessionError>) {
        trace!(?failure, "snapshot failure injected");
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = failure;
    }

    /// Number of snapshot reads served or refused so far.
    pub fn snapshot_reads(&self) -> usize {
        self.snapshot_reads.load(Ordering::SeqCst)
    }

    /// Number of `three_pids_live(true)` calls.
    pub fn three_pid_refreshes(&self) -> usize {
        self.three_pid_refreshes.load(Ordering::SeqCst)
    }

    /// Live handles currently observing the room table.
    pub fn room_observers(&self) -> usize {
        self.rooms.observer_count()
    }

    fn read<T>(&self, query: &'static str, read: impl FnOnce() -> T) -> SessionResult<T> {
        self.snapshot_reads.fetch_add(1, Ordering::SeqCst);

        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        let failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(err) = failure {
            trace!(query, error = %err, "snapshot refused");
            return Err(err);
        }

        Ok(read())
    }

    fn watch<T, U, F>(&self, cell: &LiveData<T>, project: F) -> LiveHandle<U>
    where
        T: Clone + Send + Sync + 'static,
        U: Send + 'static,
        F: Fn(&T) -> U + Send + 'static,
    {
        if self.config.replay_on_subscribe {
            cell.observe_map(project)
        } else {
            cell.observe_changes().map(move |value| project(&value))
        }
    }

    /// Insert a room or space, or replace the one with the same ID.
    pub fn upsert_room(&self, summary: RoomSummary) {
        trace!(room_id = %summary.room_id, "upsert room");
        self.rooms.update(|table| {
            upsert(&mut table.summaries, summary, |a, b| a.room_id == b.room_id)
        });
    }

    /// Forget a room. Returns false if it was unknown.
    pub fn remove_room(&self, room_id: &str) -> bool {
        trace!(room_id, "remove room");
        self.rooms.update(|table| {
            let before = table.summaries.len();
            table.summaries.retain(|room| room.room_id != room_id);
            table.breadcrumbs.retain(|id| id != room_id);
            table.summaries.len() != before
        })
    }

    /// Change the local user's membership in a room. Returns false if the room
    /// is unknown.
    pub fn set_room_membership(&self, room_id: &str, membership: Membership) -> bool {
        trace!(room_id, %membership, "set room membership");
        let mut found = false;
        self.rooms.update(|table| {
            let Some(room) = table.summaries.iter_mut().find(|room| room.room_id == room_id) else {
                return false;
            };
            found = true;
            replace(&mut room.membership, membership)
        });
        found
    }

    /// Move a room to the front of the breadcrumbs. Returns false if the room
    /// is unknown.
    pub fn visit_room(&self, room_id: &str) -> bool {
        trace!(room_id, "visit room");
        let mut found = false;
        self.rooms.update(|table| {
            if !table.summaries.iter().any(|room| room.room_id == room_id) {
                return false;
            }
            found = true;
            if table.breadcrumbs.first().is_some_and(|id| id == room_id) {
                return false;
            }
            table.breadcrumbs.retain(|id| id != room_id);
            table.breadcrumbs.insert(0, room_id.to_owned());
            true
        });
        found
    }

    /// Insert a room member, or replace the one with the same room and user.
    pub fn upsert_member(&self, member: RoomMemberSummary) {
        trace!(room_id = %member.room_id, user_id = %member.user_id, "upsert member");
        self.members.update(|members| {
            upsert(members, member, |a, b| a.room_id == b.room_id && a.user_id == b.user_id)
        });
    }

    /// Record join/leave progress for a room.
    pub fn set_change_membership(&self, room_id: &str, state: ChangeMembershipState) {
        trace!(room_id, ?state, "change membership");
        self.change_memberships.update(|states| {
            if states.get(room_id) == Some(&state) {
                return false;
            }
            states.insert(room_id.to_owned(), state);
            true
        });
    }

    /// Insert a group, or replace the one with the same ID.
    pub fn upsert_group(&self, group: GroupSummary) {
        trace!(group_id = %group.group_id, "upsert group");
        self.groups.update(|groups| upsert(groups, group, |a, b| a.group_id == b.group_id));
    }

    /// Set the sync loop state.
    pub fn set_sync_state(&self, state: SyncState) {
        trace!(?state, "sync state");
        self.sync_state.update(|current| replace(current, state));
    }

    /// Replace the pusher list.
    pub fn set_pushers(&self, pushers: Vec<Pusher>) {
        trace!(count = pushers.len(), "set pushers");
        self.pushers.update(|current| replace(current, pushers));
    }

    /// Insert a user, or replace the one with the same ID.
    pub fn upsert_user(&self, user: User) {
        trace!(user_id = %user.user_id, "upsert user");
        self.users.update(|table| upsert(&mut table.users, user, |a, b| a.user_id == b.user_id));
    }

    /// Add a user to the ignore list.
    pub fn ignore_user(&self, user_id: &str) {
        trace!(user_id, "ignore user");
        self.users.update(|table| table.ignored.insert(user_id.to_owned()));
    }

    /// Remove a user from the ignore list.
    pub fn unignore_user(&self, user_id: &str) {
        trace!(user_id, "unignore user");
        self.users.update(|table| table.ignored.remove(user_id));
    }

    /// Replace the verified third-party identifiers.
    pub fn set_three_pids(&self, three_pids: Vec<ThreePid>) {
        trace!(count = three_pids.len(), "set three pids");
        self.three_pids.update(|current| replace(current, three_pids));
    }

    /// Replace the identifiers awaiting validation.
    pub fn set_pending_three_pids(&self, three_pids: Vec<ThreePid>) {
        trace!(count = three_pids.len(), "set pending three pids");
        self.pending_three_pids.update(|current| replace(current, three_pids));
    }

    /// Replace the devices of the local account.
    pub fn set_my_devices(&self, devices: Vec<DeviceInfo>) {
        trace!(count = devices.len(), "set my devices");
        self.my_devices.update(|current| replace(current, devices));
    }

    /// Replace the crypto devices of a user.
    pub fn set_crypto_devices(&self, user_id: &str, devices: Vec<CryptoDeviceInfo>) {
        trace!(user_id, count = devices.len(), "set crypto devices");
        self.crypto_devices.update(|all| {
            if all.get(user_id) == Some(&devices) {
                return false;
            }
            all.insert(user_id.to_owned(), devices);
            true
        });
    }

    /// Store the public cross-signing identity of `info.user_id`.
    pub fn set_cross_signing_info(&self, info: CrossSigningInfo) {
        trace!(user_id = %info.user_id, "set cross-signing info");
        self.cross_signing.update(|all| {
            if all.get(&info.user_id) == Some(&info) {
                return false;
            }
            all.insert(info.user_id.clone(), info);
            true
        });
    }

    /// Set or clear the private cross-signing keys.
    pub fn set_cross_signing_private_keys(&self, keys: Option<PrivateKeysInfo>) {
        trace!(known = keys.is_some(), "set private cross-signing keys");
        self.private_keys.update(|current| replace(current, keys));
    }

    /// Store a user-scoped account data event, replacing the one of the same
    /// type.
    pub fn put_user_account_data(&self, event: UserAccountDataEvent) {
        trace!(event_type = %event.event_type, "put user account data");
        self.user_account_data
            .update(|events| upsert(events, event, |a, b| a.event_type == b.event_type));
    }

    /// Store a room-scoped account data event, replacing the one of the same
    /// room and type.
    pub fn put_room_account_data(&self, event: RoomAccountDataEvent) {
        trace!(room_id = %event.room_id, event_type = %event.event_type, "put room account data");
        self.room_account_data.update(|events| {
            upsert(events, event, |a, b| a.room_id == b.room_id && a.event_type == b.event_type)
        });
    }

    /// Insert a widget, or replace the one with the same room and widget ID.
    pub fn upsert_widget(&self, widget: Widget) {
        trace!(room_id = %widget.room_id, widget_id = %widget.widget_id, "upsert widget");
        self.widgets.update(|widgets| {
            upsert(widgets, widget, |a, b| a.room_id == b.room_id && a.widget_id == b.widget_id)
        });
    }
}

impl RoomService for MemorySession {
    fn room_summaries(&self, params: &RoomSummaryQueryParams) -> SessionResult<Vec<RoomSummary>> {
        self.read("room_summaries", || self.rooms.with(|table| table.summaries(params)))
    }

    fn room_summaries_live(&self, params: RoomSummaryQueryParams) -> LiveHandle<Vec<RoomSummary>> {
        self.watch(&self.rooms, move |table| table.summaries(&params))
    }

    fn breadcrumbs(&self, params: &RoomSummaryQueryParams) -> SessionResult<Vec<RoomSummary>> {
        self.read("breadcrumbs", || self.rooms.with(|table| table.breadcrumbs(params)))
    }

    fn breadcrumbs_live(&self, params: RoomSummaryQueryParams) -> LiveHandle<Vec<RoomSummary>> {
        self.watch(&self.rooms, move |table| table.breadcrumbs(&params))
    }

    fn room_member(
        &self,
        user_id: &str,
        room_id: &str,
    ) -> SessionResult<Option<RoomMemberSummary>> {
        self.read("room_member", || {
            self.members.with(|members| find_member(members, user_id, room_id))
        })
    }

    fn room_member_live(
        &self,
        user_id: String,
        room_id: String,
    ) -> LiveHandle<Option<RoomMemberSummary>> {
        self.watch(&self.members, move |members| find_member(members, &user_id, &room_id))
    }

    fn change_memberships_live(&self) -> LiveHandle<BTreeMap<String, ChangeMembershipState>> {
        self.watch(&self.change_memberships, Clone::clone)
    }
}

fn find_member(
    members: &[RoomMemberSummary],
    user_id: &str,
    room_id: &str,
) -> Option<RoomMemberSummary> {
    members.iter().find(|m| m.user_id == user_id && m.room_id == room_id).cloned()
}

impl GroupService for MemorySession {
    fn group_summaries(
        &self,
        params: &GroupSummaryQueryParams,
    ) -> SessionResult<Vec<GroupSummary>> {
        self.read("group_summaries", || {
            self.groups.with(|groups| {
                groups.iter().filter(|g| params.matches(g)).cloned().collect()
            })
        })
    }

    fn group_summaries_live(
        &self,
        params: GroupSummaryQueryParams,
    ) -> LiveHandle<Vec<GroupSummary>> {
        self.watch(&self.groups, move |groups| {
            groups.iter().filter(|g| params.matches(g)).cloned().collect()
        })
    }
}

impl SpaceService for MemorySession {
    fn space_summaries(&self, params: &SpaceSummaryQueryParams) -> SessionResult<Vec<RoomSummary>> {
        self.read("space_summaries", || self.rooms.with(|table| table.summaries(params)))
    }

    fn space_summaries_live(
        &self,
        params: SpaceSummaryQueryParams,
    ) -> LiveHandle<Vec<RoomSummary>> {
        self.watch(&self.rooms, move |table| table.summaries(&params))
    }
}

impl SyncStatusService for MemorySession {
    fn sync_state_live(&self) -> LiveHandle<SyncState> {
        self.watch(&self.sync_state, Clone::clone)
    }
}

impl PushersService for MemorySession {
    fn pushers_live(&self) -> LiveHandle<Vec<Pusher>> {
        self.watch(&self.pushers, Clone::clone)
    }
}

impl UserService for MemorySession {
    fn user(&self, user_id: &str) -> SessionResult<Option<User>> {
        self.read("user", || {
            self.users.with(|table| table.users.iter().find(|u| u.user_id == user_id).cloned())
        })
    }

    fn user_live(&self, user_id: String) -> LiveHandle<Option<User>> {
        self.watch(&self.users, move |table| {
            table.users.iter().find(|u| u.user_id == user_id).cloned()
        })
    }

    fn users_live(&self) -> LiveHandle<Vec<User>> {
        self.watch(&self.users, |table| table.users.clone())
    }

    fn ignored_users_live(&self) -> LiveHandle<Vec<User>> {
        self.watch(&self.users, UserTable::ignored_users)
    }

    fn paged_users_live(&self, query: UserPageQuery) -> LiveHandle<Vec<User>> {
        let page_size = self.config.page_size;
        self.watch(&self.users, move |table| {
            table.users.iter().filter(|u| query.matches(u)).take(page_size).cloned().collect()
        })
    }
}

impl ThreePidService for MemorySession {
    fn three_pids(&self) -> SessionResult<Vec<ThreePid>> {
        self.read("three_pids", || self.three_pids.get())
    }

    fn three_pids_live(&self, refresh_data: bool) -> LiveHandle<Vec<ThreePid>> {
        if refresh_data {
            trace!("three pid refresh requested");
            self.three_pid_refreshes.fetch_add(1, Ordering::SeqCst);
        }
        self.watch(&self.three_pids, Clone::clone)
    }

    fn pending_three_pids(&self) -> SessionResult<Vec<ThreePid>> {
        self.read("pending_three_pids", || self.pending_three_pids.get())
    }

    fn pending_three_pids_live(&self) -> LiveHandle<Vec<ThreePid>> {
        self.watch(&self.pending_three_pids, Clone::clone)
    }
}

impl CryptoService for MemorySession {
    fn my_devices_info(&self) -> SessionResult<Vec<DeviceInfo>> {
        self.read("my_devices_info", || self.my_devices.get())
    }

    fn my_devices_info_live(&self) -> LiveHandle<Vec<DeviceInfo>> {
        self.watch(&self.my_devices, Clone::clone)
    }

    fn crypto_device_info(&self, user_id: &str) -> SessionResult<Vec<CryptoDeviceInfo>> {
        self.read("crypto_device_info", || {
            self.crypto_devices.with(|all| all.get(user_id).cloned().unwrap_or_default())
        })
    }

    fn crypto_device_info_live(&self, user_id: String) -> LiveHandle<Vec<CryptoDeviceInfo>> {
        self.watch(&self.crypto_devices, move |all| {
            all.get(&user_id).cloned().unwrap_or_default()
        })
    }

    fn user_cross_signing_keys(&self, user_id: &str) -> SessionResult<Option<CrossSigningInfo>> {
        self.read("user_cross_signing_keys", || {
            self.cross_signing.with(|all| all.get(user_id).cloned())
        })
    }

    fn cross_signing_keys_live(&self, user_id: String) -> LiveHandle<Option<CrossSigningInfo>> {
        self.watch(&self.cross_signing, move |all| all.get(&user_id).cloned())
    }

    fn cross_signing_private_keys(&self) -> SessionResult<Option<PrivateKeysInfo>> {
        self.read("cross_signing_private_keys", || self.private_keys.get())
    }

    fn cross_signing_private_keys_live(&self) -> LiveHandle<Option<PrivateKeysInfo>> {
        self.watch(&self.private_keys, Clone::clone)
    }
}

impl AccountDataService for MemorySession {
    fn user_account_data_events(
        &self,
        types: &BTreeSet<String>,
    ) -> SessionResult<Vec<UserAccountDataEvent>> {
        self.read("user_account_data_events", || {
            self.user_account_data.with(|events| user_events_of(events, types))
        })
    }

    fn user_account_data_events_live(
        &self,
        types: BTreeSet<String>,
    ) -> LiveHandle<Vec<UserAccountDataEvent>> {
        self.watch(&self.user_account_data, move |events| user_events_of(events, &types))
    }

    fn room_account_data_events(
        &self,
        types: &BTreeSet<String>,
    ) -> SessionResult<Vec<RoomAccountDataEvent>> {
        self.read("room_account_data_events", || {
            self.room_account_data.with(|events| room_events_of(events, types))
        })
    }

    fn room_account_data_events_live(
        &self,
        types: BTreeSet<String>,
    ) -> LiveHandle<Vec<RoomAccountDataEvent>> {
        self.watch(&self.room_account_data, move |events| room_events_of(events, &types))
    }
}

fn user_events_of(
    events: &[UserAccountDataEvent],
    types: &BTreeSet<String>,
) -> Vec<UserAccountDataEvent> {
    events.iter().filter(|e| accepts_event_type(types, &e.event_type)).cloned().collect()
}

fn room_events_of(
    events: &[RoomAccountDataEvent],
    types: &BTreeSet<String>,
) -> Vec<RoomAccountDataEvent> {
    events.iter().filter(|e| accepts_event_type(types, &e.event_type)).cloned().collect()
}

impl WidgetService for MemorySession {
    fn room_widgets(&self, query: &WidgetQuery) -> SessionResult<Vec<Widget>> {
        self.read("room_widgets", || {
            self.widgets.with(|widgets| {
                widgets.iter().filter(|w| query.matches(w)).cloned().collect()
            })
        })
    }

    fn room_widgets_live(&self, query: WidgetQuery) -> LiveHandle<Vec<Widget>> {
        self.watch(&self.widgets, move |widgets| {
            widgets.iter().filter(|w| query.matches(w)).cloned().collect()
        })
    }
}

//! Flow session tests against the memory session.
//!
//! Every query kind is checked for its first emission (snapshot, or the live
//! handle's first value for pass-through kinds) and for forwarding later
//! changes. Most tests use a session whose live handles emit changes only, so
//! the snapshot is the sole initial value.

#![allow(clippy::unwrap_used)]

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Debug,
    sync::Arc,
};

use ciborium::Value;
use futures::{FutureExt, StreamExt};
use rivulet_core::{
    GroupSummaryQueryParams, QueryStringValue, RoomSummaryQueryParams, Session, SessionError,
};
use rivulet_flow::{Flow, FlowConfig, FlowSession, QueryKind, SessionFlowExt};
use rivulet_harness::{MemorySession, MemorySessionConfig};
use rivulet_proto::{
    ChangeMembershipState, CrossSigningInfo, CrossSigningKeyInfo, CryptoDeviceInfo, DeviceInfo,
    DeviceTrustLevel, GroupSummary, KeyUsage, Membership, PrivateKeysInfo, Pusher, PusherState,
    RoomAccountDataEvent, RoomMemberSummary, RoomSummary, SyncState, ThreePid, User,
    UserAccountDataEvent, Widget,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn changes_only() -> Arc<MemorySession> {
    Arc::new(MemorySession::with_config(MemorySessionConfig {
        replay_on_subscribe: false,
        ..MemorySessionConfig::default()
    }))
}

async fn assert_snapshot_then_update<T, F>(mut flow: Flow<T>, snapshot: T, mutate: F, updated: T)
where
    T: PartialEq + Debug,
    F: FnOnce(),
{
    assert_eq!(flow.next().await, Some(Ok(snapshot)));
    assert!(flow.next().now_or_never().is_none(), "nothing before the first change");

    mutate();
    assert_eq!(flow.next().await, Some(Ok(updated)));
}

async fn assert_fails_first<T: Debug>(flow: Flow<T>, expected: &SessionError) {
    let items: Vec<_> = flow.collect().await;
    assert!(matches!(items.as_slice(), [Err(err)] if err == expected), "got {items:?}");
}

fn device(device_id: &str) -> DeviceInfo {
    DeviceInfo {
        device_id: device_id.to_string(),
        user_id: "@alice:example.org".to_string(),
        display_name: None,
        last_seen_ts: None,
        last_seen_ip: None,
    }
}

fn crypto_device(device_id: &str) -> CryptoDeviceInfo {
    CryptoDeviceInfo {
        device_id: device_id.to_string(),
        user_id: "@bob:example.org".to_string(),
        algorithms: vec!["m.megolm.v1.aes-sha2".to_string()],
        keys: BTreeMap::new(),
        trust_level: DeviceTrustLevel::default(),
        is_blocked: false,
    }
}

fn cross_signing(trusted: bool) -> CrossSigningInfo {
    CrossSigningInfo {
        user_id: "@bob:example.org".to_string(),
        keys: vec![CrossSigningKeyInfo {
            user_id: "@bob:example.org".to_string(),
            usage: KeyUsage::Master,
            public_key: "bob-master".to_string(),
            trusted,
        }],
        is_trusted: trusted,
    }
}

fn pusher(push_key: &str) -> Pusher {
    Pusher {
        push_key: push_key.to_string(),
        kind: "http".to_string(),
        app_id: "org.example.app".to_string(),
        app_display_name: "Example".to_string(),
        device_display_name: "Phone".to_string(),
        lang: "en".to_string(),
        data_url: Some("https://push.example.org/_matrix/push/v1/notify".to_string()),
        state: PusherState::Registered,
    }
}

fn widget(widget_id: &str, widget_type: &str) -> Widget {
    Widget {
        widget_id: widget_id.to_string(),
        room_id: "!room:example.org".to_string(),
        widget_type: widget_type.to_string(),
        name: None,
        url: "https://widgets.example.org".to_string(),
        sender: "@alice:example.org".to_string(),
        is_active: true,
    }
}

fn user_event(event_type: &str, content: &str) -> UserAccountDataEvent {
    UserAccountDataEvent {
        event_type: event_type.to_string(),
        content: ciborium_text(content),
    }
}

fn room_event(room_id: &str, event_type: &str) -> RoomAccountDataEvent {
    RoomAccountDataEvent {
        room_id: room_id.to_string(),
        event_type: event_type.to_string(),
        content: ciborium_text("{}"),
    }
}

fn ciborium_text(text: &str) -> Value {
    Value::Text(text.to_string())
}

#[tokio::test]
async fn room_summaries_snapshot_then_live_change() {
    init_tracing();
    let session = changes_only();
    let r1 = RoomSummary::new("!r1:example.org");
    let r2 = RoomSummary::new("!r2:example.org");
    session.upsert_room(r1.clone());

    let mut flow = session.flow().live_room_summaries(RoomSummaryQueryParams::all());

    assert_eq!(flow.next().await, Some(Ok(vec![r1.clone()])));
    session.upsert_room(r2.clone());
    assert_eq!(flow.next().await, Some(Ok(vec![r1, r2])));
    assert!(flow.next().now_or_never().is_none());
}

#[tokio::test]
async fn replaying_live_handle_repeats_the_snapshot() {
    let session = Arc::new(MemorySession::new());
    let r1 = RoomSummary::new("!r1:example.org");
    session.upsert_room(r1.clone());

    let mut flow = session.flow().live_room_summaries(RoomSummaryQueryParams::all());

    assert_eq!(flow.next().await, Some(Ok(vec![r1.clone()])));
    assert_eq!(flow.next().await, Some(Ok(vec![r1])));
    assert!(flow.next().now_or_never().is_none());
}

#[tokio::test]
async fn group_summaries() {
    let session = changes_only();
    let joined = GroupSummary {
        group_id: "+a:example.org".to_string(),
        membership: Membership::Join,
        ..GroupSummary::default()
    };
    let invited = GroupSummary {
        group_id: "+b:example.org".to_string(),
        membership: Membership::Invite,
        ..GroupSummary::default()
    };
    session.upsert_group(joined.clone());

    let params = GroupSummaryQueryParams::default().with_memberships([Membership::Join]);
    let flow = session.flow().live_group_summaries(params);

    let updated = GroupSummary { display_name: "A".to_string(), ..joined.clone() };
    let mutated = updated.clone();
    assert_snapshot_then_update(
        flow,
        vec![joined],
        || {
            session.upsert_group(invited);
            session.upsert_group(mutated);
        },
        vec![updated],
    )
    .await;
}

#[tokio::test]
async fn space_summaries_exclude_rooms() {
    let session = changes_only();
    let space = RoomSummary::new("!s:example.org").into_space();
    session.upsert_room(RoomSummary::new("!r:example.org"));
    session.upsert_room(space.clone());

    let flow = session.flow().live_space_summaries(RoomSummaryQueryParams::spaces());
    let second = RoomSummary::new("!t:example.org").into_space();

    assert_snapshot_then_update(
        flow,
        vec![space.clone()],
        || session.upsert_room(second.clone()),
        vec![space, second.clone()],
    )
    .await;
}

#[tokio::test]
async fn breadcrumbs_most_recent_first() {
    let session = changes_only();
    let a = RoomSummary::new("!a:example.org");
    let b = RoomSummary::new("!b:example.org");
    session.upsert_room(a.clone());
    session.upsert_room(b.clone());
    session.visit_room("!a:example.org");

    let flow = session.flow().live_breadcrumbs(RoomSummaryQueryParams::all());

    assert_snapshot_then_update(
        flow,
        vec![a.clone()],
        || {
            session.visit_room("!b:example.org");
        },
        vec![b, a],
    )
    .await;
}

#[tokio::test]
async fn my_devices_info() {
    let session = changes_only();
    session.set_my_devices(vec![device("PHONE")]);

    let flow = session.flow().live_my_devices_info();

    assert_snapshot_then_update(
        flow,
        vec![device("PHONE")],
        || session.set_my_devices(vec![device("PHONE"), device("LAPTOP")]),
        vec![device("PHONE"), device("LAPTOP")],
    )
    .await;
}

#[tokio::test]
async fn user_is_none_until_known() {
    let session = changes_only();
    let flow = session.flow().live_user("@bob:example.org");
    let bob = User::new("@bob:example.org").with_display_name("Bob");

    assert_snapshot_then_update(
        flow,
        None,
        || session.upsert_user(bob.clone()),
        Some(bob.clone()),
    )
    .await;
}

#[tokio::test]
async fn room_member() {
    let session = changes_only();
    let member = RoomMemberSummary {
        room_id: "!room:example.org".to_string(),
        user_id: "@bob:example.org".to_string(),
        display_name: None,
        avatar_url: None,
        membership: Membership::Invite,
    };
    session.upsert_member(member.clone());

    let flow = session.flow().live_room_member("@bob:example.org", "!room:example.org");
    let joined = RoomMemberSummary { membership: Membership::Join, ..member.clone() };

    assert_snapshot_then_update(
        flow,
        Some(member),
        || session.upsert_member(joined.clone()),
        Some(joined.clone()),
    )
    .await;
}

#[tokio::test]
async fn three_pids_forward_refresh_flag() {
    let session = changes_only();
    let email = ThreePid::Email("alice@example.org".to_string());
    let phone = ThreePid::Msisdn("+15555550100".to_string());
    session.set_three_pids(vec![email.clone()]);

    let flow = session.flow().live_three_pids(true);

    assert_snapshot_then_update(
        flow,
        vec![email.clone()],
        || session.set_three_pids(vec![email.clone(), phone.clone()]),
        vec![email.clone(), phone.clone()],
    )
    .await;
    assert_eq!(session.three_pid_refreshes(), 1);

    let mut plain = session.flow().live_three_pids(false);
    plain.next().await;
    assert_eq!(session.three_pid_refreshes(), 1);
}

#[tokio::test]
async fn pending_three_pids() {
    let session = changes_only();
    let email = ThreePid::Email("alice@example.org".to_string());

    let flow = session.flow().live_pending_three_pids();

    assert_snapshot_then_update(
        flow,
        Vec::new(),
        || session.set_pending_three_pids(vec![email.clone()]),
        vec![email.clone()],
    )
    .await;
}

#[tokio::test]
async fn user_crypto_devices() {
    let session = changes_only();
    session.set_crypto_devices("@bob:example.org", vec![crypto_device("BOBPHONE")]);
    session.set_crypto_devices("@carol:example.org", vec![crypto_device("CAROL")]);

    let flow = session.flow().live_user_crypto_devices("@bob:example.org");
    let blocked = CryptoDeviceInfo { is_blocked: true, ..crypto_device("BOBPHONE") };

    assert_snapshot_then_update(
        flow,
        vec![crypto_device("BOBPHONE")],
        || session.set_crypto_devices("@bob:example.org", vec![blocked.clone()]),
        vec![blocked.clone()],
    )
    .await;
}

#[tokio::test]
async fn cross_signing_info() {
    let session = changes_only();
    let flow = session.flow().live_cross_signing_info("@bob:example.org");

    assert_snapshot_then_update(
        flow,
        None,
        || session.set_cross_signing_info(cross_signing(true)),
        Some(cross_signing(true)),
    )
    .await;
}

#[tokio::test]
async fn cross_signing_private_keys() {
    let session = changes_only();
    let partial = PrivateKeysInfo { master: Some("m".to_string()), ..PrivateKeysInfo::default() };
    session.set_cross_signing_private_keys(Some(partial.clone()));

    let flow = session.flow().live_cross_signing_private_keys();

    assert_snapshot_then_update(
        flow,
        Some(partial),
        || session.set_cross_signing_private_keys(None),
        None,
    )
    .await;
}

#[tokio::test]
async fn user_account_data_filters_types() {
    let session = changes_only();
    session.put_user_account_data(user_event("m.direct", "a"));
    session.put_user_account_data(user_event("m.push_rules", "b"));

    let types = BTreeSet::from(["m.direct".to_string()]);
    let flow = session.flow().live_user_account_data(types);

    assert_snapshot_then_update(
        flow,
        vec![user_event("m.direct", "a")],
        || session.put_user_account_data(user_event("m.direct", "c")),
        vec![user_event("m.direct", "c")],
    )
    .await;
}

#[tokio::test]
async fn room_account_data_empty_filter_selects_all() {
    let session = changes_only();
    session.put_room_account_data(room_event("!a:example.org", "m.tag"));

    let flow = session.flow().live_room_account_data(BTreeSet::new());

    assert_snapshot_then_update(
        flow,
        vec![room_event("!a:example.org", "m.tag")],
        || session.put_room_account_data(room_event("!b:example.org", "m.fully_read")),
        vec![room_event("!a:example.org", "m.tag"), room_event("!b:example.org", "m.fully_read")],
    )
    .await;
}

#[tokio::test]
async fn room_widgets_respect_type_filters() {
    let session = changes_only();
    session.upsert_widget(widget("jitsi1", "jitsi"));
    session.upsert_widget(widget("pad", "m.etherpad"));

    let flow = session.flow().live_room_widgets(
        "!room:example.org",
        QueryStringValue::NoCondition,
        None,
        Some(BTreeSet::from(["m.etherpad".to_string()])),
    );
    let removed = Widget { is_active: false, ..widget("jitsi1", "jitsi") };

    assert_snapshot_then_update(
        flow,
        vec![widget("jitsi1", "jitsi")],
        || session.upsert_widget(removed.clone()),
        Vec::new(),
    )
    .await;
}

#[tokio::test]
async fn pass_through_kinds_start_with_live_value() {
    let session = Arc::new(MemorySession::new());
    session.set_sync_state(SyncState::Running { after_pause: false });
    session.set_pushers(vec![pusher("token")]);
    session.upsert_user(User::new("@bob:example.org"));
    session.ignore_user("@mallory:example.org");
    session.set_change_membership("!room:example.org", ChangeMembershipState::Joining);
    let flow = session.flow();

    assert_eq!(
        flow.live_sync_state().next().await,
        Some(Ok(SyncState::Running { after_pause: false }))
    );
    assert_eq!(flow.live_pushers().next().await, Some(Ok(vec![pusher("token")])));
    assert_eq!(flow.live_users().next().await, Some(Ok(vec![User::new("@bob:example.org")])));
    assert_eq!(
        flow.live_ignored_users().next().await,
        Some(Ok(vec![User::new("@mallory:example.org")]))
    );
    assert_eq!(
        flow.live_paged_users(None, None).next().await,
        Some(Ok(vec![User::new("@bob:example.org")]))
    );
    assert_eq!(
        flow.live_room_change_membership_state().next().await,
        Some(Ok(BTreeMap::from([(
            "!room:example.org".to_string(),
            ChangeMembershipState::Joining
        )])))
    );

    assert_eq!(session.snapshot_reads(), 0);
}

#[tokio::test]
async fn pass_through_waits_for_first_live_value() {
    let session = changes_only();
    let mut flow = session.flow().live_sync_state();

    assert!(flow.next().now_or_never().is_none());

    session.set_sync_state(SyncState::InitialSync);
    assert_eq!(flow.next().await, Some(Ok(SyncState::InitialSync)));
}

#[tokio::test]
async fn pass_through_ignores_closed_session() {
    let session = Arc::new(MemorySession::new());
    session.close();

    let mut flow = session.flow().live_pushers();
    assert_eq!(flow.next().await, Some(Ok(Vec::new())));
}

#[tokio::test]
async fn paged_users_apply_filter_exclusions_and_page_size() {
    let session = Arc::new(MemorySession::with_config(MemorySessionConfig {
        page_size: 2,
        ..MemorySessionConfig::default()
    }));
    for name in ["alice", "alina", "albert", "bob"] {
        session.upsert_user(User::new(format!("@{name}:example.org")));
    }

    let excluded = BTreeSet::from(["@alina:example.org".to_string()]);
    let mut flow = session.flow().live_paged_users(Some("AL".to_string()), Some(excluded));

    assert_eq!(
        flow.next().await,
        Some(Ok(vec![User::new("@alice:example.org"), User::new("@albert:example.org")]))
    );
}

#[tokio::test]
async fn failing_snapshot_ends_every_snapshot_kind() {
    let session = Arc::new(MemorySession::new());
    session.upsert_room(RoomSummary::new("!r:example.org"));
    let err = SessionError::StoreUnavailable { reason: "database locked".to_string() };
    session.fail_snapshots(Some(err.clone()));
    let flow = session.flow();

    assert_fails_first(flow.live_room_summaries(RoomSummaryQueryParams::all()), &err).await;
    assert_fails_first(flow.live_group_summaries(GroupSummaryQueryParams::default()), &err)
        .await;
    assert_fails_first(flow.live_space_summaries(RoomSummaryQueryParams::spaces()), &err).await;
    assert_fails_first(flow.live_breadcrumbs(RoomSummaryQueryParams::all()), &err).await;
    assert_fails_first(flow.live_my_devices_info(), &err).await;
    assert_fails_first(flow.live_user("@bob:example.org"), &err).await;
    assert_fails_first(flow.live_room_member("@bob:example.org", "!r:example.org"), &err).await;
    assert_fails_first(flow.live_three_pids(false), &err).await;
    assert_fails_first(flow.live_pending_three_pids(), &err).await;
    assert_fails_first(flow.live_user_crypto_devices("@bob:example.org"), &err).await;
    assert_fails_first(flow.live_cross_signing_info("@bob:example.org"), &err).await;
    assert_fails_first(flow.live_cross_signing_private_keys(), &err).await;
    assert_fails_first(flow.live_user_account_data(BTreeSet::new()), &err).await;
    assert_fails_first(flow.live_room_account_data(BTreeSet::new()), &err).await;
    assert_fails_first(
        flow.live_room_widgets("!r:example.org", QueryStringValue::NoCondition, None, None),
        &err,
    )
    .await;

    assert_eq!(session.room_observers(), 0, "failed flows release their live handles");
}

#[tokio::test]
async fn closed_session_fails_snapshot_reads() {
    let session = Arc::new(MemorySession::new());
    session.close();

    assert_fails_first(session.flow().live_my_devices_info(), &SessionError::Closed).await;
}

#[tokio::test]
async fn each_subscription_reads_a_snapshot() {
    let session = Arc::new(MemorySession::new());
    let flow = session.flow();

    let mut first = flow.live_room_summaries(RoomSummaryQueryParams::all());
    let mut second = flow.live_room_summaries(RoomSummaryQueryParams::all());
    assert_eq!(session.snapshot_reads(), 0, "flows are lazy");

    first.next().await;
    second.next().await;
    assert_eq!(session.snapshot_reads(), 2);
    assert_eq!(session.room_observers(), 2);
}

#[tokio::test]
async fn dropping_flow_releases_live_handle() {
    let session = Arc::new(MemorySession::new());
    let mut flow = session.flow().live_breadcrumbs(RoomSummaryQueryParams::all());

    flow.next().await;
    assert_eq!(session.room_observers(), 1);

    drop(flow);
    assert_eq!(session.room_observers(), 0);
}

#[tokio::test]
async fn skipped_snapshot_runs_as_pass_through() {
    let session = changes_only();
    session.upsert_room(RoomSummary::new("!r1:example.org"));
    let config = FlowConfig::default().skipping_snapshot(QueryKind::RoomSummaries);
    let flow = FlowSession::with_config(Arc::clone(&session), config);

    let mut rooms = flow.live_room_summaries(RoomSummaryQueryParams::all());
    assert!(rooms.next().now_or_never().is_none());
    assert_eq!(session.snapshot_reads(), 0);

    session.upsert_room(RoomSummary::new("!r2:example.org"));
    let items = rooms.next().await.unwrap().unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn works_over_a_session_trait_object() {
    let memory = Arc::new(MemorySession::new());
    memory.upsert_room(RoomSummary::new("!r:example.org"));
    let session: Arc<dyn Session> = memory;

    let mut flow = session.flow().live_room_summaries(RoomSummaryQueryParams::all());
    assert_eq!(flow.next().await, Some(Ok(vec![RoomSummary::new("!r:example.org")])));
}

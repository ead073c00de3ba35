//! Rivulet value types
//!
//! Plain data returned by the session's live queries. Nothing in this crate
//! knows how the values are stored or refreshed; the session produces them and
//! the flow layer forwards them unchanged.
//!
//! # Modules
//!
//! - [`room`]: Room summaries, memberships and pending membership changes
//! - [`group`]: Group (community) summaries
//! - [`user`]: Users and third-party identifiers
//! - [`crypto`]: Device lists and cross-signing material
//! - [`sync`]: Sync loop state
//! - [`pusher`]: Push gateway registrations
//! - [`account_data`]: User and room scoped account data events
//! - [`widget`]: Room widgets

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account_data;
pub mod crypto;
pub mod group;
pub mod pusher;
pub mod room;
pub mod sync;
pub mod user;
pub mod widget;

pub use account_data::{RoomAccountDataEvent, UserAccountDataEvent};
pub use crypto::{
    CrossSigningInfo, CrossSigningKeyInfo, CryptoDeviceInfo, DeviceInfo, DeviceTrustLevel,
    KeyUsage, PrivateKeysInfo,
};
pub use group::GroupSummary;
pub use pusher::{Pusher, PusherState};
pub use room::{
    ChangeMembershipState, Membership, ParseMembershipError, RoomMemberSummary, RoomSummary,
    RoomType,
};
pub use sync::SyncState;
pub use user::{ThreePid, User};
pub use widget::Widget;

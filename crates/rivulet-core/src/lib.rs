//! Rivulet Core
//!
//! The contract between the flow layer and the session it wraps.
//!
//! # Components
//!
//! - [`LiveHandle`]: A subscription to a changing value. Dropping it releases
//!   the subscription.
//! - [`LiveData`]: A multicast value cell that hands out live handles
//! - [`query`]: Immutable query parameters shared by snapshot and live
//!   accessors
//! - [`session`]: One narrow capability trait per session service, gathered by
//!   the [`Session`] supertrait
//! - [`SessionError`]: Failures raised by snapshot accessors

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
pub mod live;
pub mod query;
pub mod session;

pub use error::{SessionError, SessionResult};
pub use live::{LiveData, LiveHandle};
pub use query::{
    Case, GroupSummaryQueryParams, QueryStringValue, RoomSummaryQueryParams, RoomTypeFilter,
    SpaceSummaryQueryParams, UserPageQuery, WidgetQuery, accepts_event_type,
};
pub use session::{
    AccountDataService, CryptoService, GroupService, PushersService, RoomService, Session,
    SpaceService, SyncStatusService, ThreePidService, UserService, WidgetService,
};

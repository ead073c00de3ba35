//! Rivulet Flow
//!
//! Exposes a session's live queries as streams that start with a correct
//! value and then follow every change.
//!
//! # Architecture
//!
//! ```text
//! consumer ── poll ──► Flow<T>
//!                        │ first poll
//!                        ├─► live accessor      (subscribe, keep handle)
//!                        ├─► snapshot accessor  (emit once, or fail)
//!                        └─► forward live handle emissions
//! ```
//!
//! Nothing happens until the consumer polls. Dropping the stream drops the live
//! handle, which is the only teardown there is.
//!
//! # Components
//!
//! - [`LiveQuery`], [`bridge`], [`passthrough`]: The combinator
//! - [`FlowSession`]: One method per query kind over a [`Session`]
//! - [`FlowConfig`], [`QueryKind`]: Per-kind snapshot configuration
//! - [`SpaceStateHandler`], [`SpaceStateHolder`]: Current space selection
//!
//! [`Session`]: rivulet_core::Session

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bridge;
mod config;
mod flow_session;
pub mod space;

pub use bridge::{Flow, LiveQuery, bridge, passthrough};
pub use config::{FlowConfig, QueryKind};
pub use flow_session::{FlowSession, SessionFlowExt};
pub use space::{SpaceStateHandler, SpaceStateHolder};

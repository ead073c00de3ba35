//! Test support for Rivulet.
//!
//! - [`MemorySession`]: a complete in-process session backed by
//!   [`LiveData`](rivulet_core::LiveData) tables, with mutation methods and
//!   failure injection
//! - [`fakes`]: hand-written doubles with relaxed defaults and override hooks
//!
//! # Model-Based Testing
//!
//! The `model` module holds a reference implementation of the room table.
//! Operations are applied to both the model and a [`MemorySession`], and the
//! last value observed through a flow is compared with what the model
//! predicts.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fakes;
mod memory;
pub mod model;

pub use fakes::FakeSpaceStateHandler;
pub use memory::{DEFAULT_PAGE_SIZE, MemorySession, MemorySessionConfig};
pub use model::{
    ModelRoomId, ModelWorld, Operation, OperationError, OperationResult, SmallRoom,
};

//! Reference model for model-based testing.
//!
//! The model is a plain list of room summaries plus a breadcrumb list, with
//! none of the cells, observers or failure injection of [`MemorySession`].
//! It is the oracle for what a room-summary flow must show last.
//!
//! # Design Principles
//!
//! - Simplicity: The model should be obviously correct
//! - Behavior, not mechanism: Captures what a reader sees, not how it is stored
//! - Deterministic: Same inputs produce same outputs
//!
//! [`MemorySession`]: crate::MemorySession

pub mod operation;
mod world;

pub use operation::{ModelRoomId, Operation, OperationError, OperationResult, SmallRoom};
pub use world::ModelWorld;

//! The build state: everything one build pass produces.
//!
//! A [`BuildState`] bundles the dependency graph, the descriptor table, the
//! source index, the diagnostic table and the reference evidence table.
//! Every table sits behind an `Arc`; [`BuildState::branch`] derives a child
//! that shares all of them with its parent until it writes.
//!
//! [`snapshot`] freezes a state to bytes and thaws it back.

#![warn(missing_docs)]

pub mod error;
pub mod snapshot;
pub mod source_index;
pub mod state;

pub use error::SnapshotError;
pub use source_index::{SourceEntry, SourceIndex};
pub use state::{BuildState, TypeRecord};

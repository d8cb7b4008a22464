//! Dependency graph over build elements.
//!
//! Nodes live in an arena addressed by [`NodeId`] handles. Every node keeps
//! two index lists, its dependencies and its dependents, which are kept
//! symmetric by [`DependencyGraph::set_dependencies`]. Topological order is
//! computed lazily per node and cached until an edge change invalidates it.

#![warn(missing_docs)]

pub mod error;
pub mod graph;
pub mod ids;
pub mod node;

mod cycles;

pub use error::GraphError;
pub use graph::DependencyGraph;
pub use ids::NodeId;
pub use node::{ElementKey, Node, NodeKind};

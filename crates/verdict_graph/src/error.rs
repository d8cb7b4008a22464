//! Error types for graph operations.

use crate::ids::NodeId;
use crate::node::ElementKey;

/// Integrity failures of the dependency graph.
///
/// None of these are recoverable inside an incremental pass: the caller
/// abandons the pass and falls back to a full rebuild.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A handle does not refer to a live node.
    #[error("unknown graph node {0:?}")]
    UnknownNode(NodeId),

    /// A node was removed while other nodes still depend on it.
    #[error("cannot remove {key}: {count} dependents remain")]
    HasDependents {
        /// The node that was to be removed.
        key: ElementKey,
        /// Number of remaining dependents.
        count: usize,
    },

    /// A dependency cycle was found while cycles are rejected.
    #[error("dependency cycle through {0}")]
    Cycle(ElementKey),

    /// An internal invariant (edge symmetry, key index) does not hold.
    #[error("graph integrity violation: {0}")]
    IntegrityViolation(String),
}

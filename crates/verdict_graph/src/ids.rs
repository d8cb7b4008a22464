//! Opaque handle for nodes in a [`DependencyGraph`](crate::DependencyGraph).

use serde::{Deserialize, Serialize};

/// Stable index of a node inside one graph's arena.
///
/// A handle stays valid for the node's lifetime and is preserved by
/// [`copy`](crate::DependencyGraph::copy), so the same element has the same
/// `NodeId` in a branched graph. Slots of removed nodes are never reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a `NodeId` from a raw `u32` index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_as_raw_roundtrip() {
        let id = NodeId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn serde_roundtrip() {
        let id = NodeId::from_raw(7);
        let json = serde_json::to_string(&id).unwrap();
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}

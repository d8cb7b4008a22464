//! Graph nodes and the element keys they are indexed by.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use verdict_common::{NamespaceName, SourceLocation, TypeName, UnitId};

use crate::ids::NodeId;

/// Identity of a build element in the graph.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum ElementKey {
    /// A compiled unit, keyed by its unit id.
    Unit(UnitId),
    /// A type that has no compiled unit of its own in the graph.
    Type(TypeName),
    /// A namespace.
    Namespace(NamespaceName),
    /// An archive on the class path, keyed by its path.
    Archive(String),
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKey::Unit(id) => write!(f, "unit {id}"),
            ElementKey::Type(name) => write!(f, "type {name}"),
            ElementKey::Namespace(name) if name.is_default() => write!(f, "default namespace"),
            ElementKey::Namespace(name) => write!(f, "namespace {name}"),
            ElementKey::Archive(path) => write!(f, "archive {path}"),
        }
    }
}

/// Kind-specific payload of a node.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NodeKind {
    /// A unit with its own source.
    CompiledUnit {
        /// Where the unit's source lives.
        location: SourceLocation,
        /// Every type the unit produced at its last compile.
        types: BTreeSet<TypeName>,
    },
    /// A descriptor-only element without source of its own: a referenced
    /// type nobody in the graph produces, or a removed unit that is still
    /// referenced.
    TypeStandIn,
    /// A namespace.
    Namespace,
    /// An archive file.
    ArchiveFile,
}

impl NodeKind {
    /// Creates a compiled-unit payload that has not produced types yet.
    pub fn unit(location: SourceLocation) -> Self {
        NodeKind::CompiledUnit {
            location,
            types: BTreeSet::new(),
        }
    }

    /// Returns `true` for compiled units.
    pub fn is_compiled_unit(&self) -> bool {
        matches!(self, NodeKind::CompiledUnit { .. })
    }
}

/// One node of the dependency graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub(crate) key: ElementKey,
    pub(crate) kind: NodeKind,
    pub(crate) dependencies: Vec<NodeId>,
    pub(crate) dependents: Vec<NodeId>,
    /// Cached order: -1 unknown, 0 while on the ordering path, else >= 1.
    pub(crate) order: i32,
}

impl Node {
    pub(crate) fn new(key: ElementKey, kind: NodeKind) -> Self {
        Self {
            key,
            kind,
            dependencies: Vec::new(),
            dependents: Vec::new(),
            order: -1,
        }
    }

    /// Clones the payload without any edges.
    pub(crate) fn detached(&self) -> Self {
        Self {
            key: self.key.clone(),
            kind: self.kind.clone(),
            dependencies: Vec::with_capacity(self.dependencies.len()),
            dependents: Vec::with_capacity(self.dependents.len()),
            order: self.order,
        }
    }

    /// The element this node stands for.
    pub fn key(&self) -> &ElementKey {
        &self.key
    }

    /// The node's kind payload.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Nodes this node depends on.
    pub fn dependencies(&self) -> &[NodeId] {
        &self.dependencies
    }

    /// Nodes that depend on this node.
    pub fn dependents(&self) -> &[NodeId] {
        &self.dependents
    }

    /// The cached order, if it is currently known.
    pub fn cached_order(&self) -> Option<u32> {
        u32::try_from(self.order).ok().filter(|&o| o > 0)
    }

    /// The types produced by this node if it is a compiled unit.
    pub fn produced_types(&self) -> Option<&BTreeSet<TypeName>> {
        match &self.kind {
            NodeKind::CompiledUnit { types, .. } => Some(types),
            _ => None,
        }
    }
}

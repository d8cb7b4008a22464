//! Copy-on-write build state.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use verdict_common::{ContentHash, TypeName, UnitId};
use verdict_diagnostics::DiagnosticTable;
use verdict_graph::{DependencyGraph, ElementKey, NodeKind};
use verdict_structure::{Reference, TypeDescriptor, TypeLookup};

use crate::source_index::SourceIndex;

/// A recorded descriptor with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRecord {
    /// The structural descriptor, shared between states.
    pub descriptor: Arc<TypeDescriptor>,
    /// The unit that produced it.
    pub unit: UnitId,
    /// Checksum of the compiled output.
    pub checksum: ContentHash,
}

/// The result of one build pass.
///
/// Each table sits behind an `Arc`. [`branch`](Self::branch) produces a
/// child sharing every table with the parent; the first write to a table
/// through a `*_mut` accessor clones just that table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildState {
    generation: u64,
    graph: Arc<DependencyGraph>,
    descriptors: Arc<BTreeMap<TypeName, TypeRecord>>,
    sources: Arc<SourceIndex>,
    diagnostics: Arc<DiagnosticTable>,
    evidence: Arc<BTreeMap<UnitId, Vec<Reference>>>,
}

impl BuildState {
    /// Creates the empty state every full build starts from.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty state carrying `generation`, used as the base of a full
    /// build that replaces an existing state.
    pub fn with_generation(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    /// Derives a child state with the next generation number.
    pub fn branch(&self) -> BuildState {
        BuildState {
            generation: self.generation + 1,
            ..self.clone()
        }
    }

    /// Monotonic number of the pass that produced this state.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` if every table is shared with `other`.
    pub fn shares_tables_with(&self, other: &BuildState) -> bool {
        Arc::ptr_eq(&self.graph, &other.graph)
            && Arc::ptr_eq(&self.descriptors, &other.descriptors)
            && Arc::ptr_eq(&self.sources, &other.sources)
            && Arc::ptr_eq(&self.diagnostics, &other.diagnostics)
            && Arc::ptr_eq(&self.evidence, &other.evidence)
    }

    // --- graph ---

    /// The dependency graph.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Writable dependency graph, unshared on first use.
    pub fn graph_mut(&mut self) -> &mut DependencyGraph {
        Arc::make_mut(&mut self.graph)
    }

    /// Types the unit produced at its last compile, in name order.
    pub fn types_of_unit(&self, unit: &UnitId) -> Vec<TypeName> {
        match self.graph.node_by_key(&ElementKey::Unit(unit.clone())).map(|n| n.kind()) {
            Some(NodeKind::CompiledUnit { types, .. }) => types.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    // --- descriptors ---

    /// The descriptor recorded for `name`.
    pub fn descriptor(&self, name: &TypeName) -> Option<&Arc<TypeDescriptor>> {
        self.descriptors.get(name).map(|r| &r.descriptor)
    }

    /// The full record for `name`.
    pub fn record(&self, name: &TypeName) -> Option<&TypeRecord> {
        self.descriptors.get(name)
    }

    /// The descriptor table, ordered by type name.
    pub fn descriptors(&self) -> &BTreeMap<TypeName, TypeRecord> {
        &self.descriptors
    }

    /// Records a descriptor, returning the evicted record.
    pub fn insert_descriptor(&mut self, name: TypeName, record: TypeRecord) -> Option<TypeRecord> {
        Arc::make_mut(&mut self.descriptors).insert(name, record)
    }

    /// Drops the descriptor of `name`.
    pub fn remove_descriptor(&mut self, name: &TypeName) -> Option<TypeRecord> {
        if !self.descriptors.contains_key(name) {
            return None;
        }
        Arc::make_mut(&mut self.descriptors).remove(name)
    }

    // --- sources ---

    /// The source index.
    pub fn sources(&self) -> &SourceIndex {
        &self.sources
    }

    /// Writable source index.
    pub fn sources_mut(&mut self) -> &mut SourceIndex {
        Arc::make_mut(&mut self.sources)
    }

    // --- diagnostics ---

    /// The diagnostic table.
    pub fn diagnostics(&self) -> &DiagnosticTable {
        &self.diagnostics
    }

    /// Writable diagnostic table.
    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticTable {
        Arc::make_mut(&mut self.diagnostics)
    }

    // --- evidence ---

    /// Evidence recorded for `unit`, if any.
    pub fn evidence(&self, unit: &UnitId) -> Option<&[Reference]> {
        self.evidence.get(unit).map(Vec::as_slice)
    }

    /// Replaces the evidence of `unit` wholesale.
    pub fn set_evidence(&mut self, unit: UnitId, evidence: Vec<Reference>) {
        Arc::make_mut(&mut self.evidence).insert(unit, evidence);
    }

    /// Drops the evidence of `unit`, so the next trial convicts it.
    pub fn remove_evidence(&mut self, unit: &UnitId) -> Option<Vec<Reference>> {
        if !self.evidence.contains_key(unit) {
            return None;
        }
        Arc::make_mut(&mut self.evidence).remove(unit)
    }
}

impl TypeLookup for BuildState {
    fn lookup(&self, name: &TypeName) -> Option<&TypeDescriptor> {
        self.descriptor(name).map(|d| d.as_ref())
    }
}

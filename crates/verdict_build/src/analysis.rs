//! Change analysis: the steps before the first compile round.
//!
//! Builds the new source index, indicts dependents of namespaces that
//! appeared or disappeared, retires removed units and seeds the work queue.

use std::collections::BTreeSet;

use tracing::debug;
use verdict_common::{ContentHash, NamespaceName, TypeName, UnitId};
use verdict_graph::{ElementKey, NodeKind};
use verdict_state::SourceEntry;
use verdict_structure::IndictmentSet;

use crate::error::BuildError;
use crate::phase::Phase;
use crate::session::BuildSession;

/// Namespaces touched by a change set, classified against the old index.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct NamespaceDelta {
    pub added: BTreeSet<NamespaceName>,
    pub removed: BTreeSet<NamespaceName>,
    pub changed: BTreeSet<NamespaceName>,
}

/// Applies the change set to the source index and classifies namespaces.
pub(crate) fn compute_package_delta(session: &mut BuildSession<'_>) -> NamespaceDelta {
    session.enter(Phase::ComputePackageDelta);
    let changes = session.changes;

    for location in &changes.removed {
        if session.state.sources().contains(location) {
            session.state.sources_mut().remove(location);
            session.removed.insert(location.unit_id());
        }
    }
    for change in changes.added.iter().chain(&changes.changed) {
        let previous = session.state.sources().get(&change.location).map(|e| e.content_hash);
        let content_hash = match (&change.content, previous) {
            (Some(content), _) => ContentHash::from_str_content(content),
            (None, Some(hash)) => hash,
            (None, None) => ContentHash::empty(),
        };
        session.state.sources_mut().insert(SourceEntry {
            location: change.location.clone(),
            content_hash,
        });
        // A source removed and re-added in one change set is a change.
        session.removed.remove(&change.location.unit_id());
    }

    let mut delta = NamespaceDelta::default();
    for namespace in changes.touched_namespaces() {
        let before = session.old.sources().has_namespace(&namespace);
        let after = session.state.sources().has_namespace(&namespace);
        match (before, after) {
            (false, true) => delta.added.insert(namespace),
            (true, false) => delta.removed.insert(namespace),
            (true, true) => delta.changed.insert(namespace),
            (false, false) => false,
        };
    }
    debug!(
        added = delta.added.len(),
        removed = delta.removed.len(),
        changed = delta.changed.len(),
        "namespace delta"
    );
    delta
}

/// Queues dependents of added and removed namespaces, units whose simple
/// name collides with such a namespace, and dependents of changed archives.
pub(crate) fn compute_namespace_indictments(
    session: &mut BuildSession<'_>,
    delta: &NamespaceDelta,
) {
    session.enter(Phase::ComputeNamespaceIndictments);

    for namespace in delta.added.iter().chain(&delta.removed) {
        let dependents = session.dependents_of(&ElementKey::Namespace(namespace.clone()));
        session.enqueue_nodes(&dependents);

        let colliding: Vec<UnitId> = session
            .state
            .graph()
            .iter()
            .filter_map(|(_, node)| match (node.key(), node.kind()) {
                (ElementKey::Unit(unit), NodeKind::CompiledUnit { types, .. })
                    if collides(namespace, unit, types) =>
                {
                    Some(unit.clone())
                }
                _ => None,
            })
            .collect();
        for unit in &colliding {
            debug!(unit = %unit, namespace = %namespace, "name collides with namespace");
            session.enqueue(unit);
        }
    }

    let changes = session.changes;
    for path in &changes.archives {
        let dependents = session.dependents_of(&ElementKey::Archive(path.clone()));
        debug!(archive = %path, dependents = dependents.len(), "archive changed");
        session.enqueue_nodes(&dependents);
    }
}

/// A unit's name collides with a namespace when its simple name equals the
/// namespace's first or last segment, or one of its types is named exactly
/// like the namespace.
fn collides(namespace: &NamespaceName, unit: &UnitId, types: &BTreeSet<TypeName>) -> bool {
    if namespace.is_default() {
        return false;
    }
    let simple = unit.simple_name();
    simple == namespace.first_segment()
        || simple == namespace.last_segment()
        || types.iter().any(|t| t.as_str() == namespace.as_str())
}

/// Retires removed units and seeds the queue with added and changed ones.
pub(crate) fn compute_class_delta(session: &mut BuildSession<'_>) -> Result<(), BuildError> {
    session.enter(Phase::ComputeClassDelta);

    let removed: Vec<UnitId> = session.removed.iter().cloned().collect();
    for unit in &removed {
        retire_unit(session, unit)?;
    }

    let changes = session.changes;
    for change in changes.added.iter().chain(&changes.changed) {
        let location = &change.location;
        let unit = location.unit_id();
        let graph = session.state.graph_mut();
        let id = graph.add_node(ElementKey::Unit(unit.clone()), NodeKind::unit(location.clone()));
        let is_unit = graph.node(id).is_some_and(|n| n.kind().is_compiled_unit());
        if !is_unit {
            graph.set_kind(id, NodeKind::unit(location.clone()))?;
        }
        session.enqueue(&unit);
    }
    debug!(queued = session.queue.len(), removed = removed.len(), "class delta");
    Ok(())
}

/// Drops a removed unit's descriptors, evidence, diagnostics and outgoing
/// edges, then tries its dependents against what disappeared.
fn retire_unit(session: &mut BuildSession<'_>, unit: &UnitId) -> Result<(), BuildError> {
    let key = ElementKey::Unit(unit.clone());
    let types = session.state.types_of_unit(unit);

    let mut indictments = IndictmentSet::new();
    for name in &types {
        let owned = session.state.record(name).is_some_and(|r| &r.unit == unit);
        if !owned {
            continue;
        }
        let old = session.state.remove_descriptor(name).map(|r| r.descriptor);
        indictments.merge(&session.comparator.compare(old.as_ref(), None));
    }
    session.state.remove_evidence(unit);
    if let Some(location) = session.unit_location(unit) {
        if !session.state.diagnostics().get(&location).is_empty() {
            session.state.diagnostics_mut().clear(&location);
        }
    }

    let Some(id) = session.state.graph().node_id(&key) else {
        return Ok(());
    };
    session.state.graph_mut().set_dependencies(id, &[])?;

    let mut targets = session.state.graph().dependents(id).to_vec();
    for name in &types {
        targets.extend(session.dependents_of(&ElementKey::Type(name.clone())));
        targets.extend(session.dependents_of(&ElementKey::Namespace(name.namespace())));
    }
    debug!(
        unit = %unit,
        types = types.len(),
        indictments = indictments.len(),
        "retiring removed unit"
    );
    session.try_targets(targets, &indictments);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(names: &[&str]) -> BTreeSet<TypeName> {
        names.iter().map(|n| TypeName::new(*n)).collect()
    }

    #[test]
    fn collision_with_namespace_segments() {
        let ns = NamespaceName::new("util.text");
        assert!(collides(&ns, &UnitId::new("app/util.java"), &types(&[])));
        assert!(collides(&ns, &UnitId::new("app/text.java"), &types(&[])));
        assert!(!collides(&ns, &UnitId::new("app/Text.java"), &types(&[])));
        assert!(collides(&ns, &UnitId::new("app/X.java"), &types(&["util.text"])));
    }

    #[test]
    fn default_namespace_never_collides() {
        let ns = NamespaceName::default_namespace();
        assert!(!collides(&ns, &UnitId::new("A.java"), &types(&[""])));
    }
}

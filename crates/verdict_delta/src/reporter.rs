//! Computing the delta between two states.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;
use verdict_common::{NamespaceName, UnitId};
use verdict_state::{BuildState, SourceEntry};

use crate::tree::{Delta, DeltaCategory, DeltaKind, NamespaceDelta};

/// Compares `old` with `new` over the namespaces in `scope`; an empty scope
/// means every namespace of either state.
///
/// Both states are only read, so namespaces are diffed in parallel.
pub fn compute_delta(old: &BuildState, new: &BuildState, scope: &[NamespaceName]) -> Delta {
    let identical = std::ptr::eq(old, new) || old.shares_tables_with(new);

    let namespaces: Vec<NamespaceName> = old
        .sources()
        .namespaces()
        .chain(new.sources().namespaces())
        .filter(|ns| scope.is_empty() || scope.contains(*ns))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let diffs: Vec<(NamespaceName, [NamespaceDelta; 3])> = namespaces
        .into_par_iter()
        .map(|ns| {
            let nodes = if identical {
                same_namespace(new, &ns)
            } else {
                diff_namespace(old, new, &ns)
            };
            (ns, nodes)
        })
        .collect();

    let mut delta = Delta::default();
    for (ns, nodes) in diffs {
        for (category, node) in DeltaCategory::ALL.into_iter().zip(nodes) {
            delta.insert(category, ns.clone(), node);
        }
    }
    debug!(changes = delta.changes().count(), identical, "computed delta");
    delta
}

fn members<'s>(
    state: &'s BuildState,
    ns: &NamespaceName,
) -> Option<&'s BTreeMap<UnitId, SourceEntry>> {
    state.sources().namespace(ns)
}

/// Every node `Same`, for a state compared with itself.
fn same_namespace(state: &BuildState, ns: &NamespaceName) -> [NamespaceDelta; 3] {
    let all_same: BTreeMap<UnitId, DeltaKind> = members(state, ns)
        .into_iter()
        .flat_map(|m| m.keys())
        .map(|unit| (unit.clone(), DeltaKind::Same))
        .collect();
    [
        NamespaceDelta::from_units(all_same.clone(), DeltaKind::Same),
        NamespaceDelta::from_units(all_same.clone(), DeltaKind::Same),
        NamespaceDelta::from_units(all_same, DeltaKind::Same),
    ]
}

fn diff_namespace(old: &BuildState, new: &BuildState, ns: &NamespaceName) -> [NamespaceDelta; 3] {
    let before = members(old, ns);
    let after = members(new, ns);
    let presence = match (before, after) {
        (None, Some(_)) => DeltaKind::Added,
        (Some(_), None) => DeltaKind::Removed,
        (Some(b), Some(a)) if b.keys().ne(a.keys()) => DeltaKind::Changed,
        _ => DeltaKind::Same,
    };

    let units: BTreeSet<&UnitId> = before
        .into_iter()
        .flat_map(|m| m.keys())
        .chain(after.into_iter().flat_map(|m| m.keys()))
        .collect();

    let mut membership = BTreeMap::new();
    let mut types = BTreeMap::new();
    let mut binaries = BTreeMap::new();
    for unit in units {
        let in_old = before.is_some_and(|m| m.contains_key(unit));
        let in_new = after.is_some_and(|m| m.contains_key(unit));
        let kind = match (in_old, in_new) {
            (false, true) => DeltaKind::Added,
            (true, false) => DeltaKind::Removed,
            _ => DeltaKind::Same,
        };
        membership.insert(unit.clone(), kind);
        if kind != DeltaKind::Same {
            types.insert(unit.clone(), kind);
            continue;
        }
        let (structure, binary) = compare_unit(old, new, unit);
        types.insert(unit.clone(), structure);
        binaries.insert(unit.clone(), binary);
    }

    [
        NamespaceDelta::from_units(membership, presence),
        NamespaceDelta::from_units(types, presence),
        NamespaceDelta::from_units(binaries, presence),
    ]
}

/// Structural and binary tags of a unit present in both states. A binary
/// change is only reported when the structure is unchanged.
fn compare_unit(old: &BuildState, new: &BuildState, unit: &UnitId) -> (DeltaKind, DeltaKind) {
    let old_types = old.types_of_unit(unit);
    let new_types = new.types_of_unit(unit);
    if old_types != new_types {
        return (DeltaKind::Changed, DeltaKind::Same);
    }

    let mut binary_changed = false;
    for name in &new_types {
        match (old.record(name), new.record(name)) {
            (Some(before), Some(after)) => {
                let same_shape = Arc::ptr_eq(&before.descriptor, &after.descriptor)
                    || before.descriptor == after.descriptor;
                if !same_shape {
                    return (DeltaKind::Changed, DeltaKind::Same);
                }
                binary_changed |= before.checksum != after.checksum;
            }
            (None, None) => {}
            _ => return (DeltaKind::Changed, DeltaKind::Same),
        }
    }
    let binary = if binary_changed { DeltaKind::Changed } else { DeltaKind::Same };
    (DeltaKind::Same, binary)
}

//! Compile rounds: drain the queue, compile, record results, try
//! dependents, repeat until nothing is queued.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info_span, warn};
use verdict_common::{ContentHash, SourceLocation, TypeName, UnitId};
use verdict_diagnostics::{codes, Diagnostic};
use verdict_graph::{ElementKey, NodeId, NodeKind};
use verdict_state::{SourceEntry, TypeRecord};
use verdict_structure::{IndictmentSet, TypeDescriptor};

use crate::compiler::{CompileRequest, CompileResult, Compiler, DependencyRef};
use crate::error::BuildError;
use crate::phase::Phase;
use crate::session::BuildSession;

/// Runs compile rounds until the work queue is empty.
pub(crate) fn run_rounds(
    session: &mut BuildSession<'_>,
    compiler: &mut dyn Compiler,
) -> Result<(), BuildError> {
    let batch_size = session.settings.batch_size.max(1);
    while !session.queue.is_empty() {
        session.check_cancelled()?;
        session.round += 1;
        session.summary.rounds = session.round;
        session.enter(Phase::Compile { round: session.round });
        let _span = info_span!("round", round = session.round).entered();

        let batch = session.queue.drain_batch(batch_size);
        let prepared = prepare_batch(session, compiler, batch);
        if prepared.requests.is_empty() {
            continue;
        }
        debug!(units = prepared.requests.len(), "compiling batch");
        session.summary.compiled += prepared.requests.len();
        let results = compiler.compile(&prepared.requests, session.cancel)?;
        apply_results(session, prepared, results)?;
        session.report_progress();
    }
    Ok(())
}

/// Requests for one batch plus the units whose source could not be read.
struct PreparedBatch {
    requests: Vec<CompileRequest>,
    unavailable: BTreeMap<UnitId, Diagnostic>,
}

fn prepare_batch(
    session: &mut BuildSession<'_>,
    compiler: &mut dyn Compiler,
    batch: Vec<UnitId>,
) -> PreparedBatch {
    let mut prepared = PreparedBatch {
        requests: Vec::with_capacity(batch.len()),
        unavailable: BTreeMap::new(),
    };
    for unit in batch {
        if session.removed.contains(&unit) {
            continue;
        }
        let Some(location) = session.unit_location(&unit) else {
            debug!(unit = %unit, "queued unit has no source, skipping");
            continue;
        };
        if !session.state.sources().contains(&location) {
            debug!(unit = %unit, "queued unit is not in the source index, skipping");
            continue;
        }
        let content = match session.changes.content_for(&location) {
            Some(content) => content.to_string(),
            None => match compiler.load_source(&location) {
                Ok(content) => content,
                Err(e) => {
                    warn!(unit = %unit, error = %e, "source unavailable");
                    let diag = codes::content_unavailable(&location, &e.to_string());
                    prepared.unavailable.insert(unit.clone(), diag);
                    String::new()
                }
            },
        };
        record_content_hash(session, &location, &content);
        prepared.requests.push(CompileRequest {
            unit,
            location,
            content,
        });
    }
    prepared
}

fn record_content_hash(session: &mut BuildSession<'_>, location: &SourceLocation, content: &str) {
    let hash = ContentHash::from_str_content(content);
    let stale = session
        .state
        .sources()
        .get(location)
        .is_some_and(|entry| entry.content_hash != hash);
    if stale {
        session.state.sources_mut().insert(SourceEntry {
            location: location.clone(),
            content_hash: hash,
        });
    }
}

/// Per-type indictments found while recording one result.
struct TypeChange {
    unit_node: NodeId,
    /// Unit node of the previous producer when the type changed units.
    moved_from: Option<NodeId>,
    name: TypeName,
    indictments: IndictmentSet,
    /// The type appeared or disappeared.
    added_or_removed: bool,
}

fn apply_results(
    session: &mut BuildSession<'_>,
    prepared: PreparedBatch,
    results: Vec<CompileResult>,
) -> Result<(), BuildError> {
    let PreparedBatch {
        requests,
        mut unavailable,
    } = prepared;

    let mut by_unit: BTreeMap<UnitId, CompileResult> = BTreeMap::new();
    for result in results {
        if requests.iter().any(|r| r.unit == result.unit) {
            by_unit.insert(result.unit.clone(), result);
        } else {
            warn!(
                unit = %result.unit,
                "compiler returned a result for a unit it was not asked for"
            );
        }
    }

    let policy = session.settings.cycle_policy;
    let mut ordered = Vec::with_capacity(requests.len());
    for request in requests {
        let result = by_unit.remove(&request.unit).unwrap_or_else(|| {
            CompileResult::failed(request.unit.clone(), "compiler returned no result")
        });
        let graph = session.state.graph_mut();
        let id = graph.add_node(
            ElementKey::Unit(request.unit.clone()),
            NodeKind::unit(request.location.clone()),
        );
        let order = graph.order(id, policy)?;
        ordered.push((order, id, request.location, result));
    }
    ordered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.3.unit.cmp(&b.3.unit)));

    // Record every descriptor of the batch first so dependency references
    // between units of the same batch resolve to their producers.
    let mut changes = Vec::new();
    for (_, id, _, result) in &mut ordered {
        if result.failure.is_none() {
            changes.extend(record_descriptors(session, *id, result)?);
        }
    }

    for (_, id, location, mut result) in ordered {
        let extra = unavailable.remove(&result.unit);
        match result.failure.take() {
            Some(reason) => {
                record_failure(session, &location, result.unit, result.diagnostics, &reason, extra)
            }
            None => record_success(session, id, &location, result, extra)?,
        }
    }

    for change in changes {
        let mut targets = session.state.graph().dependents(change.unit_node).to_vec();
        if let Some(previous) = change.moved_from {
            targets.extend_from_slice(session.state.graph().dependents(previous));
        }
        targets.extend(session.dependents_of(&ElementKey::Type(change.name.clone())));
        if change.added_or_removed {
            targets.extend(session.dependents_of(&ElementKey::Namespace(change.name.namespace())));
        }
        session.try_targets(targets, &change.indictments);
    }
    Ok(())
}

/// Stores a result's descriptors and compares them with the previous ones.
fn record_descriptors(
    session: &mut BuildSession<'_>,
    unit_node: NodeId,
    result: &mut CompileResult,
) -> Result<Vec<TypeChange>, BuildError> {
    let unit = result.unit.clone();
    let previous: BTreeSet<TypeName> = session.state.types_of_unit(&unit).into_iter().collect();
    let mut produced = BTreeSet::new();
    let mut changes = Vec::new();

    for item in std::mem::take(&mut result.produced) {
        let name = item.descriptor.name.clone();
        produced.insert(name.clone());
        let descriptor = shared_descriptor(session, &name, item.descriptor);
        let evicted = session.state.insert_descriptor(
            name.clone(),
            TypeRecord {
                descriptor: Arc::clone(&descriptor),
                unit: unit.clone(),
                checksum: item.checksum,
            },
        );
        let moved_from = evicted
            .as_ref()
            .filter(|record| record.unit != unit)
            .and_then(|record| {
                session
                    .state
                    .graph()
                    .node_id(&ElementKey::Unit(record.unit.clone()))
            });
        let old = evicted.map(|record| record.descriptor);
        // Dependents of the previous producer were linked to its unit node,
        // so a moved type is indicted in full for them.
        let indictments = match moved_from {
            Some(_) => {
                debug!(type_name = %name, unit = %unit, "type moved to another unit");
                let mut set = session.comparator.compare(old.as_ref(), None);
                set.merge(&session.comparator.compare(None, Some(&descriptor)));
                set
            }
            None => session.comparator.compare(old.as_ref(), Some(&descriptor)),
        };
        changes.push(TypeChange {
            unit_node,
            moved_from,
            name,
            added_or_removed: old.is_none(),
            indictments,
        });
    }

    for name in previous.difference(&produced) {
        let owned = session.state.record(name).is_some_and(|r| r.unit == unit);
        if !owned {
            continue;
        }
        let old = session.state.remove_descriptor(name).map(|r| r.descriptor);
        let indictments = session.comparator.compare(old.as_ref(), None);
        changes.push(TypeChange {
            unit_node,
            moved_from: None,
            name: name.clone(),
            added_or_removed: true,
            indictments,
        });
    }

    if previous != produced {
        let kind = session.state.graph_mut().kind_mut(unit_node)?;
        if let NodeKind::CompiledUnit { types, .. } = kind {
            *types = produced;
        }
    }
    Ok(changes)
}

/// Reuses the recorded `Arc` when the new descriptor is structurally equal,
/// so later comparisons hit the pointer-equality fast path.
fn shared_descriptor(
    session: &BuildSession<'_>,
    name: &TypeName,
    descriptor: TypeDescriptor,
) -> Arc<TypeDescriptor> {
    match session.state.descriptor(name) {
        Some(existing) if **existing == descriptor => Arc::clone(existing),
        _ => Arc::new(descriptor),
    }
}

fn record_failure(
    session: &mut BuildSession<'_>,
    location: &SourceLocation,
    unit: UnitId,
    mut diagnostics: Vec<Diagnostic>,
    reason: &str,
    unavailable: Option<Diagnostic>,
) {
    warn!(unit = %unit, reason, "unit failed to compile");
    session.summary.failed += 1;
    diagnostics.extend(unavailable);
    diagnostics.push(codes::compile_unit_failure(location, reason));
    session.state.diagnostics_mut().replace(location, diagnostics);
    session.state.remove_evidence(&unit);
}

fn record_success(
    session: &mut BuildSession<'_>,
    id: NodeId,
    location: &SourceLocation,
    result: CompileResult,
    unavailable: Option<Diagnostic>,
) -> Result<(), BuildError> {
    let CompileResult {
        unit,
        dependencies,
        evidence,
        mut diagnostics,
        ..
    } = result;

    let mut deps = Vec::with_capacity(dependencies.len());
    for dependency in &dependencies {
        if let Some(dep) = resolve_dependency(session, id, &unit, dependency) {
            deps.push(dep);
        }
    }
    session.state.graph_mut().set_dependencies(id, &deps)?;

    session.state.set_evidence(unit, evidence);
    diagnostics.extend(unavailable);
    if !diagnostics.is_empty() || !session.state.diagnostics().get(location).is_empty() {
        session.state.diagnostics_mut().replace(location, diagnostics);
    }
    Ok(())
}

/// Maps a dependency reference to a graph node. Type references resolve to
/// the producing unit, else to a stand-in node for the type. References to
/// the unit itself yield `None`.
fn resolve_dependency(
    session: &mut BuildSession<'_>,
    unit_node: NodeId,
    unit: &UnitId,
    dependency: &DependencyRef,
) -> Option<NodeId> {
    let graph_key = match dependency {
        DependencyRef::Type(name) => match session.state.record(name) {
            Some(record) if &record.unit == unit => return None,
            Some(record) => {
                let producer = ElementKey::Unit(record.unit.clone());
                match session.state.graph().node_id(&producer) {
                    Some(id) => return (id != unit_node).then_some(id),
                    None => ElementKey::Type(name.clone()),
                }
            }
            None => ElementKey::Type(name.clone()),
        },
        DependencyRef::Namespace(namespace) => ElementKey::Namespace(namespace.clone()),
        DependencyRef::Archive(path) => ElementKey::Archive(path.clone()),
    };
    let kind = match &graph_key {
        ElementKey::Namespace(_) => NodeKind::Namespace,
        ElementKey::Archive(_) => NodeKind::ArchiveFile,
        _ => NodeKind::TypeStandIn,
    };
    Some(session.state.graph_mut().add_node(graph_key, kind))
}

//! The last step of a pass: retire removed units, sweep orphans, apply the
//! cycle policy and verify the graph.

use tracing::{debug, info, warn};
use verdict_config::CyclePolicy;
use verdict_diagnostics::codes;
use verdict_graph::{ElementKey, GraphError, NodeKind};

use crate::error::BuildError;
use crate::phase::Phase;
use crate::session::BuildSession;

pub(crate) fn finalize(session: &mut BuildSession<'_>) -> Result<(), BuildError> {
    session.enter(Phase::FinalizeDelta);

    let removed: Vec<_> = session.removed.iter().cloned().collect();
    for unit in &removed {
        let Some(id) = session.state.graph().node_id(&ElementKey::Unit(unit.clone())) else {
            continue;
        };
        if session.state.graph().dependents(id).is_empty() {
            session.state.graph_mut().remove_node(id)?;
            debug!(unit = %unit, "removed unit node");
        } else {
            session.state.graph_mut().set_kind(id, NodeKind::TypeStandIn)?;
            debug!(unit = %unit, "demoted removed unit to a stand-in");
        }
    }
    session.summary.removed_units = removed.len();

    let has_orphans = session.state.graph().iter().any(|(_, node)| {
        !node.kind().is_compiled_unit()
            && node.dependents().is_empty()
            && node.dependencies().is_empty()
    });
    if has_orphans {
        let swept = session.state.graph_mut().sweep_orphans();
        debug!(swept, "swept orphan nodes");
    }

    apply_cycle_policy(session)?;
    session.state.graph().check_integrity()?;

    session.enter(Phase::Done);
    session.progress.finish();
    info!(
        generation = session.state.generation(),
        summary = %session.summary,
        "build pass complete"
    );
    Ok(())
}

/// Refreshes cycle warnings under the approximate policy; fails under the
/// rejecting one.
fn apply_cycle_policy(session: &mut BuildSession<'_>) -> Result<(), BuildError> {
    let cycles = session.state.graph().cycles();
    if session.settings.cycle_policy == CyclePolicy::Reject {
        if let Some(first) = cycles.first().and_then(|c| c.first()) {
            let key = session
                .state
                .graph()
                .node(*first)
                .map(|n| n.key().clone())
                .ok_or(GraphError::UnknownNode(*first))?;
            return Err(GraphError::Cycle(key).into());
        }
        return Ok(());
    }

    if session.state.diagnostics().has_code(codes::W100) {
        session.state.diagnostics_mut().remove_code(codes::W100);
    }
    for cycle in &cycles {
        warn!(members = cycle.len(), "dependency cycle ordered approximately");
        for &id in cycle {
            let location = match session.state.graph().node(id).map(|n| n.kind()) {
                Some(NodeKind::CompiledUnit { location, .. }) => location.clone(),
                _ => continue,
            };
            session
                .state
                .diagnostics_mut()
                .push(codes::dependency_cycle(&location, cycle.len()));
        }
    }
    Ok(())
}

//! The context object threaded through every step of a pass.

use std::collections::BTreeSet;

use tracing::debug;
use verdict_common::{SourceLocation, TypeName, UnitId};
use verdict_config::BuildSettings;
use verdict_graph::{ElementKey, NodeId, NodeKind};
use verdict_state::BuildState;
use verdict_structure::{IndictmentSet, StructuralComparator};
use verdict_trial::{TrialEngine, Verdict};

use crate::cancel::CancellationToken;
use crate::changes::ChangedLocations;
use crate::error::BuildError;
use crate::phase::Phase;
use crate::progress::ProgressMonitor;
use crate::queue::WorkQueue;
use crate::summary::BuildSummary;

/// Everything one build pass reads and writes.
///
/// The old state is only reachable through a shared reference; the new state
/// is owned by the session and handed out by
/// [`into_parts`](Self::into_parts) once the pass is done.
pub struct BuildSession<'a> {
    phase: Phase,
    pub(crate) old: &'a BuildState,
    pub(crate) changes: &'a ChangedLocations,
    pub(crate) settings: &'a BuildSettings,
    pub(crate) cancel: &'a CancellationToken,
    pub(crate) progress: ProgressMonitor<'a>,
    pub(crate) state: BuildState,
    pub(crate) queue: WorkQueue,
    pub(crate) comparator: StructuralComparator,
    /// Units whose source was removed in this pass.
    pub(crate) removed: BTreeSet<UnitId>,
    pub(crate) summary: BuildSummary,
    pub(crate) round: u32,
}

impl<'a> BuildSession<'a> {
    /// Starts a pass deriving a new state from `old`.
    pub fn new(
        old: &'a BuildState,
        changes: &'a ChangedLocations,
        settings: &'a BuildSettings,
        cancel: &'a CancellationToken,
        progress: ProgressMonitor<'a>,
    ) -> Self {
        Self {
            phase: Phase::Idle,
            old,
            changes,
            settings,
            cancel,
            progress,
            state: old.branch(),
            queue: WorkQueue::new(),
            comparator: StructuralComparator::new(),
            removed: BTreeSet::new(),
            summary: BuildSummary::default(),
            round: 0,
        }
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The state being assembled.
    pub fn state(&self) -> &BuildState {
        &self.state
    }

    /// Statistics so far.
    pub fn summary(&self) -> &BuildSummary {
        &self.summary
    }

    pub(crate) fn enter(&mut self, phase: Phase) {
        debug!(from = %self.phase, to = %phase, "phase");
        self.phase = phase;
    }

    /// Fails with [`BuildError::Cancelled`] if the host cancelled the pass.
    pub(crate) fn check_cancelled(&mut self) -> Result<(), BuildError> {
        if self.cancel.is_cancelled() {
            self.enter(Phase::Cancelled);
            return Err(BuildError::Cancelled);
        }
        Ok(())
    }

    /// Queues a unit for compilation unless it was removed in this pass.
    pub(crate) fn enqueue(&mut self, unit: &UnitId) -> bool {
        if self.removed.contains(unit) {
            return false;
        }
        self.queue.push(unit.clone())
    }

    /// Queues every compiled unit among `ids` without a trial.
    pub(crate) fn enqueue_nodes(&mut self, ids: &[NodeId]) {
        for &id in ids {
            let unit = match self.state.graph().node(id) {
                Some(node) if node.kind().is_compiled_unit() => match node.key() {
                    ElementKey::Unit(unit) => unit.clone(),
                    _ => continue,
                },
                _ => continue,
            };
            self.enqueue(&unit);
        }
    }

    /// Where a unit's source lives, read from its graph node.
    pub(crate) fn unit_location(&self, unit: &UnitId) -> Option<SourceLocation> {
        match self.state.graph().node_by_key(&ElementKey::Unit(unit.clone()))?.kind() {
            NodeKind::CompiledUnit { location, .. } => Some(location.clone()),
            _ => None,
        }
    }

    /// Dependents of the node behind `key`, if it exists.
    pub(crate) fn dependents_of(&self, key: &ElementKey) -> Vec<NodeId> {
        self.state
            .graph()
            .node_id(key)
            .map(|id| self.state.graph().dependents(id).to_vec())
            .unwrap_or_default()
    }

    /// Tries every compiled unit among `targets` that is neither queued,
    /// compiled nor removed, and queues the guilty ones.
    pub(crate) fn try_targets(&mut self, mut targets: Vec<NodeId>, indictments: &IndictmentSet) {
        if indictments.is_empty() {
            return;
        }
        targets.sort_unstable();
        targets.dedup();
        let engine = TrialEngine::new(&self.state);
        for id in targets {
            let Some(node) = self.state.graph().node(id) else {
                continue;
            };
            let (ElementKey::Unit(unit), NodeKind::CompiledUnit { types, .. }) =
                (node.key(), node.kind())
            else {
                continue;
            };
            if self.queue.has_seen(unit) || self.removed.contains(unit) {
                continue;
            }
            let declared: Vec<TypeName> = types.iter().cloned().collect();
            self.summary.tried += 1;
            let verdict = engine.try_unit(&declared, self.state.evidence(unit), indictments);
            if let Verdict::Guilty(charge) = verdict {
                debug!(unit = %unit, %charge, "guilty");
                self.summary.guilty += 1;
                self.queue.push(unit.clone());
            }
        }
    }

    /// Reports the share of known work already compiled.
    pub(crate) fn report_progress(&mut self) {
        let done = self.queue.compiled_count() as f64;
        let total = done + self.queue.len() as f64;
        if total > 0.0 {
            self.progress.update(done / total);
        }
    }

    /// Ends the session, yielding the new state and the statistics.
    pub fn into_parts(self) -> (BuildState, BuildSummary) {
        (self.state, self.summary)
    }
}

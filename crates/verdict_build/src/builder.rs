//! Entry points: incremental pass, full build and fallback.

use tracing::warn;
use verdict_config::BuildSettings;
use verdict_state::BuildState;

use crate::analysis;
use crate::cancel::CancellationToken;
use crate::changes::{ChangedLocations, SourceChange};
use crate::compile;
use crate::compiler::Compiler;
use crate::error::BuildError;
use crate::finalize;
use crate::phase::Phase;
use crate::progress::{ProgressMonitor, ProgressSink};
use crate::session::BuildSession;
use crate::summary::BuildSummary;

/// The new state of a successful pass and what the pass did.
#[derive(Debug)]
pub struct BuildOutcome {
    /// The state derived from the old one.
    pub state: BuildState,
    /// Pass statistics.
    pub summary: BuildSummary,
}

/// Drives build passes against a compiler.
pub struct Builder<'a> {
    compiler: &'a mut dyn Compiler,
    settings: BuildSettings,
    cancel: CancellationToken,
    progress: Option<&'a mut dyn ProgressSink>,
}

impl<'a> Builder<'a> {
    /// Creates a builder with default settings.
    pub fn new(compiler: &'a mut dyn Compiler) -> Self {
        Self {
            compiler,
            settings: BuildSettings::default(),
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Replaces the build settings.
    pub fn with_settings(mut self, settings: BuildSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Uses `cancel` to stop passes early.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Reports progress to `sink`.
    pub fn with_progress(mut self, sink: &'a mut dyn ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    /// The settings in use.
    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Runs one incremental pass. On error the old state is untouched and
    /// nothing is produced.
    #[tracing::instrument(level = "info", skip_all, fields(generation = old.generation()))]
    pub fn incremental(
        &mut self,
        old: &BuildState,
        changes: &ChangedLocations,
    ) -> Result<BuildOutcome, BuildError> {
        self.run(old, changes)
    }

    /// Builds every source in `sources` from an empty state.
    #[tracing::instrument(level = "info", skip_all, fields(sources = sources.len()))]
    pub fn full_build(&mut self, sources: Vec<SourceChange>) -> Result<BuildOutcome, BuildError> {
        self.run(&BuildState::new(), &full_change_set(sources))
    }

    /// Runs an incremental pass and, if it fails for any reason other than
    /// cancellation and fallback is enabled, discards it and runs a full
    /// build over the new source index instead.
    pub fn build_with_fallback(
        &mut self,
        old: &BuildState,
        changes: &ChangedLocations,
    ) -> Result<BuildOutcome, BuildError> {
        match self.incremental(old, changes) {
            Err(err) if err.is_recoverable() && self.settings.full_build_fallback => {
                warn!(error = %err, "incremental pass failed, falling back to a full build");
                let base = BuildState::with_generation(old.generation());
                let mut outcome = self.run(&base, &full_change_set(sources_after(old, changes)))?;
                outcome.summary.fell_back = true;
                Ok(outcome)
            }
            result => result,
        }
    }

    fn run(
        &mut self,
        old: &BuildState,
        changes: &ChangedLocations,
    ) -> Result<BuildOutcome, BuildError> {
        let monitor = match self.progress.as_mut() {
            Some(sink) => {
                let sink: &mut dyn ProgressSink = &mut **sink;
                ProgressMonitor::new(Some(sink))
            }
            None => ProgressMonitor::silent(),
        };
        let mut session = BuildSession::new(old, changes, &self.settings, &self.cancel, monitor);
        match drive(&mut session, &mut *self.compiler) {
            Ok(()) => {
                let (state, summary) = session.into_parts();
                Ok(BuildOutcome { state, summary })
            }
            Err(err) => {
                if matches!(err, BuildError::Cancelled) {
                    session.enter(Phase::Cancelled);
                } else {
                    warn!(phase = %session.phase(), error = %err, "build pass aborted");
                }
                Err(err)
            }
        }
    }
}

fn drive(session: &mut BuildSession<'_>, compiler: &mut dyn Compiler) -> Result<(), BuildError> {
    session.check_cancelled()?;
    let delta = analysis::compute_package_delta(session);
    analysis::compute_namespace_indictments(session, &delta);
    analysis::compute_class_delta(session)?;
    compile::run_rounds(session, compiler)?;
    finalize::finalize(session)
}

fn full_change_set(sources: Vec<SourceChange>) -> ChangedLocations {
    ChangedLocations {
        added: sources,
        ..ChangedLocations::default()
    }
}

/// Every source known after applying `changes` to `old`, with content where
/// the change set supplied it.
fn sources_after(old: &BuildState, changes: &ChangedLocations) -> Vec<SourceChange> {
    let mut index = old.sources().clone();
    for location in &changes.removed {
        index.remove(location);
    }
    let mut sources: Vec<SourceChange> = index
        .entries()
        .filter(|entry| changes.content_for(&entry.location).is_none())
        .map(|entry| SourceChange::without_content(entry.location.clone()))
        .collect();
    sources.extend(changes.added.iter().chain(&changes.changed).cloned());
    sources.sort_by(|a, b| a.location.cmp(&b.location));
    sources.dedup_by(|a, b| a.location == b.location);
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use verdict_common::{ContentHash, SourceLocation};
    use verdict_state::SourceEntry;

    fn loc(file: &str) -> SourceLocation {
        SourceLocation::new("p", file)
    }

    #[test]
    fn sources_after_applies_changes() {
        let mut old = BuildState::new();
        for file in ["A.java", "B.java", "C.java"] {
            old.sources_mut().insert(SourceEntry {
                location: loc(file),
                content_hash: ContentHash::from_str_content(file),
            });
        }
        let changes = ChangedLocations::new()
            .remove(loc("A.java"))
            .change(loc("B.java"), "class B { int x; }")
            .add(loc("D.java"), "class D {}");

        let sources = sources_after(&old, &changes);
        assert_eq!(
            sources,
            vec![
                SourceChange::with_content(loc("B.java"), "class B { int x; }"),
                SourceChange::without_content(loc("C.java")),
                SourceChange::with_content(loc("D.java"), "class D {}"),
            ]
        );
    }

    #[test]
    fn full_change_set_adds_everything() {
        let set = full_change_set(vec![SourceChange::without_content(loc("A.java"))]);
        assert_eq!(set.added.len(), 1);
        assert!(set.removed.is_empty() && set.changed.is_empty());
    }
}

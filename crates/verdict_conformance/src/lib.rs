//! End-to-end test support for the Verdict build engine.
//!
//! [`ScriptedCompiler`] stands in for a real front-end: each unit's output
//! (types, dependencies, evidence, failure) is scripted up front, and every
//! batch it receives is logged. [`Project`] couples it with a build state
//! and a pending change set so scenarios read as edit, build, assert.

#![warn(missing_docs)]

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use verdict_build::{
    BuildError, BuildOutcome, BuildSummary, Builder, CancellationToken, ChangedLocations,
    CompileRequest, CompileResult, Compiler, DependencyRef, ProducedType, SourceChange,
};
use verdict_common::{ContentHash, NamespaceName, SourceLocation, TypeName, UnitId};
use verdict_config::{load_config_from_str, BuildSettings, ConfigError};
use verdict_state::BuildState;
use verdict_structure::{Reference, TypeDescriptor};

/// Installs a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Parses build settings from `verdict.toml` text.
pub fn settings_from_toml(text: &str) -> Result<BuildSettings, ConfigError> {
    load_config_from_str(text).map(|config| config.build)
}

/// Shorthand for a source location.
pub fn loc(namespace: &str, file: &str) -> SourceLocation {
    SourceLocation::new(namespace, file)
}

/// What compiling one unit yields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitScript {
    /// Produced types.
    pub types: Vec<TypeDescriptor>,
    /// Dependency references.
    pub dependencies: Vec<DependencyRef>,
    /// Recorded evidence.
    pub evidence: Vec<Reference>,
    /// Failure reason, if the unit fails to compile.
    pub failure: Option<String>,
}

impl UnitScript {
    /// An empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a produced type.
    pub fn produces(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    /// Depends on a type, also recording a type reference to it.
    pub fn uses_type(mut self, name: &str) -> Self {
        self.dependencies.push(DependencyRef::Type(TypeName::new(name)));
        self.evidence.push(Reference::type_ref(name));
        self
    }

    /// Depends on a type without recording evidence about it.
    pub fn depends_on(mut self, name: &str) -> Self {
        self.dependencies.push(DependencyRef::Type(TypeName::new(name)));
        self
    }

    /// Depends on a namespace.
    pub fn depends_on_namespace(mut self, name: &str) -> Self {
        self.dependencies.push(DependencyRef::Namespace(NamespaceName::new(name)));
        self
    }

    /// Depends on an archive.
    pub fn depends_on_archive(mut self, path: &str) -> Self {
        self.dependencies.push(DependencyRef::Archive(path.to_string()));
        self
    }

    /// Records a reference.
    pub fn references(mut self, reference: Reference) -> Self {
        self.evidence.push(reference);
        self
    }

    /// Makes the unit fail to compile.
    pub fn fails(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    /// Source text standing in for the script; changes whenever the script
    /// does.
    pub fn content(&self) -> String {
        format!("{self:?}")
    }
}

/// An in-memory compiler replaying scripts.
#[derive(Debug, Default)]
pub struct ScriptedCompiler {
    scripts: BTreeMap<UnitId, UnitScript>,
    disk: BTreeMap<SourceLocation, String>,
    batches: Vec<Vec<UnitId>>,
    fail_next: Option<String>,
    cancel_on_compile: Option<CancellationToken>,
    cancel_after: Option<usize>,
}

impl ScriptedCompiler {
    /// Creates a compiler without scripts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the script of the unit at `location`.
    pub fn script(&mut self, location: &SourceLocation, script: UnitScript) {
        self.scripts.insert(location.unit_id(), script);
    }

    /// Forgets the script of the unit at `location`.
    pub fn forget(&mut self, location: &SourceLocation) {
        self.scripts.remove(&location.unit_id());
    }

    /// Makes `content` loadable for `location`.
    pub fn store(&mut self, location: &SourceLocation, content: impl Into<String>) {
        self.disk.insert(location.clone(), content.into());
    }

    /// Makes `location` unreadable.
    pub fn evict(&mut self, location: &SourceLocation) {
        self.disk.remove(location);
    }

    /// Makes the next `compile` call fail as a whole.
    pub fn fail_next_batch(&mut self, reason: &str) {
        self.fail_next = Some(reason.to_string());
    }

    /// Cancels `token` as soon as the next batch is compiled.
    pub fn cancel_on_compile(&mut self, token: CancellationToken) {
        self.cancel_on_compile = Some(token);
    }

    /// Cancels the pass from inside the next batch once `units` of its
    /// requests have been compiled.
    pub fn cancel_inside_compile(&mut self, units: usize) {
        self.cancel_after = Some(units);
    }

    /// Batches received since the last [`clear_log`](Self::clear_log).
    pub fn batches(&self) -> &[Vec<UnitId>] {
        &self.batches
    }

    /// Every unit compiled since the last [`clear_log`](Self::clear_log).
    pub fn compiled(&self) -> BTreeSet<String> {
        self.batches.iter().flatten().map(|u| u.to_string()).collect()
    }

    /// Clears the batch log.
    pub fn clear_log(&mut self) {
        self.batches.clear();
    }

    fn compile_one(&self, request: &CompileRequest) -> CompileResult {
        let Some(script) = self.scripts.get(&request.unit) else {
            return CompileResult::failed(request.unit.clone(), "no script for unit");
        };
        if let Some(reason) = &script.failure {
            return CompileResult::failed(request.unit.clone(), reason.clone());
        }
        let mut result = CompileResult::new(request.unit.clone());
        result.produced = script
            .types
            .iter()
            .map(|descriptor| {
                let stamp = format!("{}:{}", descriptor.name, request.content);
                ProducedType {
                    descriptor: descriptor.clone(),
                    checksum: ContentHash::from_str_content(&stamp),
                }
            })
            .collect();
        result.dependencies = script.dependencies.clone();
        result.evidence = script.evidence.clone();
        result
    }
}

impl Compiler for ScriptedCompiler {
    fn load_source(&mut self, location: &SourceLocation) -> io::Result<String> {
        self.disk
            .get(location)
            .cloned()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("{location} not on disk"))
            })
    }

    fn compile(
        &mut self,
        batch: &[CompileRequest],
        cancel: &CancellationToken,
    ) -> Result<Vec<CompileResult>, BuildError> {
        if let Some(reason) = self.fail_next.take() {
            return Err(BuildError::Compiler(reason));
        }
        self.batches.push(batch.iter().map(|r| r.unit.clone()).collect());
        if let Some(token) = &self.cancel_on_compile {
            token.cancel();
        }
        let mut results = Vec::with_capacity(batch.len());
        for (done, request) in batch.iter().enumerate() {
            if self.cancel_after == Some(done) {
                self.cancel_after = None;
                cancel.cancel();
            }
            cancel.check()?;
            results.push(self.compile_one(request));
        }
        Ok(results)
    }
}

/// A scripted project: a compiler, the current state and pending edits.
#[derive(Debug, Default)]
pub struct Project {
    /// The compiler replaying unit scripts.
    pub compiler: ScriptedCompiler,
    /// The state of the last successful build.
    pub state: BuildState,
    /// Settings for every build.
    pub settings: BuildSettings,
    /// Cancellation token handed to every build.
    pub cancel: CancellationToken,
    pending: ChangedLocations,
    known: BTreeSet<SourceLocation>,
}

impl Project {
    /// An empty project with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty project with `settings`.
    pub fn with_settings(settings: BuildSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Adds or edits a unit. Returns its location.
    pub fn write(&mut self, namespace: &str, file: &str, script: UnitScript) -> SourceLocation {
        let location = loc(namespace, file);
        let content = script.content();
        self.compiler.script(&location, script);
        self.compiler.store(&location, content.clone());
        if self.known.insert(location.clone()) {
            self.pending.added.push(SourceChange::with_content(location.clone(), content));
        } else {
            self.pending.changed.push(SourceChange::with_content(location.clone(), content));
        }
        location
    }

    /// Deletes a unit.
    pub fn delete(&mut self, location: &SourceLocation) {
        self.compiler.forget(location);
        self.known.remove(location);
        self.pending.removed.push(location.clone());
    }

    /// Marks an archive as changed.
    pub fn touch_archive(&mut self, path: &str) {
        self.pending.archives.push(path.to_string());
    }

    /// The edits the next build will see.
    pub fn pending(&self) -> &ChangedLocations {
        &self.pending
    }

    /// Runs an incremental build over the pending edits.
    ///
    /// On success the new state replaces the current one. Pending edits are
    /// consumed either way.
    pub fn build(&mut self) -> Result<BuildSummary, BuildError> {
        let changes = std::mem::take(&mut self.pending);
        self.compiler.clear_log();
        let outcome = Builder::new(&mut self.compiler)
            .with_settings(self.settings.clone())
            .with_cancellation(self.cancel.clone())
            .incremental(&self.state, &changes)?;
        Ok(self.accept(outcome))
    }

    /// Like [`build`](Self::build), falling back to a full build on failure.
    pub fn build_with_fallback(&mut self) -> Result<BuildSummary, BuildError> {
        let changes = std::mem::take(&mut self.pending);
        self.compiler.clear_log();
        let outcome = Builder::new(&mut self.compiler)
            .with_settings(self.settings.clone())
            .with_cancellation(self.cancel.clone())
            .build_with_fallback(&self.state, &changes)?;
        Ok(self.accept(outcome))
    }

    /// Builds every known unit from scratch without touching the current
    /// state.
    pub fn full_build(&mut self) -> Result<BuildOutcome, BuildError> {
        let sources: Vec<SourceChange> = self
            .known
            .iter()
            .map(|location| SourceChange::without_content(location.clone()))
            .collect();
        self.compiler.clear_log();
        Builder::new(&mut self.compiler)
            .with_settings(self.settings.clone())
            .with_cancellation(self.cancel.clone())
            .full_build(sources)
    }

    fn accept(&mut self, outcome: BuildOutcome) -> BuildSummary {
        self.state = outcome.state;
        outcome.summary
    }
}

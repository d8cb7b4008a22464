//! The interface to the external compiler.

use std::io;

use verdict_common::{ContentHash, NamespaceName, SourceLocation, TypeName, UnitId};
use verdict_diagnostics::Diagnostic;
use verdict_structure::{Reference, TypeDescriptor};

use crate::cancel::CancellationToken;
use crate::error::BuildError;

/// One unit to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Identity of the unit.
    pub unit: UnitId,
    /// Where its source lives.
    pub location: SourceLocation,
    /// The source text. Empty if it could not be loaded.
    pub content: String,
}

/// A type produced by compiling a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedType {
    /// Its structural descriptor.
    pub descriptor: TypeDescriptor,
    /// Checksum of the compiled output.
    pub checksum: ContentHash,
}

/// Something a compiled unit depends on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DependencyRef {
    /// A type, produced by a known unit or not.
    Type(TypeName),
    /// A namespace whose member list the unit relied on.
    Namespace(NamespaceName),
    /// An archive on the class path.
    Archive(String),
}

/// The outcome of compiling one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    /// The unit this result belongs to.
    pub unit: UnitId,
    /// Types the unit produced.
    pub produced: Vec<ProducedType>,
    /// What the unit depends on.
    pub dependencies: Vec<DependencyRef>,
    /// Symbolic references recorded during analysis.
    pub evidence: Vec<Reference>,
    /// Diagnostics for the unit's source.
    pub diagnostics: Vec<Diagnostic>,
    /// Set when the unit could not be compiled at all.
    pub failure: Option<String>,
}

impl CompileResult {
    /// A successful, empty result for `unit`.
    pub fn new(unit: UnitId) -> Self {
        Self {
            unit,
            produced: Vec::new(),
            dependencies: Vec::new(),
            evidence: Vec::new(),
            diagnostics: Vec::new(),
            failure: None,
        }
    }

    /// A failed result for `unit`.
    pub fn failed(unit: UnitId, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new(unit)
        }
    }
}

/// The compiler front-end driven by the orchestrator.
pub trait Compiler {
    /// Loads the source of a unit whose content the host did not supply.
    fn load_source(&mut self, location: &SourceLocation) -> io::Result<String> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no content available for {location}"),
        ))
    }

    /// Compiles one batch. Unit-local failures are reported through
    /// [`CompileResult::failure`]; an `Err` aborts the pass.
    fn compile(
        &mut self,
        batch: &[CompileRequest],
        cancel: &CancellationToken,
    ) -> Result<Vec<CompileResult>, BuildError>;
}

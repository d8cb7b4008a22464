//! Diagnostic codes emitted by the build engine itself.
//!
//! `E100`--`E101` are unit-local failures that never abort a pass.
//! `W100` reports dependency cycles tolerated under the approximate policy.

use verdict_common::SourceLocation;

use crate::code::{Category, DiagnosticCode};
use crate::diagnostic::Diagnostic;

/// The external compiler produced no descriptor for a unit.
pub const E100: DiagnosticCode = DiagnosticCode::new(Category::Error, 100);

/// The source content of a unit could not be read.
pub const E101: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);

/// A dependency cycle was found and ordered approximately.
pub const W100: DiagnosticCode = DiagnosticCode::new(Category::Warning, 100);

/// Creates an `E100` diagnostic for a unit the compiler could not compile.
pub fn compile_unit_failure(location: &SourceLocation, reason: &str) -> Diagnostic {
    Diagnostic::error(
        E100,
        format!("could not compile {location}: {reason}"),
        location.clone(),
    )
    .with_note("the unit is recompiled once a dependency changes or its source is edited")
}

/// Creates an `E101` diagnostic for an unreadable source.
pub fn content_unavailable(location: &SourceLocation, reason: &str) -> Diagnostic {
    Diagnostic::error(
        E101,
        format!("source of {location} is unavailable: {reason}"),
        location.clone(),
    )
    .with_note("compiled as an empty file")
}

/// Creates a `W100` diagnostic for a unit caught in a dependency cycle.
pub fn dependency_cycle(location: &SourceLocation, members: usize) -> Diagnostic {
    Diagnostic::warning(
        W100,
        format!("{location} is part of a dependency cycle of {members} elements"),
        location.clone(),
    )
}

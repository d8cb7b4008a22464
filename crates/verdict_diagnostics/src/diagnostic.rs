//! Structured diagnostic messages with severity, codes and notes.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use verdict_common::SourceLocation;

/// A structured diagnostic message attached to one source location.
///
/// Diagnostics come from two places: the external compiler (reported per
/// compiled unit and replaced wholesale when the unit recompiles) and the
/// engine itself (see [`codes`](crate::codes)).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the type of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// The source the diagnostic belongs to.
    pub location: SourceLocation,
    /// One-based line within the source, when the compiler knows it.
    pub line: Option<u32>,
    /// Explanatory footnotes.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic with the given severity.
    pub fn new(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            location,
            line: None,
            notes: Vec::new(),
        }
    }

    /// Creates a new error diagnostic.
    pub fn error(
        code: DiagnosticCode,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self::new(Severity::Error, code, message, location)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(
        code: DiagnosticCode,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self::new(Severity::Warning, code, message, location)
    }

    /// Sets the line of this diagnostic.
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    fn loc() -> SourceLocation {
        SourceLocation::new("p", "A.java")
    }

    #[test]
    fn create_error() {
        let code = DiagnosticCode::new(Category::Compiler, 1);
        let diag = Diagnostic::error(code, "cannot find symbol", loc());
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "cannot find symbol");
        assert_eq!(format!("{}", diag.code), "C001");
        assert!(diag.line.is_none());
    }

    #[test]
    fn builder_methods() {
        let code = DiagnosticCode::new(Category::Compiler, 2);
        let diag = Diagnostic::warning(code, "deprecated", loc())
            .at_line(12)
            .with_note("see B.foo");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.line, Some(12));
        assert_eq!(diag.notes, vec!["see B.foo"]);
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Category::Error, 100);
        let diag = Diagnostic::error(code, "boom", loc()).at_line(3);
        let json = serde_json::to_string(&diag).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, diag);
    }
}

//! Per-source diagnostic table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use verdict_common::SourceLocation;

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Diagnostics grouped by the source location they belong to.
///
/// Entries for a location are replaced as a whole when its unit recompiles,
/// so stale diagnostics never survive a successful compile. Ordered by
/// location for deterministic iteration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticTable {
    entries: BTreeMap<SourceLocation, Vec<Diagnostic>>,
}

impl DiagnosticTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all diagnostics of `location`. An empty list clears it.
    pub fn replace(&mut self, location: &SourceLocation, diagnostics: Vec<Diagnostic>) {
        if diagnostics.is_empty() {
            self.entries.remove(location);
        } else {
            self.entries.insert(location.clone(), diagnostics);
        }
    }

    /// Appends one diagnostic to `location`.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries
            .entry(diagnostic.location.clone())
            .or_default()
            .push(diagnostic);
    }

    /// Removes every diagnostic of `location`.
    pub fn clear(&mut self, location: &SourceLocation) {
        self.entries.remove(location);
    }

    /// Returns the diagnostics recorded for `location`.
    pub fn get(&self, location: &SourceLocation) -> &[Diagnostic] {
        self.entries.get(location).map_or(&[], Vec::as_slice)
    }

    /// Iterates over `(location, diagnostics)` in location order.
    pub fn iter(&self) -> impl Iterator<Item = (&SourceLocation, &[Diagnostic])> {
        self.entries.iter().map(|(loc, diags)| (loc, diags.as_slice()))
    }

    /// Total number of diagnostics across all locations.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns `true` if no diagnostics are recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.entries
            .values()
            .flatten()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Returns `true` if any location has an error.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Returns `true` if any diagnostic carries `code`.
    pub fn has_code(&self, code: DiagnosticCode) -> bool {
        self.entries.values().flatten().any(|d| d.code == code)
    }

    /// Drops every diagnostic carrying `code`. Returns how many were
    /// dropped.
    pub fn remove_code(&mut self, code: DiagnosticCode) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, diagnostics| {
            let before = diagnostics.len();
            diagnostics.retain(|d| d.code != code);
            removed += before - diagnostics.len();
            !diagnostics.is_empty()
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;

    fn loc(file: &str) -> SourceLocation {
        SourceLocation::new("p", file)
    }

    #[test]
    fn empty_table() {
        let table = DiagnosticTable::new();
        assert!(table.is_empty());
        assert!(!table.has_errors());
        assert!(table.get(&loc("A.java")).is_empty());
    }

    #[test]
    fn push_and_get() {
        let mut table = DiagnosticTable::new();
        table.push(codes::compile_unit_failure(&loc("A.java"), "boom"));
        table.push(codes::dependency_cycle(&loc("A.java"), 2));
        assert_eq!(table.get(&loc("A.java")).len(), 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.error_count(), 1);
    }

    #[test]
    fn replace_clears_old_entries() {
        let mut table = DiagnosticTable::new();
        table.push(codes::compile_unit_failure(&loc("A.java"), "boom"));
        table.replace(&loc("A.java"), vec![codes::dependency_cycle(&loc("A.java"), 2)]);
        assert_eq!(table.get(&loc("A.java")).len(), 1);
        assert!(!table.has_errors());

        table.replace(&loc("A.java"), Vec::new());
        assert!(table.is_empty());
    }

    #[test]
    fn iteration_is_ordered() {
        let mut table = DiagnosticTable::new();
        table.push(codes::dependency_cycle(&loc("B.java"), 2));
        table.push(codes::dependency_cycle(&loc("A.java"), 2));
        let files: Vec<_> = table.iter().map(|(l, _)| l.file.as_str()).collect();
        assert_eq!(files, vec!["A.java", "B.java"]);
    }

    #[test]
    fn remove_code_keeps_other_diagnostics() {
        let mut table = DiagnosticTable::new();
        table.push(codes::dependency_cycle(&loc("A.java"), 2));
        table.push(codes::dependency_cycle(&loc("B.java"), 2));
        table.push(codes::compile_unit_failure(&loc("B.java"), "boom"));
        assert!(table.has_code(codes::W100));
        assert_eq!(table.remove_code(codes::W100), 2);
        assert!(!table.has_code(codes::W100));
        assert!(table.get(&loc("A.java")).is_empty());
        assert_eq!(table.get(&loc("B.java")).len(), 1);
    }

    #[test]
    fn clear_removes_location() {
        let mut table = DiagnosticTable::new();
        table.push(codes::content_unavailable(&loc("A.java"), "gone"));
        table.clear(&loc("A.java"));
        assert!(table.is_empty());
    }
}

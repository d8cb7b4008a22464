//! How serious a diagnostic is for the unit it is attached to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic, ordered so that `Error` is the greatest.
///
/// The engine itself emits `Error` for units it could not compile or read
/// (`E100`, `E101`) and `Warning` for dependency cycles (`W100`). `Note`
/// only arrives with diagnostics the external compiler forwards in a
/// compile result.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// Compiler-forwarded context that needs no action.
    Note,
    /// The unit compiled, but its result may be approximate.
    Warning,
    /// The unit's recorded output is stale or missing.
    Error,
}

impl Severity {
    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// Lowercase label used when printing a diagnostic.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

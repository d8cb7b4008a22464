//! Diagnostic records and the per-source diagnostic table.
//!
//! The build engine does not present diagnostics. It stores whatever the
//! external compiler reports, plus a few engine-level diagnostics (units that
//! failed to compile, sources that could not be read), in a
//! [`DiagnosticTable`] keyed by source location.

#![warn(missing_docs)]

pub mod code;
pub mod codes;
pub mod diagnostic;
pub mod severity;
pub mod table;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use table::DiagnosticTable;

//! Errors that abort a build pass.

use verdict_graph::GraphError;

/// Why a build pass stopped without producing a state.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The pass was cancelled. The old state is untouched.
    #[error("build cancelled")]
    Cancelled,

    /// The dependency graph is inconsistent.
    #[error("dependency graph error: {0}")]
    Graph(#[from] GraphError),

    /// The compiler failed in a way not attributable to one unit.
    #[error("compiler failure: {0}")]
    Compiler(String),
}

impl BuildError {
    /// Returns `true` if a full build may recover from this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BuildError::Cancelled)
    }
}

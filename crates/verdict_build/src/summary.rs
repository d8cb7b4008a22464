//! Per-pass statistics.

use std::fmt;

/// What one build pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Compile rounds run.
    pub rounds: u32,
    /// Units handed to the compiler.
    pub compiled: usize,
    /// Units the compiler could not compile.
    pub failed: usize,
    /// Trials held.
    pub tried: usize,
    /// Trials that ended guilty.
    pub guilty: usize,
    /// Units whose source was removed.
    pub removed_units: usize,
    /// The state came from a full build after a failed incremental pass.
    pub fell_back: bool,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rounds, {} compiled ({} failed), {} of {} trials guilty, {} removed",
            self.rounds, self.compiled, self.failed, self.guilty, self.tried, self.removed_units
        )?;
        if self.fell_back {
            write!(f, ", full build fallback")?;
        }
        Ok(())
    }
}

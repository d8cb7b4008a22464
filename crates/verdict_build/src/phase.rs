//! Phases of a build pass.

use std::fmt;

/// Where a [`BuildSession`](crate::session::BuildSession) is in its pass.
///
/// Phases advance in declaration order, looping on `Compile` while work is
/// queued. `Cancelled` is reachable from every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has happened yet.
    Idle,
    /// Building the new source index and classifying namespaces.
    ComputePackageDelta,
    /// Indicting dependents of added and removed namespaces.
    ComputeNamespaceIndictments,
    /// Retiring removed units and seeding the work queue.
    ComputeClassDelta,
    /// Compiling a batch.
    Compile {
        /// 1-based round number.
        round: u32,
    },
    /// Retiring nodes, applying the cycle policy, checking integrity.
    FinalizeDelta,
    /// The pass produced a state.
    Done,
    /// The pass was cancelled.
    Cancelled,
}

impl Phase {
    /// Returns `true` for `Done` and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Cancelled)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::ComputePackageDelta => write!(f, "compute-package-delta"),
            Phase::ComputeNamespaceIndictments => write!(f, "compute-namespace-indictments"),
            Phase::ComputeClassDelta => write!(f, "compute-class-delta"),
            Phase::Compile { round } => write!(f, "compile (round {round})"),
            Phase::FinalizeDelta => write!(f, "finalize-delta"),
            Phase::Done => write!(f, "done"),
            Phase::Cancelled => write!(f, "cancelled"),
        }
    }
}
